//! MNIST dataset loading and normalization
//!
//! Reads the standard IDX files (raw or gzipped) from a data directory and
//! normalizes pixels with the usual MNIST statistics. Synthetic datasets for
//! tests are built with [`MnistDataset::from_parts`].

mod loader;

pub use loader::{Batch, DataLoader, LoaderOptions};

use byteorder::{BigEndian, ReadBytesExt};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

/// Pixels per image (28x28)
pub const IMAGE_SIZE: usize = 784;

/// Number of digit classes
pub const NUM_CLASSES: usize = 10;

// Channel statistics of the MNIST training set.
const MNIST_MEAN: f32 = 0.1307;
const MNIST_STD: f32 = 0.3081;

/// Dataset errors
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset file not found: {0} (or {0}.gz)")]
    NotFound(PathBuf),

    #[error("invalid magic number in {path}: expected {expected}, got {found}")]
    BadMagic { path: PathBuf, expected: u32, found: u32 },

    #[error("image/label count mismatch: {images} images, {labels} labels")]
    LengthMismatch { images: usize, labels: usize },

    #[error("image {index} has {len} pixels, expected {expected}")]
    BadImageSize { index: usize, len: usize, expected: usize },
}

/// Result alias for dataset operations
pub type Result<T> = std::result::Result<T, DataError>;

/// An in-memory labeled image dataset with normalized pixels
pub struct MnistDataset {
    images: Vec<Vec<f32>>,
    labels: Vec<u8>,
}

impl MnistDataset {
    /// Build a dataset from pre-normalized images and labels
    ///
    /// Used for synthetic fixtures; real data goes through [`load_train`]
    /// and [`load_test`].
    ///
    /// [`load_train`]: MnistDataset::load_train
    /// [`load_test`]: MnistDataset::load_test
    pub fn from_parts(images: Vec<Vec<f32>>, labels: Vec<u8>) -> Result<Self> {
        if images.len() != labels.len() {
            return Err(DataError::LengthMismatch { images: images.len(), labels: labels.len() });
        }
        for (index, image) in images.iter().enumerate() {
            if image.len() != IMAGE_SIZE {
                return Err(DataError::BadImageSize {
                    index,
                    len: image.len(),
                    expected: IMAGE_SIZE,
                });
            }
        }
        Ok(Self { images, labels })
    }

    /// Load the training partition from `dir`
    pub fn load_train<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::load_split(dir.as_ref(), TRAIN_IMAGES, TRAIN_LABELS)
    }

    /// Load the held-out test partition from `dir`
    pub fn load_test<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::load_split(dir.as_ref(), TEST_IMAGES, TEST_LABELS)
    }

    fn load_split(dir: &Path, images_file: &str, labels_file: &str) -> Result<Self> {
        let images = read_idx_images(&dir.join(images_file))?;
        let labels = read_idx_labels(&dir.join(labels_file))?;
        Self::from_parts(images, labels)
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the dataset has no samples
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Normalized pixels of sample `index`
    pub fn image(&self, index: usize) -> &[f32] {
        &self.images[index]
    }

    /// Label of sample `index`
    pub fn label(&self, index: usize) -> usize {
        usize::from(self.labels[index])
    }
}

/// Open an IDX file, transparently decoding a `.gz` sibling if the raw file
/// is absent.
fn open_idx(path: &Path) -> Result<Box<dyn Read>> {
    if path.exists() {
        return Ok(Box::new(BufReader::new(File::open(path)?)));
    }
    let gz_path = PathBuf::from(format!("{}.gz", path.display()));
    if gz_path.exists() {
        return Ok(Box::new(GzDecoder::new(BufReader::new(File::open(gz_path)?))));
    }
    Err(DataError::NotFound(path.to_path_buf()))
}

fn read_idx_images(path: &Path) -> Result<Vec<Vec<f32>>> {
    let mut reader = open_idx(path)?;

    let magic = reader.read_u32::<BigEndian>()?;
    if magic != IMAGES_MAGIC {
        return Err(DataError::BadMagic {
            path: path.to_path_buf(),
            expected: IMAGES_MAGIC,
            found: magic,
        });
    }

    let num_images = reader.read_u32::<BigEndian>()? as usize;
    let num_rows = reader.read_u32::<BigEndian>()? as usize;
    let num_cols = reader.read_u32::<BigEndian>()? as usize;
    let image_size = num_rows * num_cols;

    let mut images = Vec::with_capacity(num_images);
    let mut buffer = vec![0u8; image_size];
    for _ in 0..num_images {
        reader.read_exact(&mut buffer)?;
        images.push(buffer.iter().map(|&px| normalize(px)).collect());
    }

    Ok(images)
}

fn read_idx_labels(path: &Path) -> Result<Vec<u8>> {
    let mut reader = open_idx(path)?;

    let magic = reader.read_u32::<BigEndian>()?;
    if magic != LABELS_MAGIC {
        return Err(DataError::BadMagic {
            path: path.to_path_buf(),
            expected: LABELS_MAGIC,
            found: magic,
        });
    }

    let num_labels = reader.read_u32::<BigEndian>()? as usize;
    let mut labels = vec![0u8; num_labels];
    reader.read_exact(&mut labels)?;
    Ok(labels)
}

fn normalize(px: u8) -> f32 {
    (px as f32 / 255.0 - MNIST_MEAN) / MNIST_STD
}
