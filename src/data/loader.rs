//! Batched iteration over a dataset

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{MnistDataset, IMAGE_SIZE};
use crate::device::ComputeDevice;

/// Data loading options, shaped once per trial from the resolved device
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Samples per batch
    pub batch_size: usize,
    /// Reshuffle sample order each epoch
    pub shuffle: bool,
    /// Parallel loading worker hint (advisory; the loader is synchronous)
    pub num_workers: usize,
    /// Pinned host memory hint (advisory; no accelerator transfer happens)
    pub pin_memory: bool,
}

impl LoaderOptions {
    /// Plain options: no shuffling, no worker or memory hints
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size, shuffle: false, num_workers: 0, pin_memory: false }
    }

    /// Device-appropriate options: accelerated hardware gets a loading
    /// worker, pinned memory, and shuffling
    pub fn for_device(batch_size: usize, device: ComputeDevice) -> Self {
        let mut opts = Self::new(batch_size);
        if device.is_accelerator() {
            opts.num_workers = 1;
            opts.pin_memory = true;
            opts.shuffle = true;
        }
        opts
    }
}

/// A training batch: flattened normalized pixels plus labels
pub struct Batch {
    /// Row-major pixels, `size() * IMAGE_SIZE` values
    pub images: Vec<f32>,
    /// Class label per sample
    pub labels: Vec<usize>,
}

impl Batch {
    /// Number of samples in this batch
    pub fn size(&self) -> usize {
        self.labels.len()
    }
}

/// Sequential batch producer over a dataset
///
/// The iteration order is fixed at construction; build a fresh loader per
/// epoch to reshuffle.
pub struct DataLoader<'a> {
    dataset: &'a MnistDataset,
    order: Vec<usize>,
    batch_size: usize,
}

impl<'a> DataLoader<'a> {
    /// Create a loader; `seed` drives the shuffle when enabled
    pub fn new(dataset: &'a MnistDataset, opts: &LoaderOptions, seed: u64) -> Self {
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        if opts.shuffle {
            order.shuffle(&mut StdRng::seed_from_u64(seed));
        }
        Self { dataset, order, batch_size: opts.batch_size.max(1) }
    }

    /// Total number of samples
    pub fn num_samples(&self) -> usize {
        self.dataset.len()
    }

    /// Number of batches per pass (last batch may be partial)
    pub fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    /// Iterate over batches in order
    pub fn iter(&self) -> impl Iterator<Item = Batch> + '_ {
        self.order.chunks(self.batch_size).map(move |indices| {
            let mut images = Vec::with_capacity(indices.len() * IMAGE_SIZE);
            let mut labels = Vec::with_capacity(indices.len());
            for &idx in indices {
                images.extend_from_slice(self.dataset.image(idx));
                labels.push(self.dataset.label(idx));
            }
            Batch { images, labels }
        })
    }
}
