//! afinar: MNIST classifier training with automated hyperparameter search
//!
//! Trains a fixed feed-forward digit classifier and runs a sequential
//! minimization study over learning rate, batch size, and learning-rate
//! decay, logging metrics to a file-backed experiment tracker.
//!
//! # Example
//!
//! ```no_run
//! use afinar::config::RunConfig;
//! use afinar::device::ComputeDevice;
//! use afinar::model::Net;
//!
//! let cfg = RunConfig::default();
//! let device = ComputeDevice::select(cfg.no_accel);
//! let model = Net::new(cfg.seed);
//! assert_eq!(model.params().len(), 4);
//! # let _ = device;
//! ```

pub mod cli;
pub mod config;
pub mod data;
pub mod device;
pub mod error;
pub mod model;
pub mod optim;
pub mod search;
pub mod tensor;
pub mod tracking;
pub mod train;

pub use error::{Error, Result};
pub use tensor::Tensor;
