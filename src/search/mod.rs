//! Hyperparameter search
//!
//! Random search over a typed parameter space, minimizing a scalar objective.
//! Trials run strictly sequentially; each one samples a fresh configuration,
//! runs the supplied objective, and records the score.
//!
//! # Example
//!
//! ```
//! use afinar::search::{HyperparameterSpace, ParameterDomain, Study};
//!
//! let mut space = HyperparameterSpace::new();
//! space.add("lr", ParameterDomain::Continuous { low: 1e-5, high: 1e-1, log_scale: true });
//!
//! let mut study = Study::new(space, 42);
//! study
//!     .optimize(3, |trial| {
//!         let lr = trial.config["lr"].as_float().unwrap_or(0.0);
//!         Ok(lr) // favors the smallest sampled lr
//!     })
//!     .expect("objective should not fail");
//! assert_eq!(study.trials().len(), 3);
//! ```

mod error;
mod space;
mod study;

pub use error::{Result, SearchError};
pub use space::{HyperparameterSpace, ParameterDomain, ParameterValue};
pub use study::{Study, Trial, TrialStatus};
