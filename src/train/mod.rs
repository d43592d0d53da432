//! Training loop: epoch trainer, evaluator, and trial runner

mod epoch;
mod eval;
mod trial;

pub use epoch::train_epoch;
pub use eval::{evaluate, EvalReport};
pub use trial::{HyperParams, TrialRunner};
