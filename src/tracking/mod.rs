//! Experiment tracking
//!
//! Append-only metric/parameter/artifact logging for training runs, backed by
//! pluggable storage via the [`TrackingBackend`](storage::TrackingBackend)
//! trait. The tracker is constructed explicitly by the orchestration layer
//! and passed down; nothing here is global state.
//!
//! # Example
//!
//! ```
//! use afinar::tracking::{ExperimentTracker, RunStatus};
//! use afinar::tracking::storage::InMemoryBackend;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut tracker = ExperimentTracker::new("mnist-hpo", InMemoryBackend::new());
//! tracker.add_tag("device", "cpu");
//!
//! let run_id = tracker.start_run(Some("trial-0"))?;
//! tracker.log_param(&run_id, "lr", "0.001")?;
//! tracker.log_metric(&run_id, "training_loss", 0.5, 1)?;
//! tracker.log_artifact(&run_id, "mnist_cnn.json")?;
//! tracker.end_run(&run_id, RunStatus::Completed)?;
//!
//! let run = tracker.get_run(&run_id)?;
//! assert_eq!(run.metrics["training_loss"].len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod storage;

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use self::storage::{TrackingBackend, TrackingStorageError};

/// Status of a tracking run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run is actively recording
    Active,
    /// Run completed successfully
    Completed,
    /// Run failed
    Failed,
}

/// A single experiment run
///
/// Records parameters (hyperparameters), metrics (per-step values), artifact
/// paths, and tags. The metric stream is write-only: nothing in the training
/// pipeline reads it back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Unique identifier for the run
    pub run_id: String,
    /// Optional human-readable name
    pub run_name: Option<String>,
    /// Parent experiment name
    pub experiment_name: String,
    /// Current status
    pub status: RunStatus,
    /// Hyperparameters: key -> value (string-encoded)
    pub params: HashMap<String, String>,
    /// Metrics: key -> list of (value, step)
    pub metrics: HashMap<String, Vec<(f64, u64)>>,
    /// Artifact paths
    pub artifacts: Vec<String>,
    /// Tags: key -> value
    pub tags: HashMap<String, String>,
    /// Unix timestamp (ms) when the run started
    pub start_time_ms: Option<u64>,
    /// Unix timestamp (ms) when the run ended
    pub end_time_ms: Option<u64>,
}

impl Run {
    fn new(run_id: String, run_name: Option<String>, experiment_name: String) -> Self {
        Self {
            run_id,
            run_name,
            experiment_name,
            status: RunStatus::Active,
            params: HashMap::new(),
            metrics: HashMap::new(),
            artifacts: Vec::new(),
            tags: HashMap::new(),
            start_time_ms: Some(now_ms()),
            end_time_ms: None,
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Errors from experiment tracking operations
#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("Run not found: {0}")]
    RunNotFound(String),

    #[error("Run already ended: {0}")]
    RunEnded(String),

    #[error("storage error: {0}")]
    Storage(#[from] TrackingStorageError),
}

/// Result alias for tracking operations
pub type Result<T> = std::result::Result<T, TrackingError>;

/// Top-level tracking handle for a named experiment
pub struct ExperimentTracker<B: TrackingBackend> {
    experiment_name: String,
    tags: HashMap<String, String>,
    backend: B,
    counter: usize,
}

impl<B: TrackingBackend> ExperimentTracker<B> {
    /// Create a tracker for the named experiment
    pub fn new(experiment_name: &str, backend: B) -> Self {
        Self {
            experiment_name: experiment_name.to_string(),
            tags: HashMap::new(),
            backend,
            counter: 0,
        }
    }

    /// Tag every subsequently started run
    pub fn add_tag(&mut self, key: &str, value: &str) {
        self.tags.insert(key.to_string(), value.to_string());
    }

    /// Start a new run, returning its id
    pub fn start_run(&mut self, run_name: Option<&str>) -> Result<String> {
        let run_id = format!("run-{:04}", self.counter);
        self.counter += 1;

        let mut run =
            Run::new(run_id.clone(), run_name.map(String::from), self.experiment_name.clone());
        run.tags = self.tags.clone();
        self.backend.save_run(&run)?;
        Ok(run_id)
    }

    /// Record a hyperparameter on a run
    pub fn log_param(&mut self, run_id: &str, key: &str, value: &str) -> Result<()> {
        self.update_run(run_id, |run| {
            run.params.insert(key.to_string(), value.to_string());
        })
    }

    /// Append a metric observation at the given step
    pub fn log_metric(&mut self, run_id: &str, key: &str, value: f64, step: u64) -> Result<()> {
        self.update_run(run_id, |run| {
            run.metrics.entry(key.to_string()).or_default().push((value, step));
        })
    }

    /// Record an artifact path on a run
    pub fn log_artifact(&mut self, run_id: &str, path: &str) -> Result<()> {
        self.update_run(run_id, |run| {
            run.artifacts.push(path.to_string());
        })
    }

    /// Finish a run with the given status
    pub fn end_run(&mut self, run_id: &str, status: RunStatus) -> Result<()> {
        self.update_run(run_id, |run| {
            run.status = status;
            run.end_time_ms = Some(now_ms());
        })
    }

    /// Fetch a run by id
    pub fn get_run(&self, run_id: &str) -> Result<Run> {
        self.backend
            .load_run(run_id)?
            .ok_or_else(|| TrackingError::RunNotFound(run_id.to_string()))
    }

    /// List all runs in this experiment
    pub fn list_runs(&self) -> Result<Vec<Run>> {
        Ok(self.backend.list_runs()?)
    }

    fn update_run<F: FnOnce(&mut Run)>(&mut self, run_id: &str, f: F) -> Result<()> {
        let mut run = self.get_run(run_id)?;
        if run.status != RunStatus::Active && run.end_time_ms.is_some() {
            return Err(TrackingError::RunEnded(run_id.to_string()));
        }
        f(&mut run);
        self.backend.save_run(&run)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::storage::InMemoryBackend;
    use super::*;

    #[test]
    fn test_run_lifecycle() {
        let mut tracker = ExperimentTracker::new("exp", InMemoryBackend::new());
        tracker.add_tag("device", "cpu");

        let run_id = tracker.start_run(Some("baseline")).expect("start_run should succeed");
        tracker.log_param(&run_id, "lr", "0.01").expect("log_param should succeed");
        tracker.log_metric(&run_id, "training_loss", 2.3, 0).expect("log should succeed");
        tracker.log_metric(&run_id, "training_loss", 1.9, 10).expect("log should succeed");
        tracker.log_artifact(&run_id, "mnist_cnn.json").expect("log should succeed");
        tracker.end_run(&run_id, RunStatus::Completed).expect("end_run should succeed");

        let run = tracker.get_run(&run_id).expect("run should exist");
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.params["lr"], "0.01");
        assert_eq!(run.metrics["training_loss"], vec![(2.3, 0), (1.9, 10)]);
        assert_eq!(run.artifacts, vec!["mnist_cnn.json"]);
        assert_eq!(run.tags["device"], "cpu");
        assert!(run.end_time_ms.is_some());
    }

    #[test]
    fn test_logging_to_ended_run_fails() {
        let mut tracker = ExperimentTracker::new("exp", InMemoryBackend::new());
        let run_id = tracker.start_run(None).expect("start_run should succeed");
        tracker.end_run(&run_id, RunStatus::Failed).expect("end_run should succeed");

        let result = tracker.log_metric(&run_id, "test_loss", 1.0, 0);
        assert!(matches!(result, Err(TrackingError::RunEnded(_))));
    }

    #[test]
    fn test_unknown_run_is_not_found() {
        let tracker = ExperimentTracker::new("exp", InMemoryBackend::new());
        assert!(matches!(tracker.get_run("run-9999"), Err(TrackingError::RunNotFound(_))));
    }

    #[test]
    fn test_run_ids_are_unique() {
        let mut tracker = ExperimentTracker::new("exp", InMemoryBackend::new());
        let a = tracker.start_run(None).expect("start_run should succeed");
        let b = tracker.start_run(None).expect("start_run should succeed");
        assert_ne!(a, b);
        assert_eq!(tracker.list_runs().expect("list should succeed").len(), 2);
    }
}
