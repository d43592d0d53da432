//! Tracking storage backends
//!
//! Provides the `TrackingBackend` trait plus an in-memory backend for tests
//! and a JSON file backend that writes one file per run.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::Run;

/// Errors from tracking storage operations
#[derive(Debug, thiserror::Error)]
pub enum TrackingStorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for tracking storage operations
pub type Result<T> = std::result::Result<T, TrackingStorageError>;

/// Trait for tracking storage backends
pub trait TrackingBackend {
    /// Persist a run (insert or overwrite)
    fn save_run(&mut self, run: &Run) -> Result<()>;

    /// Load a run by id
    fn load_run(&self, run_id: &str) -> Result<Option<Run>>;

    /// Load all runs
    fn list_runs(&self) -> Result<Vec<Run>>;
}

/// In-memory backend (no persistence)
#[derive(Default)]
pub struct InMemoryBackend {
    runs: HashMap<String, Run>,
}

impl InMemoryBackend {
    /// Create an empty in-memory backend
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrackingBackend for InMemoryBackend {
    fn save_run(&mut self, run: &Run) -> Result<()> {
        self.runs.insert(run.run_id.clone(), run.clone());
        Ok(())
    }

    fn load_run(&self, run_id: &str) -> Result<Option<Run>> {
        Ok(self.runs.get(run_id).cloned())
    }

    fn list_runs(&self) -> Result<Vec<Run>> {
        let mut runs: Vec<Run> = self.runs.values().cloned().collect();
        runs.sort_by(|a, b| a.run_id.cmp(&b.run_id));
        Ok(runs)
    }
}

/// JSON file backend: one `<run_id>.json` per run under a directory
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    /// Create the backend, creating the directory if needed
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self { dir: dir.as_ref().to_path_buf() })
    }

    fn run_path(&self, run_id: &str) -> PathBuf {
        self.dir.join(format!("{run_id}.json"))
    }
}

impl TrackingBackend for JsonFileBackend {
    fn save_run(&mut self, run: &Run) -> Result<()> {
        let json = serde_json::to_string_pretty(run)?;
        fs::write(self.run_path(&run.run_id), json)?;
        Ok(())
    }

    fn load_run(&self, run_id: &str) -> Result<Option<Run>> {
        let path = self.run_path(run_id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn list_runs(&self) -> Result<Vec<Run>> {
        let mut runs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                let json = fs::read_to_string(&path)?;
                runs.push(serde_json::from_str(&json)?);
            }
        }
        runs.sort_by(|a: &Run, b: &Run| a.run_id.cmp(&b.run_id));
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::{ExperimentTracker, RunStatus};

    #[test]
    fn test_json_backend_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let backend = JsonFileBackend::new(dir.path()).expect("backend should be created");
        let mut tracker = ExperimentTracker::new("exp", backend);

        let run_id = tracker.start_run(Some("persisted")).expect("start_run should succeed");
        tracker.log_metric(&run_id, "test_loss", 0.25, 1).expect("log should succeed");
        tracker.end_run(&run_id, RunStatus::Completed).expect("end_run should succeed");

        // Re-open from disk through a fresh backend
        let reopened = JsonFileBackend::new(dir.path()).expect("backend should be created");
        let run = reopened
            .load_run(&run_id)
            .expect("load should succeed")
            .expect("run should exist on disk");
        assert_eq!(run.run_name.as_deref(), Some("persisted"));
        assert_eq!(run.metrics["test_loss"], vec![(0.25, 1)]);
        assert_eq!(run.status, RunStatus::Completed);

        assert_eq!(reopened.list_runs().expect("list should succeed").len(), 1);
    }

    #[test]
    fn test_missing_run_loads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let backend = JsonFileBackend::new(dir.path()).expect("backend should be created");
        assert!(backend.load_run("run-0042").expect("load should succeed").is_none());
    }
}
