//! Command orchestration
//!
//! `run_command` owns the whole run: it resolves the device once, constructs
//! the tracker explicitly, builds the model, and drives either the
//! hyperparameter search or a single fixed training run.

use crate::config::{Cli, RunConfig};
use crate::device::ComputeDevice;
use crate::model::Net;
use crate::search::Study;
use crate::tracking::storage::JsonFileBackend;
use crate::tracking::{ExperimentTracker, RunStatus};
use crate::train::{HyperParams, TrialRunner};
use crate::{Error, Result};

/// Snapshot filename written on `--save-model`
pub const SNAPSHOT_FILE: &str = "mnist_cnn.json";

/// Execute the training command
pub fn run_command(cli: Cli) -> Result<()> {
    let cfg = RunConfig::from(cli);
    if cfg.epochs == 0 {
        return Err(Error::Config("epochs must be at least 1".to_string()));
    }

    let device = ComputeDevice::select(cfg.no_accel);
    if !cfg.quiet {
        println!("Using device: {}", device.name());
    }

    let backend = JsonFileBackend::new(&cfg.runs_dir).map_err(crate::tracking::TrackingError::from)?;
    let mut tracker = ExperimentTracker::new("mnist-hpo", backend);
    tracker.add_tag("device", device.name());

    let run_id = tracker.start_run(Some("hyperparameter-search"))?;
    let mut model = Net::new(cfg.seed);

    let best = {
        let mut runner = TrialRunner::new(&cfg, device, &mut model, &mut tracker, &run_id);

        if cfg.trials == 0 {
            // Fixed run: the lr/gamma/batch-size flags are used directly.
            let hp = HyperParams { lr: cfg.lr, batch_size: cfg.batch_size, gamma: cfg.gamma };
            let loss = runner.run_with(&hp)?;
            if !cfg.quiet {
                println!("Fixed run finished: {hp} (loss={loss:.6})");
            }
            hp
        } else {
            let mut study = Study::new(HyperParams::search_space(), cfg.seed);
            if let Some(patience) = cfg.patience {
                study = study.with_patience(patience);
            }

            study.optimize(cfg.trials, |trial| runner.run_trial(trial))?;

            let best_trial = study.best_trial()?;
            let hp = HyperParams::from_trial(best_trial)?;
            println!("Best parameters: {hp} (loss={:.6})", best_trial.score);
            hp
        }
    };

    tracker.log_param(&run_id, "best_lr", &best.lr.to_string())?;
    tracker.log_param(&run_id, "best_batch_size", &best.batch_size.to_string())?;
    tracker.log_param(&run_id, "best_gamma", &best.gamma.to_string())?;

    if cfg.save_model {
        model.save(SNAPSHOT_FILE)?;
        tracker.log_artifact(&run_id, SNAPSHOT_FILE)?;
        // The training source is tracked as a code artifact alongside the
        // snapshot.
        tracker.log_artifact(&run_id, file!())?;
    }

    tracker.end_run(&run_id, RunStatus::Completed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_zero_epochs_rejected() {
        let cli = Cli::parse_from(["afinar", "--epochs", "0"]);
        let result = run_command(cli);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_dataset_is_a_data_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let runs = dir.path().join("runs");
        let cli = Cli::parse_from([
            "afinar",
            "--trials",
            "0",
            "--quiet",
            "--data-dir",
            dir.path().to_str().expect("path should be utf-8"),
            "--runs-dir",
            runs.to_str().expect("path should be utf-8"),
        ]);
        let result = run_command(cli);
        assert!(matches!(result, Err(Error::Data(_))));
    }
}
