//! Run configuration
//!
//! CLI flags are parsed once into an immutable [`RunConfig`] that the rest of
//! the pipeline receives by reference. The `--lr`/`--gamma`/`--batch-size`
//! flags drive the fixed-run path (`--trials 0`); with a positive trial
//! budget the search samples those values instead.

use clap::Parser;
use std::path::PathBuf;

/// MNIST training with automated hyperparameter search
#[derive(Debug, Parser)]
#[command(name = "afinar", version, about)]
pub struct Cli {
    /// Input batch size for training (fixed-run path)
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// Input batch size for testing
    #[arg(long, default_value_t = 1000)]
    pub test_batch_size: usize,

    /// Number of epochs per trial
    #[arg(long, default_value_t = 2)]
    pub epochs: usize,

    /// Learning rate (fixed-run path)
    #[arg(long, default_value_t = 1.0)]
    pub lr: f64,

    /// Learning rate step decay factor (fixed-run path)
    #[arg(long, default_value_t = 0.7)]
    pub gamma: f64,

    /// Disable accelerator use even when available
    #[arg(long)]
    pub no_cuda: bool,

    /// Quickly check a single pass (one logged batch per epoch)
    #[arg(long)]
    pub dry_run: bool,

    /// Random seed
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// How many batches to wait before logging training status
    #[arg(long, default_value_t = 10)]
    pub log_interval: usize,

    /// Save the final model snapshot
    #[arg(long)]
    pub save_model: bool,

    /// Number of search trials (0 runs once with the flag values)
    #[arg(long, default_value_t = 10)]
    pub trials: usize,

    /// Stop the search after this many trials without improvement
    #[arg(long)]
    pub patience: Option<usize>,

    /// Carry model weights across trials instead of reinitializing
    #[arg(long)]
    pub carry_weights: bool,

    /// Directory holding the MNIST IDX files
    #[arg(long, default_value = "data/mnist")]
    pub data_dir: PathBuf,

    /// Directory for tracked run records
    #[arg(long, default_value = "runs")]
    pub runs_dir: PathBuf,

    /// Suppress progress output
    #[arg(long)]
    pub quiet: bool,
}

/// Immutable run settings, fixed at process start
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub batch_size: usize,
    pub test_batch_size: usize,
    pub epochs: usize,
    pub lr: f64,
    pub gamma: f64,
    pub no_accel: bool,
    pub dry_run: bool,
    pub seed: u64,
    pub log_interval: usize,
    pub save_model: bool,
    pub trials: usize,
    pub patience: Option<usize>,
    pub carry_weights: bool,
    pub data_dir: PathBuf,
    pub runs_dir: PathBuf,
    pub quiet: bool,
}

impl From<Cli> for RunConfig {
    fn from(cli: Cli) -> Self {
        Self {
            batch_size: cli.batch_size,
            test_batch_size: cli.test_batch_size,
            epochs: cli.epochs,
            lr: cli.lr,
            gamma: cli.gamma,
            no_accel: cli.no_cuda,
            dry_run: cli.dry_run,
            seed: cli.seed,
            log_interval: cli.log_interval.max(1),
            save_model: cli.save_model,
            trials: cli.trials,
            patience: cli.patience,
            carry_weights: cli.carry_weights,
            data_dir: cli.data_dir,
            runs_dir: cli.runs_dir,
            quiet: cli.quiet,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Cli::parse_from(["afinar"]).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.batch_size, 64);
        assert_eq!(cfg.test_batch_size, 1000);
        assert_eq!(cfg.epochs, 2);
        assert!((cfg.lr - 1.0).abs() < 1e-12);
        assert!((cfg.gamma - 0.7).abs() < 1e-12);
        assert_eq!(cfg.seed, 1);
        assert_eq!(cfg.log_interval, 10);
        assert_eq!(cfg.trials, 10);
        assert!(!cfg.dry_run);
        assert!(!cfg.save_model);
        assert!(!cfg.carry_weights);
        assert_eq!(cfg.patience, None);
    }

    #[test]
    fn test_flag_parsing() {
        let cli = Cli::parse_from([
            "afinar",
            "--epochs",
            "3",
            "--trials",
            "0",
            "--lr",
            "0.001",
            "--no-cuda",
            "--dry-run",
            "--patience",
            "4",
        ]);
        let cfg: RunConfig = cli.into();
        assert_eq!(cfg.epochs, 3);
        assert_eq!(cfg.trials, 0);
        assert!((cfg.lr - 0.001).abs() < 1e-12);
        assert!(cfg.no_accel);
        assert!(cfg.dry_run);
        assert_eq!(cfg.patience, Some(4));
    }

    #[test]
    fn test_zero_log_interval_clamped() {
        let cli = Cli::parse_from(["afinar", "--log-interval", "0"]);
        let cfg: RunConfig = cli.into();
        assert_eq!(cfg.log_interval, 1);
    }
}
