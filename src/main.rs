//! afinar CLI
//!
//! Single-command training entry point.
//!
//! # Usage
//!
//! ```bash
//! # Run the default 10-trial hyperparameter search
//! afinar
//!
//! # Single fixed run with the flag values (no search)
//! afinar --trials 0 --lr 0.001 --gamma 0.7 --batch-size 64
//!
//! # Smoke-test the training loop
//! afinar --dry-run --epochs 1
//! ```

use afinar::cli::run_command;
use afinar::config::Cli;
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
