//! Trial runner: one hyperparameter combination, trained end to end

use super::{evaluate, train_epoch};
use crate::config::RunConfig;
use crate::data::{DataLoader, LoaderOptions, MnistDataset};
use crate::device::ComputeDevice;
use crate::model::Net;
use crate::optim::{Adam, LRScheduler, StepDecayLR};
use crate::search::{self, HyperparameterSpace, ParameterDomain, ParameterValue, Trial};
use crate::tracking::{storage::TrackingBackend, ExperimentTracker};
use crate::Result;

/// One sampled hyperparameter combination
#[derive(Debug, Clone, Copy)]
pub struct HyperParams {
    pub lr: f64,
    pub batch_size: usize,
    pub gamma: f64,
}

impl HyperParams {
    /// The search space: lr log-uniform in [1e-5, 1e-1], batch size among
    /// {64, 128, 256}, gamma uniform in [0.5, 0.9]
    pub fn search_space() -> HyperparameterSpace {
        let mut space = HyperparameterSpace::new();
        space.add("lr", ParameterDomain::Continuous { low: 1e-5, high: 1e-1, log_scale: true });
        space.add(
            "batch_size",
            ParameterDomain::Categorical {
                choices: vec![
                    ParameterValue::Int(64),
                    ParameterValue::Int(128),
                    ParameterValue::Int(256),
                ],
            },
        );
        space.add("gamma", ParameterDomain::Continuous { low: 0.5, high: 0.9, log_scale: false });
        space
    }

    /// Extract the three hyperparameters from a sampled trial
    pub fn from_trial(trial: &Trial) -> search::Result<Self> {
        Ok(Self {
            lr: trial.float_param("lr")?,
            batch_size: trial.int_param("batch_size")? as usize,
            gamma: trial.float_param("gamma")?,
        })
    }
}

impl std::fmt::Display for HyperParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lr={:.6}, batch_size={}, gamma={:.4}", self.lr, self.batch_size, self.gamma)
    }
}

/// Runs full training for one hyperparameter proposal and produces the
/// scalar objective (final evaluation loss)
pub struct TrialRunner<'a, B: TrackingBackend> {
    cfg: &'a RunConfig,
    device: ComputeDevice,
    model: &'a mut Net,
    tracker: &'a mut ExperimentTracker<B>,
    run_id: &'a str,
    shuffle_counter: u64,
}

impl<'a, B: TrackingBackend> TrialRunner<'a, B> {
    pub fn new(
        cfg: &'a RunConfig,
        device: ComputeDevice,
        model: &'a mut Net,
        tracker: &'a mut ExperimentTracker<B>,
        run_id: &'a str,
    ) -> Self {
        Self { cfg, device, model, tracker, run_id, shuffle_counter: 0 }
    }

    /// Run one search trial
    ///
    /// Unless weight carrying is enabled, the model is reinitialized from a
    /// seed derived from the run seed and the trial id so trials are
    /// independent.
    pub fn run_trial(&mut self, trial: &Trial) -> Result<f64> {
        let hp = HyperParams::from_trial(trial)?;

        if !self.cfg.carry_weights {
            self.model.reinitialize(self.cfg.seed.wrapping_add(1 + trial.id as u64));
        }

        for (key, value) in &trial.config {
            let prefixed = format!("trial{}_{}", trial.id, key);
            self.tracker.log_param(self.run_id, &prefixed, &value.to_string())?;
        }

        self.run_with(&hp)
    }

    /// Train and evaluate for all epochs with fixed hyperparameters,
    /// returning the final epoch's evaluation loss
    pub fn run_with(&mut self, hp: &HyperParams) -> Result<f64> {
        // Data sources are rebuilt per trial at the chosen batch size.
        let train_set = MnistDataset::load_train(&self.cfg.data_dir)?;
        let test_set = MnistDataset::load_test(&self.cfg.data_dir)?;

        let train_opts = LoaderOptions::for_device(hp.batch_size, self.device);
        let test_opts = LoaderOptions::for_device(self.cfg.test_batch_size, self.device);

        let mut params = self.model.params();
        let mut optimizer = Adam::default_params(hp.lr as f32);
        let mut scheduler = StepDecayLR::new(hp.lr as f32, 1, hp.gamma as f32);

        let mut final_loss = f64::INFINITY;
        for epoch in 0..self.cfg.epochs {
            self.shuffle_counter += 1;
            let shuffle_seed = self.cfg.seed.wrapping_add(self.shuffle_counter);

            let train_loader = DataLoader::new(&train_set, &train_opts, shuffle_seed);
            train_epoch(
                self.model,
                &mut params,
                &mut optimizer,
                &train_loader,
                epoch,
                self.cfg,
                self.tracker,
                self.run_id,
            )?;

            let test_loader = DataLoader::new(&test_set, &test_opts, self.cfg.seed);
            let report = evaluate(
                self.model,
                &test_loader,
                epoch,
                self.cfg.quiet,
                self.tracker,
                self.run_id,
            )?;
            final_loss = report.avg_loss;

            scheduler.step();
            scheduler.apply(&mut optimizer);
        }

        Ok(final_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn trial_with(lr: f64, batch_size: i64, gamma: f64) -> Trial {
        let mut config = HashMap::new();
        config.insert("lr".to_string(), ParameterValue::Float(lr));
        config.insert("batch_size".to_string(), ParameterValue::Int(batch_size));
        config.insert("gamma".to_string(), ParameterValue::Float(gamma));
        Trial::new(0, config)
    }

    #[test]
    fn test_hyper_params_from_trial() {
        let trial = trial_with(0.01, 128, 0.7);
        let hp = HyperParams::from_trial(&trial).expect("trial has all parameters");
        assert!((hp.lr - 0.01).abs() < 1e-12);
        assert_eq!(hp.batch_size, 128);
        assert!((hp.gamma - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_hyper_params_missing_parameter() {
        let mut config = HashMap::new();
        config.insert("lr".to_string(), ParameterValue::Float(0.01));
        let trial = Trial::new(0, config);
        assert!(HyperParams::from_trial(&trial).is_err());
    }

    #[test]
    fn test_search_space_shape() {
        let space = HyperParams::search_space();
        assert_eq!(space.len(), 3);
        assert!(space.get("lr").is_some());
        assert!(space.get("batch_size").is_some());
        assert!(space.get("gamma").is_some());
    }

    #[test]
    fn test_display_format() {
        let hp = HyperParams { lr: 0.001, batch_size: 64, gamma: 0.5 };
        let text = format!("{hp}");
        assert!(text.contains("batch_size=64"));
        assert!(text.contains("gamma=0.5000"));
    }
}
