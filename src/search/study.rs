//! Trials and the sequential minimization study

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::{Result, SearchError};
use super::space::{HyperparameterSpace, ParameterValue};

/// A single trial (configuration + score)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    /// Trial ID
    pub id: usize,
    /// Parameter configuration
    pub config: HashMap<String, ParameterValue>,
    /// Objective score (lower is better)
    pub score: f64,
    /// Trial status
    pub status: TrialStatus,
}

impl Trial {
    /// Create a new pending trial
    pub fn new(id: usize, config: HashMap<String, ParameterValue>) -> Self {
        Self { id, config, score: f64::INFINITY, status: TrialStatus::Pending }
    }

    /// Mark trial as complete with score
    pub fn complete(&mut self, score: f64) {
        self.score = score;
        self.status = TrialStatus::Completed;
    }

    /// Look up a float parameter
    pub fn float_param(&self, name: &str) -> Result<f64> {
        self.config
            .get(name)
            .and_then(ParameterValue::as_float)
            .ok_or_else(|| SearchError::ParameterNotFound(name.to_string()))
    }

    /// Look up an integer parameter
    pub fn int_param(&self, name: &str) -> Result<i64> {
        self.config
            .get(name)
            .and_then(ParameterValue::as_int)
            .ok_or_else(|| SearchError::ParameterNotFound(name.to_string()))
    }
}

/// Trial status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialStatus {
    Pending,
    Running,
    Completed,
}

/// Sequential minimization study
///
/// Samples one configuration per trial, runs the objective, and keeps the
/// trial with the lowest score. Trials never run concurrently: the objective
/// mutates shared training state, so a later trial's starting point can
/// depend on an earlier trial's outcome.
pub struct Study {
    space: HyperparameterSpace,
    trials: Vec<Trial>,
    rng: StdRng,
    patience: Option<usize>,
}

impl Study {
    /// Create a new study over the given space
    pub fn new(space: HyperparameterSpace, seed: u64) -> Self {
        Self { space, trials: Vec::new(), rng: StdRng::seed_from_u64(seed), patience: None }
    }

    /// Stop early after this many consecutive trials without improvement
    #[must_use]
    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = Some(patience);
        self
    }

    /// All trials run so far
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// Run up to `n_trials` trials of the objective
    ///
    /// The objective receives the sampled trial and returns its score; an
    /// `Err` from the objective aborts the whole search. A NaN score is kept
    /// as a completed (never-best) trial.
    pub fn optimize<F>(&mut self, n_trials: usize, mut objective: F) -> crate::Result<()>
    where
        F: FnMut(&Trial) -> crate::Result<f64>,
    {
        if self.space.is_empty() {
            return Err(SearchError::EmptySpace.into());
        }

        let mut best = f64::INFINITY;
        let mut stale = 0usize;

        for _ in 0..n_trials {
            let config = self.space.sample_random(&mut self.rng);
            let mut trial = Trial::new(self.trials.len(), config);
            trial.status = TrialStatus::Running;

            let score = objective(&trial)?;
            trial.complete(score);

            if score < best {
                best = score;
                stale = 0;
            } else {
                stale += 1;
            }
            println!("Trial {} finished: score={:.6} (best={:.6})", trial.id, score, best);
            self.trials.push(trial);

            if let Some(patience) = self.patience {
                if stale >= patience {
                    println!("Stopping early: no improvement in {patience} trials");
                    break;
                }
            }
        }

        Ok(())
    }

    /// The completed trial with the lowest score
    pub fn best_trial(&self) -> Result<&Trial> {
        self.trials
            .iter()
            .filter(|t| t.status == TrialStatus::Completed && !t.score.is_nan())
            .min_by(|a, b| a.score.total_cmp(&b.score))
            .ok_or(SearchError::NoTrials)
    }
}
