//! Feed-forward digit classifier
//!
//! A fixed two-layer network (784 -> 128 -> 10) with ReLU and log-softmax.
//! Forward and backward are explicit loops over the flat weight buffers;
//! gradients are written into the parameter tensors for the optimizer to
//! consume. The architecture itself is not configurable.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{IMAGE_SIZE, NUM_CLASSES};
use crate::{Result, Tensor};

/// Hidden layer width
pub const HIDDEN_SIZE: usize = 128;

/// Loss reduction across a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Average over samples (training)
    Mean,
    /// Sum over samples (evaluation accumulates raw totals)
    Sum,
}

/// Intermediate activations kept for the backward pass
pub struct ForwardPass {
    /// Pre-activation hidden values, `batch * HIDDEN_SIZE`
    pre_act: Vec<f32>,
    /// Post-ReLU hidden values, `batch * HIDDEN_SIZE`
    hidden: Vec<f32>,
    /// Log-softmax outputs, `batch * NUM_CLASSES`
    pub log_probs: Vec<f32>,
}

/// Serialized parameter snapshot
#[derive(Serialize, Deserialize)]
struct NetSnapshot {
    w1: Vec<f32>,
    b1: Vec<f32>,
    w2: Vec<f32>,
    b2: Vec<f32>,
}

/// The classifier
pub struct Net {
    w1: Tensor, // IMAGE_SIZE x HIDDEN_SIZE, row-major by input
    b1: Tensor,
    w2: Tensor, // HIDDEN_SIZE x NUM_CLASSES, row-major by hidden
    b2: Tensor,
}

impl Net {
    /// Create a network with Xavier-style initialization from `seed`
    pub fn new(seed: u64) -> Self {
        let net = Self {
            w1: Tensor::zeros(IMAGE_SIZE * HIDDEN_SIZE, true),
            b1: Tensor::zeros(HIDDEN_SIZE, true),
            w2: Tensor::zeros(HIDDEN_SIZE * NUM_CLASSES, true),
            b2: Tensor::zeros(NUM_CLASSES, true),
        };
        net.init_weights(seed);
        net
    }

    /// Re-draw all weights in place, leaving parameter identity intact
    pub fn reinitialize(&mut self, seed: u64) {
        self.init_weights(seed);
    }

    fn init_weights(&self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        let scale1 = (2.0 / IMAGE_SIZE as f32).sqrt();
        let scale2 = (2.0 / HIDDEN_SIZE as f32).sqrt();

        self.w1.set_data(
            (0..IMAGE_SIZE * HIDDEN_SIZE)
                .map(|_| rng.random::<f32>() * scale1 - scale1 / 2.0)
                .collect(),
        );
        self.b1.set_data(vec![0.0; HIDDEN_SIZE]);
        self.w2.set_data(
            (0..HIDDEN_SIZE * NUM_CLASSES)
                .map(|_| rng.random::<f32>() * scale2 - scale2 / 2.0)
                .collect(),
        );
        self.b2.set_data(vec![0.0; NUM_CLASSES]);
    }

    /// Parameter handles sharing storage with the model
    pub fn params(&self) -> Vec<Tensor> {
        vec![self.w1.clone(), self.b1.clone(), self.w2.clone(), self.b2.clone()]
    }

    /// Forward pass over a flattened batch of `batch` images
    pub fn forward(&self, images: &[f32], batch: usize) -> ForwardPass {
        debug_assert_eq!(images.len(), batch * IMAGE_SIZE);

        let w1 = self.w1.data();
        let b1 = self.b1.data();
        let w2 = self.w2.data();
        let b2 = self.b2.data();

        let mut pre_act = vec![0.0f32; batch * HIDDEN_SIZE];
        let mut hidden = vec![0.0f32; batch * HIDDEN_SIZE];
        let mut log_probs = vec![0.0f32; batch * NUM_CLASSES];

        for b in 0..batch {
            let image = &images[b * IMAGE_SIZE..(b + 1) * IMAGE_SIZE];

            for h in 0..HIDDEN_SIZE {
                let mut sum = b1[h];
                for (i, &px) in image.iter().enumerate() {
                    sum += px * w1[i * HIDDEN_SIZE + h];
                }
                pre_act[b * HIDDEN_SIZE + h] = sum;
                hidden[b * HIDDEN_SIZE + h] = sum.max(0.0);
            }

            let mut logits = [0.0f32; NUM_CLASSES];
            for (o, logit) in logits.iter_mut().enumerate() {
                let mut sum = b2[o];
                for h in 0..HIDDEN_SIZE {
                    sum += hidden[b * HIDDEN_SIZE + h] * w2[h * NUM_CLASSES + o];
                }
                *logit = sum;
            }

            // Numerically stable log-softmax
            let max_val = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let log_sum: f32 = logits.iter().map(|z| (z - max_val).exp()).sum::<f32>().ln();
            for o in 0..NUM_CLASSES {
                log_probs[b * NUM_CLASSES + o] = logits[o] - max_val - log_sum;
            }
        }

        ForwardPass { pre_act, hidden, log_probs }
    }

    /// Inference-only log-probabilities (no state kept for backward)
    pub fn log_probs(&self, images: &[f32], batch: usize) -> Vec<f32> {
        self.forward(images, batch).log_probs
    }

    /// Negative-log-likelihood loss against integer labels
    pub fn nll_loss(log_probs: &[f32], labels: &[usize], reduction: Reduction) -> f32 {
        let total: f32 =
            labels.iter().enumerate().map(|(b, &y)| -log_probs[b * NUM_CLASSES + y]).sum();
        match reduction {
            Reduction::Mean => total / labels.len().max(1) as f32,
            Reduction::Sum => total,
        }
    }

    /// Top-1 predicted class per sample
    pub fn predictions(log_probs: &[f32]) -> Vec<usize> {
        log_probs
            .chunks(NUM_CLASSES)
            .map(|row| {
                row.iter()
                    .copied()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| a.total_cmp(b))
                    .map_or(0, |(idx, _)| idx)
            })
            .collect()
    }

    /// Accumulate mean-reduction gradients of the NLL loss into the
    /// parameter tensors
    pub fn backward(&self, images: &[f32], fwd: &ForwardPass, labels: &[usize]) {
        let batch = labels.len();
        debug_assert_eq!(images.len(), batch * IMAGE_SIZE);

        let w2 = self.w2.data();

        let mut grad_w1 = ndarray::Array1::<f32>::zeros(IMAGE_SIZE * HIDDEN_SIZE);
        let mut grad_b1 = ndarray::Array1::<f32>::zeros(HIDDEN_SIZE);
        let mut grad_w2 = ndarray::Array1::<f32>::zeros(HIDDEN_SIZE * NUM_CLASSES);
        let mut grad_b2 = ndarray::Array1::<f32>::zeros(NUM_CLASSES);

        let inv_batch = 1.0 / batch.max(1) as f32;

        for (b, &target) in labels.iter().enumerate() {
            let image = &images[b * IMAGE_SIZE..(b + 1) * IMAGE_SIZE];

            // d(loss)/d(logits) = (softmax - onehot) / batch
            let mut d_logits = [0.0f32; NUM_CLASSES];
            for o in 0..NUM_CLASSES {
                let softmax = fwd.log_probs[b * NUM_CLASSES + o].exp();
                let onehot = if o == target { 1.0 } else { 0.0 };
                d_logits[o] = (softmax - onehot) * inv_batch;
            }

            let mut d_hidden = [0.0f32; HIDDEN_SIZE];
            for o in 0..NUM_CLASSES {
                grad_b2[o] += d_logits[o];
                for h in 0..HIDDEN_SIZE {
                    grad_w2[h * NUM_CLASSES + o] += fwd.hidden[b * HIDDEN_SIZE + h] * d_logits[o];
                    d_hidden[h] += w2[h * NUM_CLASSES + o] * d_logits[o];
                }
            }

            // ReLU gate
            for h in 0..HIDDEN_SIZE {
                if fwd.pre_act[b * HIDDEN_SIZE + h] <= 0.0 {
                    d_hidden[h] = 0.0;
                }
            }

            for (h, &dh) in d_hidden.iter().enumerate() {
                grad_b1[h] += dh;
                for (i, &px) in image.iter().enumerate() {
                    grad_w1[i * HIDDEN_SIZE + h] += px * dh;
                }
            }
        }

        drop(w2);
        self.w1.accumulate_grad(&grad_w1);
        self.b1.accumulate_grad(&grad_b1);
        self.w2.accumulate_grad(&grad_w2);
        self.b2.accumulate_grad(&grad_b2);
    }

    /// Write a parameter snapshot to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let snapshot = NetSnapshot {
            w1: self.w1.to_vec(),
            b1: self.b1.to_vec(),
            w2: self.w2.to_vec(),
            b2: self.b2.to_vec(),
        };
        let json = serde_json::to_string(&snapshot)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Restore parameters from a snapshot written by [`save`](Net::save)
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let json = std::fs::read_to_string(path)?;
        let snapshot: NetSnapshot = serde_json::from_str(&json)?;
        self.w1.set_data(snapshot.w1);
        self.b1.set_data(snapshot.b1);
        self.w2.set_data(snapshot.w2);
        self.b2.set_data(snapshot.b2);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn zeroed_net() -> Net {
        let net = Net::new(0);
        net.w1.set_data(vec![0.0; IMAGE_SIZE * HIDDEN_SIZE]);
        net.w2.set_data(vec![0.0; HIDDEN_SIZE * NUM_CLASSES]);
        net
    }

    #[test]
    fn test_zero_weights_give_uniform_log_probs() {
        let net = zeroed_net();
        let images = vec![0.5; IMAGE_SIZE];

        let log_probs = net.log_probs(&images, 1);
        let expected = -(NUM_CLASSES as f32).ln();
        for &lp in &log_probs {
            assert_relative_eq!(lp, expected, epsilon = 1e-5);
        }

        let loss = Net::nll_loss(&log_probs, &[3], Reduction::Mean);
        assert_relative_eq!(loss, (NUM_CLASSES as f32).ln(), epsilon = 1e-5);
    }

    #[test]
    fn test_backward_analytic_bias_gradient() {
        // With zero weights the output layer sees softmax = 1/10 everywhere,
        // so d(b2) = softmax - onehot exactly.
        let net = zeroed_net();
        let images = vec![0.5; IMAGE_SIZE];
        let fwd = net.forward(&images, 1);
        net.backward(&images, &fwd, &[3]);

        let grad_b2 = net.b2.grad().expect("b2 gradient should be set");
        for o in 0..NUM_CLASSES {
            let expected = if o == 3 { 0.1 - 1.0 } else { 0.1 };
            assert_relative_eq!(grad_b2[o], expected, epsilon = 1e-5);
        }

        // Hidden activations are all zero, so w2 receives no gradient.
        let grad_w2 = net.w2.grad().expect("w2 gradient should be set");
        for &g in grad_w2.iter() {
            assert_relative_eq!(g, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_mean_gradient_scales_with_batch() {
        let net = zeroed_net();
        let images = vec![0.5; 2 * IMAGE_SIZE];
        let fwd = net.forward(&images, 2);
        net.backward(&images, &fwd, &[3, 3]);

        // Two identical samples with mean reduction match the single-sample
        // gradient.
        let grad_b2 = net.b2.grad().expect("b2 gradient should be set");
        assert_relative_eq!(grad_b2[3], 0.1 - 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_predictions_argmax() {
        let mut log_probs = vec![-3.0; 2 * NUM_CLASSES];
        log_probs[4] = -0.1; // sample 0 -> class 4
        log_probs[NUM_CLASSES + 9] = -0.2; // sample 1 -> class 9
        assert_eq!(Net::predictions(&log_probs), vec![4, 9]);
    }

    #[test]
    fn test_same_seed_same_weights() {
        let a = Net::new(1);
        let b = Net::new(1);
        assert_eq!(a.w1.to_vec(), b.w1.to_vec());
        assert_eq!(a.w2.to_vec(), b.w2.to_vec());

        let c = Net::new(2);
        assert_ne!(a.w1.to_vec(), c.w1.to_vec());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("mnist_cnn.json");

        let net = Net::new(5);
        net.save(&path).expect("save should succeed");

        let mut restored = Net::new(99);
        restored.load(&path).expect("load should succeed");
        assert_eq!(net.w1.to_vec(), restored.w1.to_vec());
        assert_eq!(net.b2.to_vec(), restored.b2.to_vec());
    }

    #[test]
    fn test_nll_sum_vs_mean() {
        let log_probs = vec![-1.0; 2 * NUM_CLASSES];
        let sum = Net::nll_loss(&log_probs, &[0, 1], Reduction::Sum);
        let mean = Net::nll_loss(&log_probs, &[0, 1], Reduction::Mean);
        assert_relative_eq!(sum, 2.0);
        assert_relative_eq!(mean, 1.0);
    }
}
