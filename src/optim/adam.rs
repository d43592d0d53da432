//! Adam optimizer

use super::Optimizer;
use crate::Tensor;
use ndarray::Array1;

/// Adaptive moment estimation optimizer
///
/// Update rule with bias correction folded into the step size:
/// lr_t = lr * sqrt(1 - beta2^t) / (1 - beta1^t)
/// theta_t = theta_{t-1} - lr_t * m_t / (sqrt(v_t) + eps)
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    t: u64,
    m: Vec<Option<Array1<f32>>>, // First moment
    v: Vec<Option<Array1<f32>>>, // Second moment
}

impl Adam {
    /// Create a new Adam optimizer
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self { lr, beta1, beta2, epsilon, t: 0, m: Vec::new(), v: Vec::new() }
    }

    /// Create Adam with the standard defaults (beta1=0.9, beta2=0.999, eps=1e-8)
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8)
    }

    /// Get optimizer step counter
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.t
    }

    /// Initialize moments if needed
    fn ensure_moments(&mut self, params: &[Tensor]) {
        if self.m.is_empty() {
            self.m = params.iter().map(|_| None).collect();
            self.v = params.iter().map(|_| None).collect();
        }
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [Tensor]) {
        self.ensure_moments(params);
        self.t += 1;

        // Bias correction factors
        let lr_t = self.lr
            * ((1.0 - self.beta2.powi(self.t as i32)).sqrt()
                / (1.0 - self.beta1.powi(self.t as i32)));

        for (i, param) in params.iter_mut().enumerate() {
            let Some(grad) = param.grad() else {
                continue;
            };

            let m = self.m[i].get_or_insert_with(|| Array1::zeros(grad.len()));
            let v = self.v[i].get_or_insert_with(|| Array1::zeros(grad.len()));

            let mut data = param.data_mut();
            for j in 0..grad.len() {
                let g = grad[j];
                m[j] = self.beta1 * m[j] + (1.0 - self.beta1) * g;
                v[j] = self.beta2 * v[j] + (1.0 - self.beta2) * g * g;
                data[j] -= lr_t * m[j] / (v[j].sqrt() + self.epsilon);
            }
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_adam_moves_against_gradient() {
        let mut opt = Adam::default_params(0.1);
        let param = Tensor::from_vec(vec![1.0, -1.0], true);
        param.set_grad(arr1(&[1.0, -1.0]));

        opt.step(&mut [param.clone()]);

        let data = param.to_vec();
        assert!(data[0] < 1.0, "positive gradient should decrease the parameter");
        assert!(data[1] > -1.0, "negative gradient should increase the parameter");
        assert_eq!(opt.step_count(), 1);
    }

    #[test]
    fn test_adam_skips_params_without_grad() {
        let mut opt = Adam::default_params(0.1);
        let param = Tensor::from_vec(vec![1.0], true);

        opt.step(&mut [param.clone()]);
        assert_eq!(param.to_vec(), vec![1.0]);
    }

    #[test]
    fn test_adam_lr_accessors() {
        let mut opt = Adam::default_params(0.01);
        assert!((opt.lr() - 0.01).abs() < 1e-9);
        opt.set_lr(0.005);
        assert!((opt.lr() - 0.005).abs() < 1e-9);
    }

    #[test]
    fn test_adam_first_step_size_bounded_by_lr() {
        // With bias correction, the first update is ~lr per coordinate.
        let mut opt = Adam::default_params(0.1);
        let param = Tensor::from_vec(vec![0.0], true);
        param.set_grad(arr1(&[3.0]));

        opt.step(&mut [param.clone()]);
        assert!((param.to_vec()[0] + 0.1).abs() < 1e-3);
    }
}
