//! Hand-rolled Adam with per-parameter step counters and bias-corrected
//! moment estimates.

/// Adam optimizer state for a fixed-size parameter vector.
///
/// Fixed beta1 = 0.9, beta2 = 0.999; `eps` guards the second-moment
/// denominator. Given identical gradient sequences and initial moment
/// state, the produced parameter trajectory is bit-identical across runs.
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    eps: f64,
    t: Vec<u32>,
    m: Vec<f64>,
    v: Vec<f64>,
}

impl Adam {
    pub fn new(n_params: usize, learning_rate: f64) -> Self {
        Adam {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-8,
            t: vec![0; n_params],
            m: vec![0.0; n_params],
            v: vec![0.0; n_params],
        }
    }

    pub fn len(&self) -> usize {
        self.m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.m.is_empty()
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Apply one update in place: `p -= lr * m_hat / (sqrt(v_hat) + eps)`.
    pub fn step(&mut self, params: &mut [f64], grads: &[f64]) {
        assert_eq!(params.len(), self.m.len(), "parameter count mismatch");
        assert_eq!(grads.len(), self.m.len(), "gradient count mismatch");

        for i in 0..params.len() {
            self.t[i] += 1;
            self.m[i] = self.beta1 * self.m[i] + (1.0 - self.beta1) * grads[i];
            self.v[i] = self.beta2 * self.v[i] + (1.0 - self.beta2) * grads[i] * grads[i];
            let m_hat = self.m[i] / (1.0 - self.beta1.powi(self.t[i] as i32));
            let v_hat = self.v[i] / (1.0 - self.beta2.powi(self.t[i] as i32));
            params[i] -= self.learning_rate * m_hat / (v_hat.sqrt() + self.eps);
        }
    }
}
