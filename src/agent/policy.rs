//! Epsilon-greedy action selection with a configurable decay schedule.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::Rng;

/// When epsilon decays. Only `Fast` decays per episode; `Hold` leaves
/// epsilon unchanged for the whole run (kept as explicit policy, the
/// behavior the original exposes for any non-"fast" value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpsilonSchedule {
    Fast,
    Hold,
}

/// Epsilon-greedy policy over extracted Q-values.
#[derive(Debug, Clone)]
pub struct EpsilonGreedy {
    epsilon: f64,
    epsilon_min: f64,
    epsilon_decay: f64,
    schedule: EpsilonSchedule,
}

impl EpsilonGreedy {
    pub fn new(
        epsilon: f64,
        epsilon_min: f64,
        epsilon_decay: f64,
        schedule: EpsilonSchedule,
    ) -> Self {
        EpsilonGreedy {
            epsilon,
            epsilon_min,
            epsilon_decay,
            schedule,
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Set epsilon directly (e.g. 0.0 for pure greedy evaluation).
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    /// With probability epsilon, a uniformly random available node;
    /// otherwise the argmax of the Q-vector produced by `q` (visited and
    /// infeasible nodes already carry the sentinel there).
    ///
    /// `q` is only invoked on the greedy branch; with epsilon forced to 1.0
    /// no expectation evaluation happens at all.
    pub fn select<F>(&self, rng: &mut StdRng, available: &[usize], q: F) -> usize
    where
        F: FnOnce() -> Vec<f64>,
    {
        assert!(!available.is_empty(), "no available nodes to select from");
        if rng.random::<f64>() < self.epsilon {
            return *available.choose(rng).unwrap();
        }
        let q_vals = q();
        argmax(&q_vals)
    }

    /// Decay epsilon multiplicatively, clamped at the minimum. Applied once
    /// per episode, and only under the fast schedule.
    pub fn decay(&mut self) {
        if self.schedule == EpsilonSchedule::Fast {
            self.epsilon = self.epsilon_min.max(self.epsilon_decay * self.epsilon);
        }
    }
}

fn argmax(vals: &[f64]) -> usize {
    let mut best = 0;
    let mut best_val = f64::NEG_INFINITY;
    for (i, &v) in vals.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best = i;
        }
    }
    best
}
