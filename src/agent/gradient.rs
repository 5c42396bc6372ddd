//! Gradient learner: bootstrapped Q-targets from a snapshot target model,
//! masked-sum predictions, MSE loss, and per-parameter-group Adam updates
//! pushed through the circuit model's backward pass.

use crate::agent::model::CircuitModel;
use crate::agent::optim::Adam;
use crate::agent::qvalues::{action_mask, q_values_from_expectations};
use crate::agent::{DecisionContext, Learner, ParameterSnapshot, SnapshotGroup};
use crate::error::TrainingError;
use crate::memory::Transition;

/// DQN-style learner over an external differentiable circuit model.
///
/// The target model is a cloned snapshot of the primary, refreshed only by
/// [`sync_target`](Learner::sync_target); it never aliases primary
/// parameters. Each parameter group has its own named Adam optimizer.
#[derive(Debug)]
pub struct GradientLearner<M: CircuitModel + Clone> {
    model: M,
    target: M,
    optimizers: Vec<(String, Adam)>,
    n_vars: usize,
    gamma: f64,
}

impl<M: CircuitModel + Clone> GradientLearner<M> {
    /// Build a learner, validating the optimizer map against the model's
    /// parameter groups: every group needs exactly one optimizer of the
    /// right size, and no optimizer may name a nonexistent group.
    pub fn new(
        model: M,
        optimizers: Vec<(String, Adam)>,
        n_vars: usize,
        gamma: f64,
    ) -> Result<Self, TrainingError> {
        let groups = model.parameter_groups();
        for (name, _) in &optimizers {
            if !groups.iter().any(|g| &g.name == name) {
                return Err(TrainingError::UnknownParameterGroup(name.clone()));
            }
        }
        // Reorder to match the model's group order so updates index cleanly.
        let mut ordered = Vec::with_capacity(groups.len());
        for group in &groups {
            let (name, adam) = optimizers
                .iter()
                .find(|(name, _)| name == &group.name)
                .cloned()
                .ok_or_else(|| TrainingError::MissingOptimizer(group.name.clone()))?;
            if adam.len() != group.len {
                return Err(TrainingError::OptimizerSizeMismatch {
                    group: group.name.clone(),
                    expected: group.len,
                    got: adam.len(),
                });
            }
            ordered.push((name, adam));
        }

        let target = model.clone();
        Ok(GradientLearner {
            model,
            target,
            optimizers: ordered,
            n_vars,
            gamma,
        })
    }

    /// Convenience constructor: one Adam per group, shared learning rate.
    pub fn with_uniform_optimizers(
        model: M,
        learning_rate: f64,
        n_vars: usize,
        gamma: f64,
    ) -> Result<Self, TrainingError> {
        let optimizers = model
            .parameter_groups()
            .iter()
            .map(|g| (g.name.clone(), Adam::new(g.len, learning_rate)))
            .collect();
        Self::new(model, optimizers, n_vars, gamma)
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn target(&self) -> &M {
        &self.target
    }

    /// Bootstrapped targets: `r + gamma * max_a Q_target(next, a) * (1 - done)`.
    fn targets(&self, batch: &[Transition]) -> Vec<f64> {
        let next_states: Vec<Vec<f64>> = batch.iter().map(|t| t.next_state.clone()).collect();
        let future_exps = self.target.expectations(&next_states);
        batch
            .iter()
            .zip(&future_exps)
            .map(|(t, exps)| {
                if t.done {
                    return t.reward;
                }
                let q = q_values_from_expectations(
                    self.n_vars,
                    &t.partial_tour,
                    &t.edge_weights,
                    exps,
                );
                let max_q = q.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                t.reward + self.gamma * max_q
            })
            .collect()
    }
}

impl<M: CircuitModel + Clone> Learner for GradientLearner<M> {
    fn q_values(&self, ctx: &DecisionContext<'_>) -> Vec<f64> {
        let states = vec![ctx.state.to_vec()];
        let exps = self.model.expectations(&states);
        q_values_from_expectations(self.n_vars, ctx.tour, ctx.weights, &exps[0])
    }

    fn train_step(&mut self, batch: &[Transition]) -> f64 {
        let batch_size = batch.len();
        let targets = self.targets(batch);

        let states: Vec<Vec<f64>> = batch.iter().map(|t| t.state.clone()).collect();
        let exps = self.model.expectations(&states);
        let masks: Vec<Vec<f64>> = batch
            .iter()
            .map(|t| action_mask(&t.edge_weights, &t.partial_tour))
            .collect();

        // Predicted Q of the realized action sequence: masked sum per row.
        let preds: Vec<f64> = exps
            .iter()
            .zip(&masks)
            .map(|(row, mask)| row.iter().zip(mask).map(|(e, m)| e * m).sum())
            .collect();

        let loss = preds
            .iter()
            .zip(&targets)
            .map(|(p, t)| (p - t) * (p - t))
            .sum::<f64>()
            / batch_size as f64;

        // dLoss/d expectation_{b,e} = 2 (pred_b - target_b) / B * mask_{b,e}
        let seed: Vec<Vec<f64>> = preds
            .iter()
            .zip(&targets)
            .zip(&masks)
            .map(|((p, t), mask)| {
                let scale = 2.0 * (p - t) / batch_size as f64;
                mask.iter().map(|m| scale * m).collect()
            })
            .collect();

        let grads = self.model.backward(&states, &seed);
        let mut params = self.model.parameters();
        for (i, (_, adam)) in self.optimizers.iter_mut().enumerate() {
            adam.step(&mut params[i], &grads[i]);
        }
        self.model.set_parameters(&params);

        loss
    }

    fn sync_target(&mut self) {
        self.target.set_parameters(&self.model.parameters());
    }

    fn parameter_snapshot(&self) -> ParameterSnapshot {
        let groups = self
            .model
            .parameter_groups()
            .into_iter()
            .zip(self.model.parameters())
            .map(|(g, values)| SnapshotGroup {
                name: g.name,
                values,
            })
            .collect();
        ParameterSnapshot::Groups { groups }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::agent::model::{LinearEdgeModel, LINEAR_EDGE_GROUP};
    use crate::env::{TourEdge, TourEnv};
    use crate::graph::EdgeWeights;

    fn triangle_transition(done: bool) -> Transition {
        let weights = EdgeWeights::shared(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        Transition {
            state: vec![0.0; 6],
            action: 1,
            reward: -2.0,
            next_state: vec![0.0; 6],
            done,
            partial_tour: Arc::from([TourEdge { from: 0, to: 1 }].as_slice()),
            edge_weights: weights,
        }
    }

    #[test]
    fn test_unknown_optimizer_group_rejected() {
        let model = LinearEdgeModel::new(3);
        let err = GradientLearner::new(
            model,
            vec![("rescaling".to_string(), Adam::new(3, 0.1))],
            3,
            0.9,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TrainingError::UnknownParameterGroup(name) if name == "rescaling"
        ));
    }

    #[test]
    fn test_missing_optimizer_rejected() {
        let model = LinearEdgeModel::new(3);
        let err = GradientLearner::new(model, vec![], 3, 0.9).unwrap_err();
        assert!(matches!(err, TrainingError::MissingOptimizer(_)));
    }

    #[test]
    fn test_optimizer_size_mismatch_rejected() {
        let model = LinearEdgeModel::new(3);
        let err = GradientLearner::new(
            model,
            vec![(LINEAR_EDGE_GROUP.to_string(), Adam::new(2, 0.1))],
            3,
            0.9,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TrainingError::OptimizerSizeMismatch { expected: 3, got: 2, .. }
        ));
    }

    #[test]
    fn test_target_sync_idempotent_and_unaliased() {
        let model = LinearEdgeModel::new(3);
        let mut learner = GradientLearner::with_uniform_optimizers(model, 0.1, 3, 0.9).unwrap();

        learner.train_step(&[triangle_transition(false), triangle_transition(true)]);
        assert_ne!(learner.model().parameters(), learner.target().parameters());

        learner.sync_target();
        assert_eq!(learner.model().parameters(), learner.target().parameters());
        let target_after_sync = learner.target().parameters();

        // Further primary updates never leak into the target snapshot.
        learner.train_step(&[triangle_transition(false), triangle_transition(true)]);
        assert_eq!(learner.target().parameters(), target_after_sync);
        assert_ne!(learner.model().parameters(), target_after_sync);
    }

    #[test]
    fn test_done_transition_target_is_reward_only() {
        let model = LinearEdgeModel::constant(3, 1.0);
        let learner = GradientLearner::with_uniform_optimizers(model, 0.1, 3, 0.9).unwrap();
        let targets = learner.targets(&[triangle_transition(true)]);
        assert!((targets[0] - (-2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_bootstrap_uses_max_future_q() {
        let model = LinearEdgeModel::constant(3, 1.0);
        let learner = GradientLearner::with_uniform_optimizers(model, 0.1, 3, 0.9).unwrap();
        let t = triangle_transition(false);
        // Only candidate after [0 -> 1] is node 2 via edge (1,2): w = sqrt(2),
        // expectation 1.0.
        let targets = learner.targets(std::slice::from_ref(&t));
        let expected = -2.0 + 0.9 * 2f64.sqrt();
        assert!((targets[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_train_step_reduces_loss_on_repeated_batch() {
        let model = LinearEdgeModel::new(3);
        let mut learner = GradientLearner::with_uniform_optimizers(model, 0.05, 3, 0.9).unwrap();
        let batch = vec![triangle_transition(true), triangle_transition(true)];
        let first = learner.train_step(&batch);
        let mut last = first;
        for _ in 0..200 {
            last = learner.train_step(&batch);
        }
        assert!(last < first, "loss should shrink: first {first}, last {last}");
    }

    #[test]
    fn test_q_values_through_model() {
        let model = LinearEdgeModel::constant(3, 2.0);
        let learner = GradientLearner::with_uniform_optimizers(model, 0.1, 3, 0.9).unwrap();
        let env = TourEnv::reset(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
        let state = env.encode_state();
        let q = learner.q_values(&DecisionContext {
            state: &state,
            tour: env.tour_edges(),
            weights: env.weights().as_ref(),
        });
        assert_eq!(q[0], crate::agent::Q_SENTINEL);
        assert!((q[1] - 2.0).abs() < 1e-12); // w(0,1)=1 * 2.0
    }
}
