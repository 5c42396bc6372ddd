//! Interface to the externally owned differentiable circuit model, plus a
//! minimal linear reference implementation.
//!
//! The core never simulates a circuit. It consumes expectation values and
//! pushes loss sensitivities back through this trait; what happens inside
//! (parameterized quantum circuit, simulator, classical surrogate) is the
//! implementor's business.

use crate::graph::EdgeSet;

/// Name and size of one trainable parameter group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterGroup {
    pub name: String,
    pub len: usize,
}

/// A differentiable model producing one expectation scalar per graph edge.
///
/// Parameter snapshots returned by [`parameters`](CircuitModel::parameters)
/// are copies: mutating the model afterwards never changes a snapshot, and
/// target models built from snapshots never alias the primary.
pub trait CircuitModel {
    /// Batch forward pass: for each state vector, one expectation value per
    /// canonical edge.
    fn expectations(&self, states: &[Vec<f64>]) -> Vec<Vec<f64>>;

    /// The trainable parameter groups, in a fixed order.
    fn parameter_groups(&self) -> Vec<ParameterGroup>;

    /// Snapshot of all parameters, per group, in `parameter_groups` order.
    fn parameters(&self) -> Vec<Vec<f64>>;

    /// Overwrite all parameters from a snapshot in `parameter_groups` order.
    fn set_parameters(&mut self, params: &[Vec<f64>]);

    /// Vector-Jacobian product: given `seed[b][e]` = dLoss/d expectation of
    /// edge `e` for batch element `b`, return dLoss/d parameter per group.
    fn backward(&self, states: &[Vec<f64>], seed: &[Vec<f64>]) -> Vec<Vec<f64>>;
}

/// Reference model: one trainable weight per canonical edge, independent of
/// the input state. Stands in for an external quantum backend so the
/// gradient learner is exercisable end to end; the expectation of edge `e`
/// is simply its weight `w_e`.
#[derive(Debug, Clone)]
pub struct LinearEdgeModel {
    edges: EdgeSet,
    weights: Vec<f64>,
}

pub const LINEAR_EDGE_GROUP: &str = "edge_weights";

impl LinearEdgeModel {
    pub fn new(n_vars: usize) -> Self {
        let edges = EdgeSet::new(n_vars);
        LinearEdgeModel {
            edges,
            weights: vec![1.0; edges.len()],
        }
    }

    /// Model with every expectation pinned to `value`; handy in tests.
    pub fn constant(n_vars: usize, value: f64) -> Self {
        let edges = EdgeSet::new(n_vars);
        LinearEdgeModel {
            edges,
            weights: vec![value; edges.len()],
        }
    }
}

impl CircuitModel for LinearEdgeModel {
    fn expectations(&self, states: &[Vec<f64>]) -> Vec<Vec<f64>> {
        states.iter().map(|_| self.weights.clone()).collect()
    }

    fn parameter_groups(&self) -> Vec<ParameterGroup> {
        vec![ParameterGroup {
            name: LINEAR_EDGE_GROUP.to_string(),
            len: self.weights.len(),
        }]
    }

    fn parameters(&self) -> Vec<Vec<f64>> {
        vec![self.weights.clone()]
    }

    fn set_parameters(&mut self, params: &[Vec<f64>]) {
        assert_eq!(params.len(), 1, "LinearEdgeModel has one parameter group");
        assert_eq!(params[0].len(), self.weights.len());
        self.weights.copy_from_slice(&params[0]);
    }

    fn backward(&self, states: &[Vec<f64>], seed: &[Vec<f64>]) -> Vec<Vec<f64>> {
        // d expectation_e / d w_e = 1, so the gradient is the seed summed
        // over the batch.
        debug_assert_eq!(states.len(), seed.len());
        let mut grad = vec![0.0; self.weights.len()];
        for row in seed {
            debug_assert_eq!(row.len(), grad.len());
            for (g, s) in grad.iter_mut().zip(row) {
                *g += s;
            }
        }
        vec![grad]
    }
}
