//! Agent components: Q-value extraction, epsilon-greedy policy, the two
//! interchangeable learners, and the circuit-model collaborator interface.

pub mod analytic;
pub mod gradient;
pub mod model;
pub mod optim;
pub mod policy;
pub mod qvalues;

pub use analytic::{cosine_ansatz, AnalyticLearner};
pub use gradient::GradientLearner;
pub use model::{CircuitModel, LinearEdgeModel, ParameterGroup};
pub use optim::Adam;
pub use policy::{EpsilonGreedy, EpsilonSchedule};
pub use qvalues::{action_mask, q_values_from_expectations, q_values_with, Q_SENTINEL};

use crate::env::TourEdge;
use crate::graph::EdgeWeights;
use crate::memory::Transition;

/// Everything a learner needs to score the candidate next nodes at one
/// decision point.
pub struct DecisionContext<'a> {
    pub state: &'a [f64],
    pub tour: &'a [TourEdge],
    pub weights: &'a EdgeWeights,
}

/// Snapshot of trainable parameters for persistence, variant-dependent.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParameterSnapshot {
    /// The analytical variant's two free scalars.
    Scalars { values: Vec<f64> },
    /// The gradient variant's named parameter groups.
    Groups { groups: Vec<SnapshotGroup> },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SnapshotGroup {
    pub name: String,
    pub values: Vec<f64>,
}

/// Interchangeable training strategy: either backpropagation through an
/// external circuit model, or finite differences over two free scalars.
pub trait Learner {
    /// Q-values from the primary model for action selection.
    fn q_values(&self, ctx: &DecisionContext<'_>) -> Vec<f64>;

    /// One training step over a sampled batch. Returns the loss.
    fn train_step(&mut self, batch: &[Transition]) -> f64;

    /// Copy primary parameters into the target snapshot (full copy, no
    /// interpolation).
    fn sync_target(&mut self);

    /// Current trainable parameters, for persistence.
    fn parameter_snapshot(&self) -> ParameterSnapshot;
}
