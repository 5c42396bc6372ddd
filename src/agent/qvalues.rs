//! Q-value extraction from per-edge expectation values, and the action mask
//! used to pick the realized-action component out of a full circuit output.

use crate::env::TourEdge;
use crate::graph::{EdgeKey, EdgeWeights};

/// Hard infeasibility sentinel for visited/invalid actions. A policy
/// constant chosen to lose every argmax under normal weight/expectation
/// magnitudes, not a physical bound.
pub const Q_SENTINEL: f64 = -10_000.0;

/// Q-values over all candidate next nodes `0..n_vars`, with the expectation
/// of each candidate edge supplied by `expectation`.
///
/// A node already on the partial tour gets [`Q_SENTINEL`]; so does node 0
/// on an empty tour (no valid edge exists). Otherwise the candidate edge
/// runs from the last visited node (or node 0 on an empty tour) to the
/// candidate, and `Q(i) = weight(edge) * expectation(edge)`.
pub fn q_values_with<F>(
    n_vars: usize,
    tour: &[TourEdge],
    weights: &EdgeWeights,
    expectation: F,
) -> Vec<f64>
where
    F: Fn(EdgeKey) -> f64,
{
    (0..n_vars)
        .map(|candidate| {
            if tour.iter().any(|e| e.contains(candidate)) {
                return Q_SENTINEL;
            }
            let from = match tour.last() {
                Some(last) => last.to,
                None if candidate > 0 => 0,
                None => return Q_SENTINEL,
            };
            let edge = EdgeKey::new(from, candidate);
            weights.get(edge) * expectation(edge)
        })
        .collect()
}

/// Q-values from a raw per-edge expectation vector in canonical edge order,
/// e.g. one row of a circuit model's batched output.
pub fn q_values_from_expectations(
    n_vars: usize,
    tour: &[TourEdge],
    weights: &EdgeWeights,
    expectations: &[f64],
) -> Vec<f64> {
    let edges = weights.edge_set();
    debug_assert_eq!(expectations.len(), edges.len());
    q_values_with(n_vars, tour, weights, |edge| {
        expectations[edges.index_of(edge)]
    })
}

/// Mask over all canonical edges: the edge weight where the edge (in either
/// orientation) is part of the partial tour, 0 elsewhere. The masked sum of
/// a circuit-output vector is the Q-value of the realized action sequence.
pub fn action_mask(weights: &EdgeWeights, tour: &[TourEdge]) -> Vec<f64> {
    weights
        .edge_set()
        .iter()
        .map(|edge| {
            let taken = tour
                .iter()
                .any(|t| EdgeKey::new(t.from, t.to) == edge);
            if taken {
                weights.get(edge)
            } else {
                0.0
            }
        })
        .collect()
}
