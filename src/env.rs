//! Tour-construction environment: one TSP instance as a complete graph, a
//! partial tour built edge by edge, and rewards from tour-length deltas.

use std::sync::Arc;

use crate::graph::{tour_length, EdgeSet, EdgeWeights, Point};

/// One directed edge of a partial tour, in visitation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TourEdge {
    pub from: usize,
    pub to: usize,
}

impl TourEdge {
    pub fn contains(&self, node: usize) -> bool {
        self.from == node || self.to == node
    }
}

/// What one phase of an environment step produced: the reward for the edges
/// added, the done flag, the freshly encoded next state, and an immutable
/// snapshot of the partial tour after the phase.
#[derive(Debug, Clone)]
pub struct StepPhase {
    pub reward: f64,
    pub done: bool,
    pub next_state: Vec<f64>,
    pub tour_snapshot: Arc<[TourEdge]>,
}

/// Tour-construction state machine over one instance.
///
/// The tour always starts at node 0. Once only one unvisited node remains
/// after a step, the tour auto-closes in that same step: the penultimate
/// edge and the closing edge back to node 0 are appended together, so every
/// finished tour has `n_vars + 1` entries counting the return to the start.
pub struct TourEnv {
    nodes: Vec<Point>,
    edges: EdgeSet,
    weights: Arc<EdgeWeights>,
    tour: Vec<usize>,
    tour_edges: Vec<TourEdge>,
    available: Vec<usize>,
}

impl TourEnv {
    /// Set up the environment for one instance: compute all pairwise edge
    /// weights once, start the tour at node 0, mark every other node
    /// available.
    pub fn reset(nodes: Vec<Point>) -> Self {
        let n = nodes.len();
        let weights = EdgeWeights::shared(&nodes);
        TourEnv {
            edges: EdgeSet::new(n),
            weights,
            tour: vec![0],
            tour_edges: Vec::with_capacity(n + 1),
            available: (1..n).collect(),
            nodes,
        }
    }

    pub fn n_vars(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[Point] {
        &self.nodes
    }

    pub fn weights(&self) -> &Arc<EdgeWeights> {
        &self.weights
    }

    /// Node visitation order so far (ends with 0 again once closed).
    pub fn tour(&self) -> &[usize] {
        &self.tour
    }

    pub fn tour_edges(&self) -> &[TourEdge] {
        &self.tour_edges
    }

    pub fn available(&self) -> &[usize] {
        &self.available
    }

    pub fn is_done(&self) -> bool {
        self.available.is_empty()
    }

    /// Encode the current state as a fixed-length vector:
    /// `[availability per node, scaled to {0, pi}] ++ [atan(weight) per
    /// canonical edge]`. Length is always `n + C(n, 2)`. Recomputed fresh on
    /// every call because availability changes each step.
    pub fn encode_state(&self) -> Vec<f64> {
        let n = self.n_vars();
        let mut vals = Vec::with_capacity(n + self.edges.len());
        for node in 0..n {
            let available = self.available.contains(&node);
            vals.push(if available { std::f64::consts::PI } else { 0.0 });
        }
        vals.extend(self.weights.as_slice().iter().map(|w| w.atan()));
        vals
    }

    /// Immutable snapshot of the partial tour, safe to store in a transition.
    pub fn snapshot(&self) -> Arc<[TourEdge]> {
        Arc::from(self.tour_edges.as_slice())
    }

    /// Append the edge from the last visited node to `action` and remove
    /// `action` from the available set. When exactly one node remains
    /// afterwards, the tour auto-closes in the same call and the closure is
    /// returned as a second phase.
    ///
    /// # Panics
    /// Panics if `action` is not available. Callers guarantee validity via
    /// the Q-value masking; an invalid action is a contract violation, not a
    /// recoverable error.
    pub fn step(&mut self, action: usize) -> (StepPhase, Option<StepPhase>) {
        let pos = self
            .available
            .iter()
            .position(|&n| n == action)
            .unwrap_or_else(|| {
                panic!(
                    "action {} not available (available: {:?})",
                    action, self.available
                )
            });

        let old_length = tour_length(&self.nodes, &self.tour);
        let last = *self.tour.last().unwrap();
        self.tour_edges.push(TourEdge { from: last, to: action });
        self.tour.push(action);
        self.available.remove(pos);

        let done = self.available.len() <= 1;
        let new_length = tour_length(&self.nodes, &self.tour);
        let phase = StepPhase {
            reward: old_length - new_length,
            done,
            next_state: self.encode_state(),
            tour_snapshot: self.snapshot(),
        };

        let closure = (self.available.len() == 1).then(|| self.close());
        (phase, closure)
    }

    /// Append the penultimate edge to the one remaining node and the closing
    /// edge back to node 0.
    fn close(&mut self) -> StepPhase {
        let remaining = self.available[0];
        let old_length = tour_length(&self.nodes, &self.tour);
        let last = *self.tour.last().unwrap();
        self.tour_edges.push(TourEdge { from: last, to: remaining });
        self.tour_edges.push(TourEdge { from: remaining, to: 0 });
        self.tour.push(remaining);
        self.tour.push(0);
        self.available.clear();

        let new_length = tour_length(&self.nodes, &self.tour);
        StepPhase {
            reward: old_length - new_length,
            done: true,
            next_state: self.encode_state(),
            tour_snapshot: self.snapshot(),
        }
    }

    /// Current tour length, counting the implied return to the start.
    pub fn current_length(&self) -> f64 {
        tour_length(&self.nodes, &self.tour)
    }
}
