//! Experience replay: the transition record and a fixed-capacity ring
//! buffer sampled uniformly with replacement.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;

use crate::env::TourEdge;
use crate::graph::EdgeWeights;

/// One step of experience. The tour snapshot and edge weights are shared
/// immutable data; stored transitions are never mutated after insertion.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: Vec<f64>,
    /// Chosen node index.
    pub action: usize,
    pub reward: f64,
    pub next_state: Vec<f64>,
    pub done: bool,
    /// Partial tour after the action (and after closure, for the closing
    /// transition).
    pub partial_tour: Arc<[TourEdge]>,
    pub edge_weights: Arc<EdgeWeights>,
}

/// Fixed-capacity ring buffer of transitions. Overwrites oldest when full.
pub struct ReplayMemory {
    buffer: Vec<Transition>,
    capacity: usize,
    position: usize,
}

impl ReplayMemory {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "replay capacity must be > 0");
        ReplayMemory {
            buffer: Vec::with_capacity(capacity),
            capacity,
            position: 0,
        }
    }

    /// Add a transition. Evicts the oldest entry once capacity is exceeded.
    pub fn push(&mut self, transition: Transition) {
        if self.buffer.len() < self.capacity {
            self.buffer.push(transition);
        } else {
            self.buffer[self.position] = transition;
        }
        self.position = (self.position + 1) % self.capacity;
    }

    /// Sample `batch_size` transitions uniformly **with replacement**.
    pub fn sample(&self, rng: &mut StdRng, batch_size: usize) -> Vec<Transition> {
        assert!(!self.buffer.is_empty(), "cannot sample from empty memory");
        (0..batch_size)
            .map(|_| self.buffer[rng.random_range(0..self.buffer.len())].clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[cfg(test)]
    fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }
}
