use crate::persist::RunMeta;

/// Window of recent episodes the convergence check averages over.
pub const SOLVED_WINDOW: usize = 100;
/// The environment counts as solved once the windowed mean approximation
/// ratio drops to this value.
pub const SOLVED_THRESHOLD: f64 = 1.02;

/// Per-episode tour-length and approximation-ratio tracking, plus best-tour
/// metadata. Histories grow for the whole run; they feed persistence.
pub struct RatioMetrics {
    tour_lengths: Vec<f64>,
    optimal_lengths: Vec<f64>,
    ratios: Vec<f64>,
    meta: RunMeta,
}

impl RatioMetrics {
    pub fn new(num_instances: usize) -> Self {
        RatioMetrics {
            tour_lengths: Vec::new(),
            optimal_lengths: Vec::new(),
            ratios: Vec::new(),
            meta: RunMeta::new(num_instances),
        }
    }

    /// Record one finished episode.
    pub fn record_episode(
        &mut self,
        instance_ix: usize,
        tour: &[usize],
        tour_length: f64,
        optimal_length: f64,
    ) {
        self.tour_lengths.push(tour_length);
        self.optimal_lengths.push(optimal_length);
        self.ratios.push(tour_length / optimal_length);

        if tour_length < self.meta.best_tour_length {
            self.meta.best_tour_length = tour_length;
            self.meta.best_tour = tour.to_vec();
            self.meta.best_tour_ix = instance_ix;
        }
    }

    /// Mean approximation ratio over the last [`SOLVED_WINDOW`] episodes
    /// (over everything recorded, while fewer exist).
    pub fn running_average(&self) -> f64 {
        let n = self.ratios.len().min(SOLVED_WINDOW);
        if n == 0 {
            return 0.0;
        }
        let sum: f64 = self.ratios.iter().rev().take(n).sum();
        sum / n as f64
    }

    /// Convergence: a full window whose mean ratio is at or under the
    /// threshold. A monitoring signal, not a guarantee.
    pub fn solved(&self) -> bool {
        self.ratios.len() >= SOLVED_WINDOW && self.running_average() <= SOLVED_THRESHOLD
    }

    pub fn mark_solved(&mut self) {
        self.meta.env_solved = true;
    }

    pub fn episodes(&self) -> usize {
        self.ratios.len()
    }

    pub fn tour_lengths(&self) -> &[f64] {
        &self.tour_lengths
    }

    pub fn optimal_lengths(&self) -> &[f64] {
        &self.optimal_lengths
    }

    pub fn meta(&self) -> &RunMeta {
        &self.meta
    }
}
