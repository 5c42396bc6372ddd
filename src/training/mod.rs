//! Training infrastructure: the episode driver and approximation-ratio
//! metrics with convergence detection.

pub mod driver;
pub mod metrics;

pub use driver::{EpisodeDriver, TrainingReport, TrainingSession};
pub use metrics::{RatioMetrics, SOLVED_THRESHOLD, SOLVED_WINDOW};
