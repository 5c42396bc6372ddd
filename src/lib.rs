//! # qtsp
//!
//! Deep Q-learning for TSP tour construction with parameterized-quantum-circuit
//! Q-functions. An agent builds tours edge by edge over complete Euclidean
//! graphs; Q-values are extracted from circuit expectation values weighted by
//! edge lengths. Two interchangeable learners are provided: a gradient variant
//! training an external circuit model through its vector-Jacobian product, and
//! an analytical variant training two free scalars by finite differences.
//!
//! ## Modules
//!
//! - [`graph`] — Points, canonical edge keys, edge weights, tour lengths
//! - [`env`] — Tour-construction environment with auto-closing tours
//! - [`agent`] — Q-value extraction, epsilon-greedy policy, the two learners
//! - [`memory`] — Experience replay buffer
//! - [`dataset`] — Instance dataset with known-optimal tours
//! - [`training`] — Episode driver and convergence metrics
//! - [`persist`] — Run artifact persistence
//! - [`config`] — TOML configuration loading and validation
//! - [`error`] — Structured error types

pub mod agent;
pub mod config;
pub mod dataset;
pub mod env;
pub mod error;
pub mod graph;
pub mod memory;
pub mod persist;
pub mod training;

pub use agent::{AnalyticLearner, GradientLearner, Learner};
pub use config::AppConfig;
pub use dataset::Dataset;
pub use env::TourEnv;
pub use training::{EpisodeDriver, TrainingReport};
