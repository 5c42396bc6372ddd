use std::path::{Path, PathBuf};

use crate::agent::policy::EpsilonSchedule;
use crate::error::ConfigError;

/// TSP problem instance settings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProblemConfig {
    /// Number of cities per instance (tour length).
    pub n_vars: usize,
    /// How many instances to load from the dataset. Datasets with fewer
    /// instances are used in full.
    pub num_instances: usize,
    /// Path to the JSON dataset ({x_train, y_train}).
    pub data_path: PathBuf,
}

impl Default for ProblemConfig {
    fn default() -> Self {
        ProblemConfig {
            n_vars: 5,
            num_instances: 100,
            data_path: PathBuf::from("data/tsp_5_train.json"),
        }
    }
}

/// Q-learning hyperparameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub batch_size: usize,
    pub epsilon: f64,
    pub epsilon_decay: f64,
    pub epsilon_min: f64,
    pub epsilon_schedule: EpsilonSchedule,
    pub gamma: f64,
    /// Train every this many episodes (once the replay memory can fill a batch).
    pub update_after: usize,
    /// Sync target parameters every this many episodes.
    pub update_target_after: usize,
    pub learning_rate: f64,
    /// Replay memory capacity.
    pub memory_length: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            batch_size: 10,
            epsilon: 1.0,
            epsilon_decay: 0.99,
            epsilon_min: 0.01,
            epsilon_schedule: EpsilonSchedule::Fast,
            gamma: 0.9,
            update_after: 10,
            update_target_after: 30,
            learning_rate: 1e-3,
            memory_length: 10_000,
        }
    }
}

/// Training-run settings.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Episode budget.
    pub episodes: usize,
    /// Persist run artifacts (meta, histories, parameters) each episode.
    pub save: bool,
    pub output_dir: PathBuf,
    pub run_name: String,
    /// Seed for the session RNG; random when absent.
    pub seed: Option<u64>,
    /// Print a progress line every this many episodes.
    pub log_interval: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            episodes: 5000,
            save: false,
            output_dir: PathBuf::from("runs"),
            run_name: String::from("qtsp"),
            seed: None,
            log_interval: 10,
        }
    }
}

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub problem: ProblemConfig,
    pub agent: AgentConfig,
    pub training: RunConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the file
    /// does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            eprintln!(
                "Warning: config file '{}' not found, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.problem.n_vars < 3 {
            return Err(ConfigError::Validation("problem.n_vars must be >= 3".into()));
        }
        if self.problem.num_instances == 0 {
            return Err(ConfigError::Validation(
                "problem.num_instances must be > 0".into(),
            ));
        }
        if self.agent.batch_size == 0 {
            return Err(ConfigError::Validation("agent.batch_size must be > 0".into()));
        }
        if self.agent.memory_length < self.agent.batch_size {
            return Err(ConfigError::Validation(
                "agent.memory_length must be >= agent.batch_size".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.agent.gamma) {
            return Err(ConfigError::Validation("agent.gamma must be in [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.agent.epsilon) {
            return Err(ConfigError::Validation(
                "agent.epsilon must be in [0, 1]".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.agent.epsilon_min) {
            return Err(ConfigError::Validation(
                "agent.epsilon_min must be in [0, 1]".into(),
            ));
        }
        if self.agent.epsilon_decay <= 0.0 || self.agent.epsilon_decay > 1.0 {
            return Err(ConfigError::Validation(
                "agent.epsilon_decay must be in (0, 1]".into(),
            ));
        }
        if self.agent.learning_rate <= 0.0 {
            return Err(ConfigError::Validation(
                "agent.learning_rate must be > 0".into(),
            ));
        }
        if self.agent.update_after == 0 {
            return Err(ConfigError::Validation(
                "agent.update_after must be > 0".into(),
            ));
        }
        if self.agent.update_target_after == 0 {
            return Err(ConfigError::Validation(
                "agent.update_target_after must be > 0".into(),
            ));
        }
        if self.training.episodes == 0 {
            return Err(ConfigError::Validation(
                "training.episodes must be > 0".into(),
            ));
        }
        if self.training.log_interval == 0 {
            return Err(ConfigError::Validation(
                "training.log_interval must be > 0".into(),
            ));
        }
        Ok(())
    }
}
