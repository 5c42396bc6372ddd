use std::path::PathBuf;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Errors that can occur when loading a TSP instance dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse dataset {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("dataset contains no instances")]
    Empty,

    #[error("x_train has {x_len} instances but y_train has {y_len} tours")]
    LengthMismatch { x_len: usize, y_len: usize },

    #[error("instance {index} has {got} nodes, expected {expected}")]
    WrongInstanceSize {
        index: usize,
        expected: usize,
        got: usize,
    },

    #[error("instance {index} has an invalid optimal tour entry {entry} (1-indexed, must be in 1..={max})")]
    BadTourEntry {
        index: usize,
        entry: usize,
        max: usize,
    },
}

/// Errors that can occur while setting up or running training.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("no optimizer configured for parameter group '{0}'")]
    MissingOptimizer(String),

    #[error("optimizer '{0}' does not match any model parameter group")]
    UnknownParameterGroup(String),

    #[error("optimizer for group '{group}' sized for {got} parameters, group has {expected}")]
    OptimizerSizeMismatch {
        group: String,
        expected: usize,
        got: usize,
    },

    #[error("dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),
}

/// Errors that can occur when writing run artifacts.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
