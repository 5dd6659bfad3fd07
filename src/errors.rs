use config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Index {index} out of bounds for data set of {len} rows")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("Malformed record at line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Inconsistent data set shape: {0}")]
    Shape(String),
    #[error("Data set {0} is not configured")]
    UnknownDataset(String),
    #[error("I/O error while reading data set: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Weight matrix has shape {got:?}, expected {expected:?}")]
    Shape {
        expected: (usize, usize),
        got: (usize, usize),
    },
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Action {action} out of range for {num_actions} actions")]
    ActionOutOfRange { action: usize, num_actions: usize },
    #[error("Context has {got} features, expected {expected}")]
    ContextDimension { expected: usize, got: usize },
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error while writing state store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize state store to JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Cannot read configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("Run with seed {0:?} panicked")]
    RunPanicked(Option<u64>),
}
