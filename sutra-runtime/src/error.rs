//! Error types for the module runtime.

use thiserror::Error;

/// Runtime error type.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Module error: {0}")]
    Module(String),
}

impl From<serde_yaml::Error> for RuntimeError {
    fn from(e: serde_yaml::Error) -> Self {
        RuntimeError::Config(e.to_string())
    }
}

impl From<megha_map::MapError> for RuntimeError {
    fn from(e: megha_map::MapError) -> Self {
        RuntimeError::Module(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
