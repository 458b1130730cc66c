use thiserror::Error;

#[derive(Error, Debug)]
pub enum StructLogError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Log sink error: {0}")]
    Sink(String),
    #[error("Logging has already been initialized for this process")]
    AlreadyInitialized,
    #[error("Request environment is missing required key '{0}'")]
    MissingEnviron(String),
    #[error("Invalid response status: {0:?}")]
    InvalidStatus(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_yaml_ng::Error> for StructLogError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        StructLogError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for StructLogError {
    fn from(err: serde_json::Error) -> Self {
        StructLogError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StructLogError>;
