use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfGraphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("External service error: {0}")]
    External(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Query rejected: {0}")]
    QueryRejected(String),

    #[error("Prompt error: {0}")]
    Prompt(String),
}

pub type Result<T> = std::result::Result<T, ConfGraphError>;
