//! Error types for the persistence gateway.

use thiserror::Error;

/// Result type alias for gateway operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during gateway operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    /// The backend could not be reached. The only retryable kind.
    #[error("connection error: {0}")]
    Connection(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl StateError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}
