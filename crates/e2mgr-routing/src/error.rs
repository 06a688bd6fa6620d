//! Routing client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("invalid routing manager url: {0}")]
    InvalidUrl(String),

    #[error("failed to serialize request: {0}")]
    Serialize(String),

    #[error("connection to routing manager failed: {0}")]
    Connect(String),

    #[error("routing manager request failed: {0}")]
    Request(String),

    #[error("routing manager request timed out")]
    Timeout,

    #[error("routing manager returned http status {0}")]
    Status(u16),
}
