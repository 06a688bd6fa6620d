//! Manager error types.

use thiserror::Error;

use e2mgr_core::{InstanceState, MessagingError};
use e2mgr_routing::RoutingError;
use e2mgr_state::StateError;

/// Errors returned by the lifecycle managers.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("persistence error: {0}")]
    Persistence(#[from] StateError),

    #[error("routing service error: {0}")]
    RoutingService(#[from] RoutingError),

    #[error("no active e2t instance available")]
    NoInstanceAvailable,

    #[error("e2t instance {address} is {actual}, expected {expected}")]
    InvalidState {
        address: String,
        expected: InstanceState,
        actual: InstanceState,
    },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("messaging error: {0}")]
    Messaging(#[from] MessagingError),
}

impl ManagerError {
    /// True when the underlying gateway reported a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Persistence(e) if e.is_not_found())
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
