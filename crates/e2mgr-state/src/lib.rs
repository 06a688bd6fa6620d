//! e2mgr-state — persistence gateway for the E2 manager.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for RAN records, E2T instance records, and the E2T address index.
//!
//! # Architecture
//!
//! ```text
//! StateGateway (trait, consumed by the managers)
//!   ├── StateStore       redb tables, JSON-encoded values
//!   └── RetryingGateway  wraps any gateway, retries connection errors
//! ```
//!
//! A missing record is reported as [`StateError::NotFound`], which callers
//! treat differently from every other failure.

pub mod error;
pub mod gateway;
pub mod retry;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use gateway::StateGateway;
pub use retry::RetryingGateway;
pub use store::StateStore;
