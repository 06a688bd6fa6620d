//! e2mgr-managers — E2T instance pool and RAN association lifecycle.
//!
//! Decides which E2T instance serves which RAN, keeps that assignment
//! consistent across the persistence gateway and the routing manager, and
//! tears down instances that stop answering keep-alives.
//!
//! # Architecture
//!
//! ```text
//! E2tKeepAliveWorker ──► E2tShutdownManager ──► E2tAssociationManager
//!                                 │                    │        │
//! RanDisconnectionManager ────────┼────────────────────┘        │
//!                                 ▼                             ▼
//!                          StateGateway ◄── E2tInstancesManager  RoutingClient
//!
//! RanSetupManager, RanStatusChangeManager ──► MessageSender
//! ```
//!
//! Managers hold `Arc` handles to their collaborators and are shared the
//! same way. The pool and shutdown managers each serialize their
//! read-modify-write cycles behind an async mutex.

pub mod association;
pub mod disconnection;
pub mod error;
pub mod instances;
pub mod keep_alive;
pub mod setup;
pub mod shutdown;
pub mod status_change;

#[cfg(test)]
mod testing;

pub use association::E2tAssociationManager;
pub use disconnection::RanDisconnectionManager;
pub use error::{ManagerError, ManagerResult};
pub use instances::E2tInstancesManager;
pub use keep_alive::E2tKeepAliveWorker;
pub use setup::{RanSetupManager, SetupRequestPayloads};
pub use shutdown::E2tShutdownManager;
pub use status_change::RanStatusChangeManager;
