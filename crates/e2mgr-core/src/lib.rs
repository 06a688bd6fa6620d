//! e2mgr-core — shared types for the E2 manager.
//!
//! Holds the persisted domain records (RANs and E2T instances), the
//! `e2mgr.toml` configuration parser, and the message bus contract used
//! to talk to termination instances and downstream consumers.

pub mod config;
pub mod message;
pub mod types;

pub use config::{Config, ConfigError};
pub use message::{
    ChannelSender, Message, MessageDirection, MessageSender, MessagingError, ResourceStatusPayload,
    message_type,
};
pub use types::*;
