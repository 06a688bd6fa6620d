//! e2mgr-routing — client for the external routing manager.
//!
//! The routing manager must be told which E2T instance carries each RAN's
//! traffic. This crate defines the [`RoutingClient`] contract the managers
//! depend on and an HTTP/1.1 implementation of it.
//!
//! # Architecture
//!
//! ```text
//! RoutingClient (trait, boxed futures)
//!   └── HttpRoutingClient
//!       ├── JSON bodies (models)
//!       └── hyper http1 connection per call, 2xx = success
//! ```

pub mod client;
pub mod error;
pub mod http_client;
pub mod models;

pub use client::{RoutingClient, RoutingFuture};
pub use error::RoutingError;
pub use http_client::HttpRoutingClient;
