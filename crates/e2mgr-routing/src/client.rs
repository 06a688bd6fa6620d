//! The routing contract consumed by the managers.

use std::future::Future;
use std::pin::Pin;

use crate::error::RoutingError;

/// Boxed future returned by every [`RoutingClient`] call.
pub type RoutingFuture<'a> = Pin<Box<dyn Future<Output = Result<(), RoutingError>> + Send + 'a>>;

/// Tells the routing manager how RAN traffic maps onto E2T instances.
///
/// Injected into the managers as `Arc<dyn RoutingClient>` so tests can
/// swap in a recording double.
pub trait RoutingClient: Send + Sync {
    /// Register a new E2T instance.
    fn add_instance<'a>(&'a self, address: &'a str) -> RoutingFuture<'a>;

    /// Route `ran_name` through the instance at `address`.
    fn associate<'a>(&'a self, address: &'a str, ran_name: &'a str) -> RoutingFuture<'a>;

    /// Stop routing `ran_name` through the instance at `address`.
    fn dissociate<'a>(&'a self, address: &'a str, ran_name: &'a str) -> RoutingFuture<'a>;

    /// Delete an instance together with the routes of `ran_names`.
    fn delete_instance<'a>(&'a self, address: &'a str, ran_names: &'a [String])
    -> RoutingFuture<'a>;
}
