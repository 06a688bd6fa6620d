//! The persistence contract consumed by the managers.

use e2mgr_core::{InstanceRecord, NbIdentity, RanRecord};

use crate::error::StateResult;

/// Key-value style store for RAN and E2T instance records.
///
/// Implementations are called from many tasks concurrently and offer no
/// compare-and-swap; callers serialize their own read-modify-write cycles.
pub trait StateGateway: Send + Sync {
    /// Fetch a RAN by name. `NotFound` if it was never saved.
    fn get_ran(&self, ran_name: &str) -> StateResult<RanRecord>;

    /// Store a new RAN together with its inventory identity.
    fn save_ran(&self, identity: &NbIdentity, ran: &RanRecord) -> StateResult<()>;

    /// Overwrite an existing RAN record.
    fn update_ran(&self, ran: &RanRecord) -> StateResult<()>;

    /// Fetch an E2T instance by address. `NotFound` if absent.
    fn get_instance(&self, address: &str) -> StateResult<InstanceRecord>;

    /// Fetch several instances at once. Addresses with no record are skipped.
    fn get_instances(&self, addresses: &[String]) -> StateResult<Vec<InstanceRecord>>;

    fn save_instance(&self, instance: &InstanceRecord) -> StateResult<()>;

    /// Delete an instance record. Deleting an absent record succeeds.
    fn remove_instance(&self, address: &str) -> StateResult<()>;

    /// The E2T address index. `NotFound` if it was never written.
    fn get_instance_addresses(&self) -> StateResult<Vec<String>>;

    fn save_instance_addresses(&self, addresses: &[String]) -> StateResult<()>;
}
