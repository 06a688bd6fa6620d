//! E2T instance pool — bookkeeping for every known termination instance.
//!
//! The pool is the set of `InstanceRecord`s plus the address index that
//! enumerates them. Every mutation is a read-modify-write against the
//! gateway, serialized by a single async mutex so concurrent callers in this
//! process never lose each other's updates.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use e2mgr_core::{InstanceRecord, InstanceState, now_nanos};
use e2mgr_state::{StateGateway, StateResult};

use crate::error::{ManagerError, ManagerResult};

pub struct E2tInstancesManager {
    state: Arc<dyn StateGateway>,
    /// Guards every read-modify-write of instance records and the index.
    lock: Mutex<()>,
}

impl E2tInstancesManager {
    pub fn new(state: Arc<dyn StateGateway>) -> Self {
        Self {
            state,
            lock: Mutex::new(()),
        }
    }

    /// Fetch one instance record.
    pub async fn get(&self, address: &str) -> ManagerResult<InstanceRecord> {
        self.fetch(address, false)
    }

    /// All instance records, in address-index order.
    pub async fn list(&self) -> ManagerResult<Vec<InstanceRecord>> {
        self.fetch_all(false)
    }

    /// Like [`list`](Self::list) but logs at debug level only.
    pub async fn list_quiet(&self) -> ManagerResult<Vec<InstanceRecord>> {
        self.fetch_all(true)
    }

    /// The address index. A never-written index reads as empty.
    pub async fn addresses(&self) -> ManagerResult<Vec<String>> {
        self.read_addresses().map_err(|e| {
            error!(error = %e, "failed to read e2t addresses");
            ManagerError::Persistence(e)
        })
    }

    /// Register a new `Active` instance and add it to the address index.
    pub async fn create(&self, address: &str, pod_name: &str) -> ManagerResult<()> {
        let _guard = self.lock.lock().await;

        let instance = InstanceRecord::new(address, pod_name);
        if let Err(e) = self.state.save_instance(&instance) {
            error!(%address, error = %e, "failed to save e2t instance");
            return Err(e.into());
        }

        let mut addresses = self.read_addresses().map_err(|e| {
            error!(%address, error = %e, "failed to read e2t addresses");
            ManagerError::Persistence(e)
        })?;
        if !addresses.iter().any(|a| a == address) {
            addresses.push(address.to_string());
        }
        if let Err(e) = self.state.save_instance_addresses(&addresses) {
            error!(%address, error = %e, "failed to save e2t addresses");
            return Err(e.into());
        }

        info!(%address, %pod_name, "e2t instance created");
        Ok(())
    }

    /// Delete an instance record and drop it from the address index.
    pub async fn remove(&self, address: &str) -> ManagerResult<()> {
        let _guard = self.lock.lock().await;

        if let Err(e) = self.state.remove_instance(address) {
            error!(%address, error = %e, "failed to remove e2t instance");
            return Err(e.into());
        }

        let mut addresses = self.read_addresses().map_err(|e| {
            error!(%address, error = %e, "failed to read e2t addresses");
            ManagerError::Persistence(e)
        })?;
        addresses.retain(|a| a != address);
        if let Err(e) = self.state.save_instance_addresses(&addresses) {
            error!(%address, error = %e, "failed to save e2t addresses");
            return Err(e.into());
        }

        info!(%address, "e2t instance removed");
        Ok(())
    }

    /// Pick the `Active` instance carrying the fewest RANs.
    ///
    /// Ties go to the instance listed first. Always reads fresh state.
    pub async fn select(&self) -> ManagerResult<String> {
        let instances = self.list().await?;
        if instances.is_empty() {
            error!("no e2t instance registered");
            return Err(ManagerError::NoInstanceAvailable);
        }

        let selected = instances
            .iter()
            .filter(|i| i.state == InstanceState::Active)
            .min_by_key(|i| i.associated_ran_list.len());

        match selected {
            Some(instance) => {
                info!(
                    address = %instance.address,
                    ran_count = instance.associated_ran_list.len(),
                    "e2t instance selected"
                );
                Ok(instance.address.clone())
            }
            None => {
                error!(count = instances.len(), "no active e2t instance");
                Err(ManagerError::NoInstanceAvailable)
            }
        }
    }

    /// Append RANs to an instance's association list.
    ///
    /// An instance being deleted takes no new RANs.
    pub async fn add_rans(&self, address: &str, ran_names: &[String]) -> ManagerResult<()> {
        let _guard = self.lock.lock().await;

        let mut instance = self.fetch(address, false)?;
        if instance.state == InstanceState::ToBeDeleted {
            warn!(%address, rans = ?ran_names, "e2t instance is being deleted, not adding rans");
            return Err(ManagerError::InvalidState {
                address: address.to_string(),
                expected: InstanceState::Active,
                actual: instance.state,
            });
        }
        instance.associated_ran_list.extend_from_slice(ran_names);
        if let Err(e) = self.state.save_instance(&instance) {
            error!(%address, error = %e, "failed to save e2t instance");
            return Err(e.into());
        }

        info!(%address, rans = ?ran_names, "rans added to e2t instance");
        Ok(())
    }

    /// Drop a RAN from an instance's association list. Idempotent.
    pub async fn remove_ran(&self, ran_name: &str, address: &str) -> ManagerResult<()> {
        let _guard = self.lock.lock().await;

        let mut instance = self.fetch(address, false)?;
        instance.associated_ran_list.retain(|r| r != ran_name);
        if let Err(e) = self.state.save_instance(&instance) {
            error!(%address, %ran_name, error = %e, "failed to save e2t instance");
            return Err(e.into());
        }

        info!(%address, %ran_name, "ran removed from e2t instance");
        Ok(())
    }

    /// Record a keep-alive response. Ignored for instances being deleted.
    pub async fn reset_keep_alive(&self, address: &str) -> ManagerResult<()> {
        let _guard = self.lock.lock().await;

        let mut instance = self.fetch(address, true)?;
        if instance.state == InstanceState::ToBeDeleted {
            warn!(%address, "keep-alive from e2t instance being deleted, ignoring");
            return Ok(());
        }

        instance.keep_alive_timestamp = now_nanos();
        if let Err(e) = self.state.save_instance(&instance) {
            error!(%address, error = %e, "failed to save e2t instance");
            return Err(e.into());
        }

        debug!(%address, "keep-alive timestamp reset");
        Ok(())
    }

    /// Stamp every `Active` instance as alive now.
    ///
    /// Used after a manager restart so instances are not declared dead for
    /// the time the manager itself was down.
    pub async fn reset_keep_alive_for_all(&self) {
        let _guard = self.lock.lock().await;

        let instances = match self.fetch_all(true) {
            Ok(instances) => instances,
            Err(e) => {
                error!(error = %e, "failed to list e2t instances for keep-alive reset");
                return;
            }
        };

        let now = now_nanos();
        for mut instance in instances {
            if instance.state != InstanceState::Active {
                continue;
            }
            instance.keep_alive_timestamp = now;
            if let Err(e) = self.state.save_instance(&instance) {
                error!(address = %instance.address, error = %e, "failed to reset keep-alive");
            }
        }

        info!("keep-alive timestamps reset for all active e2t instances");
    }

    /// Move an instance from `expected` to `next`.
    ///
    /// Fails with [`ManagerError::InvalidState`] when the stored state is not
    /// `expected`. Entering `Active` restarts the keep-alive clock.
    pub async fn set_state(
        &self,
        address: &str,
        expected: InstanceState,
        next: InstanceState,
    ) -> ManagerResult<()> {
        let _guard = self.lock.lock().await;

        let mut instance = self.fetch(address, false)?;
        if instance.state != expected {
            error!(
                %address,
                %expected,
                actual = %instance.state,
                "unexpected e2t instance state"
            );
            return Err(ManagerError::InvalidState {
                address: address.to_string(),
                expected,
                actual: instance.state,
            });
        }

        instance.state = next;
        if next == InstanceState::Active {
            instance.keep_alive_timestamp = now_nanos();
        }
        if let Err(e) = self.state.save_instance(&instance) {
            error!(%address, error = %e, "failed to save e2t instance");
            return Err(e.into());
        }

        info!(%address, from = %expected, to = %next, "e2t instance state changed");
        Ok(())
    }

    /// Mark an instance `ToBeDeleted` and stamp when its deletion began.
    ///
    /// Returns the record as written, so its RAN list holds every RAN added
    /// before the mark.
    pub async fn begin_deletion(&self, address: &str) -> ManagerResult<InstanceRecord> {
        let _guard = self.lock.lock().await;

        let mut instance = self.fetch(address, false)?;
        let previous = instance.state;
        instance.state = InstanceState::ToBeDeleted;
        instance.deletion_timestamp = now_nanos();
        if let Err(e) = self.state.save_instance(&instance) {
            error!(%address, error = %e, "failed to mark e2t instance for deletion");
            return Err(e.into());
        }

        info!(%address, from = %previous, "e2t instance marked for deletion");
        Ok(instance)
    }

    /// Empty the association list of every instance.
    pub async fn clear_all_associations(&self) -> ManagerResult<()> {
        let _guard = self.lock.lock().await;

        let instances = self.fetch_all(false)?;
        for mut instance in instances {
            instance.associated_ran_list.clear();
            if let Err(e) = self.state.save_instance(&instance) {
                error!(address = %instance.address, error = %e, "failed to clear associations");
            }
        }

        info!("associations cleared for all e2t instances");
        Ok(())
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn fetch(&self, address: &str, quiet: bool) -> ManagerResult<InstanceRecord> {
        match self.state.get_instance(address) {
            Ok(instance) => Ok(instance),
            Err(e) if e.is_not_found() => {
                if quiet {
                    debug!(%address, "e2t instance not found");
                } else {
                    info!(%address, "e2t instance not found");
                }
                Err(e.into())
            }
            Err(e) => {
                error!(%address, error = %e, "failed to read e2t instance");
                Err(e.into())
            }
        }
    }

    fn fetch_all(&self, quiet: bool) -> ManagerResult<Vec<InstanceRecord>> {
        let addresses = self.read_addresses().map_err(|e| {
            error!(error = %e, "failed to read e2t addresses");
            ManagerError::Persistence(e)
        })?;

        if addresses.is_empty() {
            if quiet {
                debug!("no e2t addresses");
            } else {
                info!("no e2t addresses");
            }
            return Ok(Vec::new());
        }

        let instances = self.state.get_instances(&addresses).map_err(|e| {
            error!(?addresses, error = %e, "failed to read e2t instances");
            ManagerError::Persistence(e)
        })?;

        if instances.is_empty() {
            warn!(?addresses, "address index lists e2t instances with no record");
        }
        Ok(instances)
    }

    /// The address index, with a missing index read as empty.
    fn read_addresses(&self) -> StateResult<Vec<String>> {
        match self.state.get_instance_addresses() {
            Ok(addresses) => Ok(addresses),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}
