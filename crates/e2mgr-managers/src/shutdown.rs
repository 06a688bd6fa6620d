//! Cascading shutdown of a dead E2T instance.
//!
//! Shutting down marks the instance `ToBeDeleted`, disconnects every RAN
//! routed through it and finally removes it from the pool and the routing
//! manager. A shutdown that is already in progress is left alone until the
//! deletion timeout has passed, after which it may be retried.
//!
//! The stored record is authoritative. Marking happens under the pool lock,
//! so a RAN associated before the mark is in the list that gets
//! disconnected, and one associated after it is refused by the pool.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use e2mgr_core::{ConnectionStatus, InstanceRecord, InstanceState, now_nanos};
use e2mgr_state::StateGateway;

use crate::association::E2tAssociationManager;
use crate::error::{ManagerError, ManagerResult};
use crate::instances::E2tInstancesManager;

pub struct E2tShutdownManager {
    state: Arc<dyn StateGateway>,
    instances: Arc<E2tInstancesManager>,
    association: Arc<E2tAssociationManager>,
    /// Grace window for an in-progress deletion.
    deletion_timeout: Duration,
    /// One shutdown at a time.
    lock: Mutex<()>,
}

impl E2tShutdownManager {
    pub fn new(
        state: Arc<dyn StateGateway>,
        instances: Arc<E2tInstancesManager>,
        association: Arc<E2tAssociationManager>,
        deletion_timeout: Duration,
    ) -> Self {
        Self {
            state,
            instances,
            association,
            deletion_timeout,
            lock: Mutex::new(()),
        }
    }

    /// Shut down `instance` and every association it carries.
    ///
    /// Only the address of `instance` is used. State, deletion stamp and
    /// RAN list are read fresh from the pool, and an instance that is
    /// already gone is not an error.
    pub async fn shutdown(&self, instance: &InstanceRecord) -> ManagerResult<()> {
        let _guard = self.lock.lock().await;
        let address = instance.address.as_str();

        info!(%address, pod_name = %instance.pod_name, "shutting down e2t instance");

        let current = match self.instances.get(address).await {
            Ok(current) => current,
            Err(e) if e.is_not_found() => {
                info!(%address, "e2t instance already removed");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if self.deletion_in_progress(&current) {
            info!(%address, "e2t instance already being deleted");
            return Ok(());
        }

        let marked = self.instances.begin_deletion(address).await?;

        self.disconnect_rans(&marked)?;

        self.association.remove_instance(&marked).await?;

        info!(
            %address,
            ran_count = marked.associated_ran_list.len(),
            "e2t instance shut down"
        );
        Ok(())
    }

    fn deletion_in_progress(&self, instance: &InstanceRecord) -> bool {
        if instance.state != InstanceState::ToBeDeleted {
            return false;
        }
        let elapsed = now_nanos().saturating_sub(instance.deletion_timestamp);
        elapsed <= i64::try_from(self.deletion_timeout.as_nanos()).unwrap_or(i64::MAX)
    }

    /// Clear the association of every RAN the instance carried.
    ///
    /// A RAN with no record is skipped. RANs that are themselves shutting
    /// down keep their state; the disconnection flow finishes them.
    fn disconnect_rans(&self, instance: &InstanceRecord) -> ManagerResult<()> {
        let address = &instance.address;

        for ran_name in &instance.associated_ran_list {
            let mut ran = match self.state.get_ran(ran_name) {
                Ok(ran) => ran,
                Err(e) if e.is_not_found() => {
                    warn!(%address, %ran_name, "ran not found during e2t shutdown, skipping");
                    continue;
                }
                Err(e) => {
                    error!(%address, %ran_name, error = %e, "failed to read ran during e2t shutdown");
                    return Err(ManagerError::Persistence(e));
                }
            };

            if ran.connection_status == ConnectionStatus::ShuttingDown {
                info!(%address, %ran_name, "ran is shutting down, leaving it as is");
                continue;
            }

            ran.associated_e2t_address = None;
            ran.connection_status = ConnectionStatus::Disconnected;
            if let Err(e) = self.state.update_ran(&ran) {
                error!(%address, %ran_name, error = %e, "failed to disconnect ran during e2t shutdown");
                return Err(e.into());
            }
        }

        Ok(())
    }
}
