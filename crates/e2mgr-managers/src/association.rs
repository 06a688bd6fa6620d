//! RAN ↔ E2T association.
//!
//! An association is recorded in three places: the RAN record, the
//! instance's RAN list and the routing manager. The updates are separate
//! calls, so each operation decides per step whether a failure is fatal.

use std::sync::Arc;

use tracing::{error, info, warn};

use e2mgr_core::{ConnectionStatus, InstanceRecord, RanRecord};
use e2mgr_routing::RoutingClient;
use e2mgr_state::StateGateway;

use crate::error::{ManagerError, ManagerResult};
use crate::instances::E2tInstancesManager;

pub struct E2tAssociationManager {
    state: Arc<dyn StateGateway>,
    instances: Arc<E2tInstancesManager>,
    routing: Arc<dyn RoutingClient>,
}

impl E2tAssociationManager {
    pub fn new(
        state: Arc<dyn StateGateway>,
        instances: Arc<E2tInstancesManager>,
        routing: Arc<dyn RoutingClient>,
    ) -> Self {
        Self {
            state,
            instances,
            routing,
        }
    }

    /// Route `ran` through the instance at `address`.
    ///
    /// The RAN record is persisted whatever the routing manager answers:
    /// `Connected` with the address on success, `Disconnected` otherwise.
    /// If the instance then refuses the RAN, because it is gone or being
    /// deleted, the RAN is written back as `Disconnected` with no address.
    /// `ran` is updated in place to match what was written.
    pub async fn associate(&self, address: &str, ran: &mut RanRecord) -> ManagerResult<()> {
        let ran_name = ran.ran_name.clone();
        let routed = self.routing.associate(address, &ran_name).await;

        match &routed {
            Ok(()) => {
                ran.connection_status = ConnectionStatus::Connected;
                ran.associated_e2t_address = Some(address.to_string());
            }
            Err(e) => {
                error!(%address, %ran_name, error = %e, "routing manager rejected association");
                ran.connection_status = ConnectionStatus::Disconnected;
            }
        }

        if let Err(e) = self.state.update_ran(ran) {
            error!(%address, %ran_name, error = %e, "failed to save ran after association");
            return Err(e.into());
        }

        if let Err(e) = routed {
            return Err(ManagerError::RoutingService(e));
        }

        if let Err(e) = self
            .instances
            .add_rans(address, std::slice::from_ref(&ran_name))
            .await
        {
            // Never leave the RAN pointing at an instance that did not take it.
            ran.connection_status = ConnectionStatus::Disconnected;
            ran.associated_e2t_address = None;
            if let Err(undo) = self.state.update_ran(ran) {
                error!(%address, %ran_name, error = %undo, "failed to revert ran association");
            }
            return Err(e);
        }

        info!(%address, %ran_name, "ran associated with e2t instance");
        Ok(())
    }

    /// Undo the association of `ran_name` with the instance at `address`.
    ///
    /// The routing call is best effort: once the RAN record and the
    /// instance list are updated, a routing failure is only logged.
    pub async fn dissociate(&self, address: &str, ran_name: &str) -> ManagerResult<()> {
        let mut ran = self.state.get_ran(ran_name).map_err(|e| {
            error!(%address, %ran_name, error = %e, "failed to read ran for dissociation");
            ManagerError::Persistence(e)
        })?;

        ran.associated_e2t_address = None;
        if let Err(e) = self.state.update_ran(&ran) {
            error!(%address, %ran_name, error = %e, "failed to save ran after dissociation");
            return Err(e.into());
        }

        self.instances.remove_ran(ran_name, address).await?;

        if let Err(e) = self.routing.dissociate(address, ran_name).await {
            warn!(%address, %ran_name, error = %e, "routing manager dissociation failed, ignoring");
        }

        info!(%address, %ran_name, "ran dissociated from e2t instance");
        Ok(())
    }

    /// Tear down an instance: drop its routes, then its pool record.
    pub async fn remove_instance(&self, instance: &InstanceRecord) -> ManagerResult<()> {
        let address = &instance.address;

        if let Err(e) = self
            .routing
            .delete_instance(address, &instance.associated_ran_list)
            .await
        {
            warn!(%address, error = %e, "routing manager instance deletion failed, ignoring");
        }

        self.instances.remove(address).await?;

        info!(%address, "e2t instance removed");
        Ok(())
    }
}
