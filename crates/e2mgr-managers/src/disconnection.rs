//! RAN disconnection — connection-status transitions on a lost RAN link.

use std::sync::Arc;

use tracing::{error, info};

use e2mgr_core::ConnectionStatus;
use e2mgr_state::StateGateway;

use crate::association::E2tAssociationManager;
use crate::error::{ManagerError, ManagerResult};

pub struct RanDisconnectionManager {
    state: Arc<dyn StateGateway>,
    association: Arc<E2tAssociationManager>,
}

impl RanDisconnectionManager {
    pub fn new(state: Arc<dyn StateGateway>, association: Arc<E2tAssociationManager>) -> Self {
        Self { state, association }
    }

    /// Handle the loss of `ran_name`'s connection.
    ///
    /// `ShutDown` is terminal. A RAN that was `ShuttingDown` becomes
    /// `ShutDown` and keeps its association record. Anything else becomes
    /// `Disconnected` and is dissociated from its instance.
    pub async fn disconnect(&self, ran_name: &str) -> ManagerResult<()> {
        let mut ran = self.state.get_ran(ran_name).map_err(|e| {
            error!(%ran_name, error = %e, "failed to read ran for disconnection");
            ManagerError::Persistence(e)
        })?;

        match ran.connection_status {
            ConnectionStatus::ShutDown => {
                info!(%ran_name, "ran already shut down");
                return Ok(());
            }
            ConnectionStatus::ShuttingDown => {
                ran.connection_status = ConnectionStatus::ShutDown;
                if let Err(e) = self.state.update_ran(&ran) {
                    error!(%ran_name, error = %e, "failed to mark ran shut down");
                    return Err(e.into());
                }
                info!(%ran_name, "ran shut down");
                return Ok(());
            }
            _ => {}
        }

        let previous = ran.connection_status;
        ran.connection_status = ConnectionStatus::Disconnected;
        if let Err(e) = self.state.update_ran(&ran) {
            error!(%ran_name, error = %e, "failed to mark ran disconnected");
            return Err(e.into());
        }
        info!(%ran_name, from = %previous, "ran disconnected");

        match ran.associated_e2t_address.as_deref() {
            Some(address) => self.association.dissociate(address, ran_name).await,
            None => {
                info!(%ran_name, "ran has no e2t instance, nothing to dissociate");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instances::E2tInstancesManager;
    use crate::testing::{FaultyGateway, RecordingRoutingClient, RoutingCall};
    use e2mgr_core::{InstanceRecord, RanRecord};

    const ADDRESS: &str = "10.0.0.1:38000";

    struct Fixture {
        gw: Arc<FaultyGateway>,
        routing: Arc<RecordingRoutingClient>,
        instances: Arc<E2tInstancesManager>,
        mgr: RanDisconnectionManager,
    }

    fn fixture() -> Fixture {
        let gw = Arc::new(FaultyGateway::new());
        let routing = Arc::new(RecordingRoutingClient::default());
        let instances = Arc::new(E2tInstancesManager::new(gw.clone()));
        let association = Arc::new(E2tAssociationManager::new(
            gw.clone(),
            instances.clone(),
            routing.clone(),
        ));
        let mgr = RanDisconnectionManager::new(gw.clone(), association);
        Fixture {
            gw,
            routing,
            instances,
            mgr,
        }
    }

    fn seed(gw: &FaultyGateway, status: ConnectionStatus, address: Option<&str>) {
        let mut ran = RanRecord::new("gnb-1", "10.1.1.1", 36422);
        ran.connection_status = status;
        ran.associated_e2t_address = address.map(str::to_string);
        gw.store.save_ran(&ran.identity(), &ran).unwrap();

        let mut inst = InstanceRecord::new(ADDRESS, "pod-a");
        inst.associated_ran_list = vec!["gnb-1".to_string()];
        gw.store.save_instance(&inst).unwrap();
        gw.store
            .save_instance_addresses(&[ADDRESS.to_string()])
            .unwrap();
    }

    #[tokio::test]
    async fn connected_ran_is_disconnected_and_dissociated() {
        let f = fixture();
        seed(&f.gw, ConnectionStatus::Connected, Some(ADDRESS));

        f.mgr.disconnect("gnb-1").await.unwrap();

        let ran = f.gw.store.get_ran("gnb-1").unwrap();
        assert_eq!(ran.connection_status, ConnectionStatus::Disconnected);
        assert_eq!(ran.associated_e2t_address, None);
        assert!(
            f.instances
                .get(ADDRESS)
                .await
                .unwrap()
                .associated_ran_list
                .is_empty()
        );
        assert_eq!(
            f.routing.calls(),
            vec![RoutingCall::Dissociate(ADDRESS.to_string(), "gnb-1".to_string())]
        );
    }

    #[tokio::test]
    async fn shutting_down_ran_becomes_shut_down_without_dissociation() {
        let f = fixture();
        seed(&f.gw, ConnectionStatus::ShuttingDown, Some(ADDRESS));

        f.mgr.disconnect("gnb-1").await.unwrap();

        let ran = f.gw.store.get_ran("gnb-1").unwrap();
        assert_eq!(ran.connection_status, ConnectionStatus::ShutDown);
        assert_eq!(ran.associated_e2t_address.as_deref(), Some(ADDRESS));
        assert!(f.routing.calls().is_empty());
    }

    #[tokio::test]
    async fn shut_down_ran_is_left_alone() {
        let f = fixture();
        seed(&f.gw, ConnectionStatus::ShutDown, Some(ADDRESS));
        f.gw.fail("update_ran");

        f.mgr.disconnect("gnb-1").await.unwrap();
        assert!(f.routing.calls().is_empty());
    }

    #[tokio::test]
    async fn ran_without_instance_skips_dissociation() {
        let f = fixture();
        seed(&f.gw, ConnectionStatus::Connecting, None);

        f.mgr.disconnect("gnb-1").await.unwrap();

        assert_eq!(
            f.gw.store.get_ran("gnb-1").unwrap().connection_status,
            ConnectionStatus::Disconnected
        );
        assert!(f.routing.calls().is_empty());
    }

    #[tokio::test]
    async fn persist_failure_aborts_before_dissociation() {
        let f = fixture();
        seed(&f.gw, ConnectionStatus::Connected, Some(ADDRESS));
        f.gw.fail("update_ran");

        let err = f.mgr.disconnect("gnb-1").await.unwrap_err();
        assert!(matches!(err, ManagerError::Persistence(_)));
        assert!(f.routing.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_ran_is_not_found() {
        let f = fixture();
        let err = f.mgr.disconnect("ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
