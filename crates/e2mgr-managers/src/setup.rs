//! RAN setup — starts the setup handshake toward a newly connected RAN.

use std::sync::Arc;

use tracing::{error, info};

use e2mgr_core::{
    ConnectionStatus, E2ApplicationProtocol, Message, MessageSender, RanRecord, message_type,
};
use e2mgr_state::StateGateway;

use crate::error::{ManagerError, ManagerResult};

/// Pre-packed setup request bodies, one per supported protocol.
#[derive(Debug, Clone, Default)]
pub struct SetupRequestPayloads {
    pub x2: Vec<u8>,
    pub endc_x2: Vec<u8>,
}

pub struct RanSetupManager {
    state: Arc<dyn StateGateway>,
    sender: Arc<dyn MessageSender>,
    payloads: SetupRequestPayloads,
}

impl RanSetupManager {
    pub fn new(
        state: Arc<dyn StateGateway>,
        sender: Arc<dyn MessageSender>,
        payloads: SetupRequestPayloads,
    ) -> Self {
        Self {
            state,
            sender,
            payloads,
        }
    }

    /// Persist `target_status` for `ran` and send it a setup request.
    ///
    /// If the request cannot be sent the RAN is demoted to `Disconnected`.
    pub async fn execute_setup(
        &self,
        ran: &mut RanRecord,
        target_status: ConnectionStatus,
    ) -> ManagerResult<()> {
        let ran_name = ran.ran_name.clone();

        ran.connection_status = target_status;
        if let Err(e) = self.state.update_ran(ran) {
            error!(%ran_name, status = %target_status, error = %e, "failed to save ran before setup");
            return Err(e.into());
        }

        let message = self.setup_request(ran)?;
        let msg_type = message.msg_type;

        if let Err(e) = self.sender.send(message) {
            error!(%ran_name, msg_type, error = %e, "failed to send setup request");
            ran.connection_status = ConnectionStatus::Disconnected;
            if let Err(e) = self.state.update_ran(ran) {
                error!(%ran_name, error = %e, "failed to save ran after setup send failure");
                return Err(e.into());
            }
            return Err(ManagerError::Messaging(e));
        }

        info!(%ran_name, msg_type, status = %target_status, "setup request sent");
        Ok(())
    }

    fn setup_request(&self, ran: &RanRecord) -> ManagerResult<Message> {
        let (msg_type, payload) = match ran.protocol {
            E2ApplicationProtocol::X2SetupRequest => {
                (message_type::RIC_X2_SETUP_REQ, &self.payloads.x2)
            }
            E2ApplicationProtocol::EndcX2SetupRequest => {
                (message_type::RIC_ENDC_X2_SETUP_REQ, &self.payloads.endc_x2)
            }
            other => {
                error!(ran_name = %ran.ran_name, protocol = ?other, "unsupported setup protocol");
                return Err(ManagerError::Internal(format!(
                    "unsupported setup protocol {other:?} for ran {}",
                    ran.ran_name
                )));
            }
        };

        Ok(Message::new(msg_type, ran.ran_name.clone(), frame(ran, payload)))
    }
}

/// `ip|port|ran_name|len|` followed by the raw payload.
fn frame(ran: &RanRecord, payload: &[u8]) -> Vec<u8> {
    let header = format!("{}|{}|{}|{}|", ran.ip, ran.port, ran.ran_name, payload.len());
    let mut framed = Vec::with_capacity(header.len() + payload.len());
    framed.extend_from_slice(header.as_bytes());
    framed.extend_from_slice(payload);
    framed
}
