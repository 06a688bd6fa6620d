//! RAN status-change notifications for downstream consumers.

use std::sync::Arc;

use tracing::error;

use e2mgr_core::{
    Message, MessageDirection, MessageSender, MessagingError, RanRecord, ResourceStatusPayload,
};

use crate::error::ManagerResult;

pub struct RanStatusChangeManager {
    sender: Arc<dyn MessageSender>,
}

impl RanStatusChangeManager {
    pub fn new(sender: Arc<dyn MessageSender>) -> Self {
        Self { sender }
    }

    /// Publish a status change of `ran` as message `msg_type`.
    pub fn notify(
        &self,
        msg_type: i32,
        direction: MessageDirection,
        ran: &RanRecord,
    ) -> ManagerResult<()> {
        let payload = ResourceStatusPayload {
            node_type: ran.node_type,
            message_direction: direction,
        };
        let body = serde_json::to_vec(&payload).map_err(|e| {
            error!(ran_name = %ran.ran_name, error = %e, "failed to serialize status change");
            MessagingError::Serialize(e.to_string())
        })?;

        self.sender
            .send(Message::new(msg_type, ran.ran_name.clone(), body))
            .map_err(|e| {
                error!(ran_name = %ran.ran_name, msg_type, error = %e, "failed to send status change");
                e.into()
            })
    }
}
