//! Message bus contract.
//!
//! The manager talks to E2T instances and to downstream consumers through
//! an asynchronous, fire-and-forget bus. Only the envelope is defined
//! here; the wire encoding belongs to whichever transport implements
//! [`MessageSender`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

use crate::types::NodeType;

/// Numeric message types understood by the bus.
pub mod message_type {
    pub const RIC_X2_SETUP_REQ: i32 = 10060;
    pub const RIC_ENDC_X2_SETUP_REQ: i32 = 10360;
    pub const E2_TERM_KEEP_ALIVE_REQ: i32 = 1101;
    pub const RAN_CONNECTED: i32 = 1200;
    pub const RAN_RESTARTED: i32 = 1210;
    pub const RAN_RECONFIGURED: i32 = 1220;
}

/// A single message on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub msg_type: i32,
    /// Used as the transaction/meid key by the transport. Empty for broadcasts.
    pub ran_name: String,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(msg_type: i32, ran_name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            msg_type,
            ran_name: ran_name.into(),
            payload,
        }
    }

    /// Keep-alive probe broadcast to every E2T instance.
    pub fn keep_alive_request() -> Self {
        Self::new(message_type::E2_TERM_KEEP_ALIVE_REQ, "", Vec::new())
    }
}

/// Errors surfaced by a [`MessageSender`].
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("message bus closed")]
    Closed,

    #[error("send failed: {0}")]
    Send(String),

    #[error("failed to serialize payload: {0}")]
    Serialize(String),
}

/// Outbound side of the message bus.
pub trait MessageSender: Send + Sync {
    /// Send a message, logging it.
    fn send(&self, message: Message) -> Result<(), MessagingError>;

    /// Fire-and-forget send for high-frequency traffic. Failures are dropped.
    fn send_without_logs(&self, message: Message);
}

/// Direction tag carried in RAN status-change notifications.
///
/// Serialized as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageDirection {
    Unknown,
    RanToRic,
    RicToRan,
}

impl MessageDirection {
    pub fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::RanToRic => 1,
            Self::RicToRan => 2,
        }
    }
}

impl Serialize for MessageDirection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for MessageDirection {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match i32::deserialize(deserializer)? {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::RanToRic),
            2 => Ok(Self::RicToRan),
            other => Err(serde::de::Error::custom(format!(
                "unknown message direction {other}"
            ))),
        }
    }
}

/// Body of a RAN status-change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatusPayload {
    pub node_type: NodeType,
    pub message_direction: MessageDirection,
}

/// In-process bus backed by an unbounded tokio channel.
///
/// The host drains the receiving half and forwards to the real transport.
#[derive(Clone)]
pub struct ChannelSender {
    tx: mpsc::UnboundedSender<Message>,
}

impl ChannelSender {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl MessageSender for ChannelSender {
    fn send(&self, message: Message) -> Result<(), MessagingError> {
        info!(
            msg_type = message.msg_type,
            ran_name = %message.ran_name,
            payload_len = message.payload.len(),
            "sending message"
        );
        self.tx.send(message).map_err(|_| MessagingError::Closed)
    }

    fn send_without_logs(&self, message: Message) {
        let _ = self.tx.send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_payload_uses_numeric_codes() {
        let payload = ResourceStatusPayload {
            node_type: NodeType::Enb,
            message_direction: MessageDirection::RicToRan,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"nodeType":1,"messageDirection":2}"#);
    }

    #[test]
    fn unknown_direction_code_fails_to_parse() {
        let res: Result<ResourceStatusPayload, _> =
            serde_json::from_str(r#"{"nodeType":1,"messageDirection":7}"#);
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn channel_sender_delivers_in_order() {
        let (sender, mut rx) = ChannelSender::new();
        sender
            .send(Message::new(message_type::RAN_CONNECTED, "gnb-1", b"{}".to_vec()))
            .unwrap();
        sender.send_without_logs(Message::keep_alive_request());

        let first = rx.recv().await.unwrap();
        assert_eq!(first.msg_type, message_type::RAN_CONNECTED);
        assert_eq!(first.ran_name, "gnb-1");

        let second = rx.recv().await.unwrap();
        assert_eq!(second.msg_type, message_type::E2_TERM_KEEP_ALIVE_REQ);
        assert!(second.payload.is_empty());
    }

    #[test]
    fn channel_sender_reports_closed_bus() {
        let (sender, rx) = ChannelSender::new();
        drop(rx);
        let err = sender.send(Message::keep_alive_request()).unwrap_err();
        assert!(matches!(err, MessagingError::Closed));
        // Dropped silently.
        sender.send_without_logs(Message::keep_alive_request());
    }
}
