//! Domain types for the E2 manager.
//!
//! These types represent the persisted state of RANs and E2T instances.
//! All types are serializable to/from JSON for storage in redb tables.

use serde::{Deserialize, Serialize};

/// RAN inventory name.
pub type RanName = String;

/// Network address (`host:port`) of an E2T instance.
pub type E2tAddress = String;

// ── RAN ───────────────────────────────────────────────────────────

/// Connection status of a RAN as tracked by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Connecting,
    Connected,
    Disconnected,
    ShuttingDown,
    ShutDown,
    ConnectedSetupFailed,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unknown => "UNKNOWN_CONNECTION_STATUS",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
            Self::Disconnected => "DISCONNECTED",
            Self::ShuttingDown => "SHUTTING_DOWN",
            Self::ShutDown => "SHUT_DOWN",
            Self::ConnectedSetupFailed => "CONNECTED_SETUP_FAILED",
        };
        f.write_str(s)
    }
}

/// Kind of radio node.
///
/// Serialized as its numeric code; the status-change notification relies
/// on that encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeType {
    #[default]
    Unknown,
    Enb,
    Gnb,
}

impl NodeType {
    pub fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Enb => 1,
            Self::Gnb => 2,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Enb,
            2 => Self::Gnb,
            _ => Self::Unknown,
        }
    }
}

impl Serialize for NodeType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for NodeType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i32::deserialize(deserializer).map(Self::from_code)
    }
}

/// Setup procedure a RAN speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum E2ApplicationProtocol {
    #[default]
    Unknown,
    X2SetupRequest,
    EndcX2SetupRequest,
}

/// Global identity of a RAN (PLMN + node id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalNodebId {
    pub plmn_id: String,
    pub nb_id: String,
}

/// Identity under which a RAN is indexed in the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NbIdentity {
    pub inventory_name: RanName,
    pub global_nb_id: Option<GlobalNodebId>,
}

/// Persisted record of a single RAN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RanRecord {
    pub ran_name: RanName,
    pub ip: String,
    pub port: u16,
    pub connection_status: ConnectionStatus,
    /// Address of the E2T instance this RAN is routed through.
    pub associated_e2t_address: Option<E2tAddress>,
    pub global_nb_id: Option<GlobalNodebId>,
    pub node_type: NodeType,
    pub protocol: E2ApplicationProtocol,
    pub failure_cause: Option<String>,
}

impl RanRecord {
    /// A fresh record with no association and unknown status.
    pub fn new(ran_name: impl Into<RanName>, ip: impl Into<String>, port: u16) -> Self {
        Self {
            ran_name: ran_name.into(),
            ip: ip.into(),
            port,
            connection_status: ConnectionStatus::Unknown,
            associated_e2t_address: None,
            global_nb_id: None,
            node_type: NodeType::Unknown,
            protocol: E2ApplicationProtocol::Unknown,
            failure_cause: None,
        }
    }

    pub fn identity(&self) -> NbIdentity {
        NbIdentity {
            inventory_name: self.ran_name.clone(),
            global_nb_id: self.global_nb_id.clone(),
        }
    }
}

// ── E2T instance ──────────────────────────────────────────────────

/// Lifecycle state of an E2T instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceState {
    Active,
    ToBeDeleted,
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("ACTIVE"),
            Self::ToBeDeleted => f.write_str("TO_BE_DELETED"),
        }
    }
}

/// Persisted record of an E2T instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub address: E2tAddress,
    pub pod_name: String,
    pub state: InstanceState,
    /// RANs routed through this instance, in association order.
    pub associated_ran_list: Vec<RanName>,
    /// Unix timestamp (nanoseconds) of the last keep-alive response.
    pub keep_alive_timestamp: i64,
    /// Unix timestamp (nanoseconds) when deletion started; 0 if never.
    pub deletion_timestamp: i64,
}

impl InstanceRecord {
    /// A new `Active` instance with a fresh keep-alive stamp.
    pub fn new(address: impl Into<E2tAddress>, pod_name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            pod_name: pod_name.into(),
            state: InstanceState::Active,
            associated_ran_list: Vec::new(),
            keep_alive_timestamp: now_nanos(),
            deletion_timestamp: 0,
        }
    }
}

/// Wall clock as unix nanoseconds.
pub fn now_nanos() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
