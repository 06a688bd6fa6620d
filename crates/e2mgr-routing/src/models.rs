//! JSON request bodies understood by the routing manager.

use serde::{Deserialize, Serialize};

/// An E2T address with (optionally) the RANs it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct E2tData {
    #[serde(rename = "E2TAddress")]
    pub e2t_address: String,
    #[serde(
        rename = "ranNamelist",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub ran_name_list: Vec<String>,
}

impl E2tData {
    pub fn new(e2t_address: &str, ran_names: &[&str]) -> Self {
        Self {
            e2t_address: e2t_address.to_string(),
            ran_name_list: ran_names.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Body of the instance deletion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteInstanceRequest {
    #[serde(rename = "E2TAddress")]
    pub e2t_address: String,
    #[serde(rename = "ranNamelistTobeDissociated")]
    pub rans_to_be_dissociated: Vec<String>,
    /// Reassignments to other instances. Always empty: RANs are not moved on deletion.
    #[serde(rename = "ranAssocList")]
    pub ran_assoc_list: Vec<E2tData>,
}
