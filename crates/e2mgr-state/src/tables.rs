//! redb table definitions for the persistence gateway.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain types).

use redb::TableDefinition;

pub type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// RAN records keyed by RAN name.
pub const RANS: JsonTable = TableDefinition::new("rans");

/// `NbIdentity` entries keyed by RAN name.
pub const RAN_IDENTITIES: JsonTable = TableDefinition::new("ran_identities");

/// E2T instance records keyed by address.
pub const E2T_INSTANCES: JsonTable = TableDefinition::new("e2t_instances");

/// Single-row table holding the E2T address index under [`E2T_ADDRESSES_KEY`].
pub const E2T_ADDRESSES: JsonTable = TableDefinition::new("e2t_addresses");

pub const E2T_ADDRESSES_KEY: &str = "addresses";
