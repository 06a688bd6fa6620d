//! StateStore — redb-backed persistence for the E2 manager.
//!
//! All values are JSON-serialized into redb's `&[u8]` value columns. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing).

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use e2mgr_core::{InstanceRecord, NbIdentity, RanRecord};

use crate::error::{StateError, StateResult};
use crate::gateway::StateGateway;
use crate::tables::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(RANS).map_err(map_err!(Table))?;
        txn.open_table(RAN_IDENTITIES).map_err(map_err!(Table))?;
        txn.open_table(E2T_INSTANCES).map_err(map_err!(Table))?;
        txn.open_table(E2T_ADDRESSES).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, table: JsonTable, key: &str) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let value: T =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, table: JsonTable, key: &str, value: &T) -> StateResult<()> {
        let bytes = serde_json::to_vec(value).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(table).map_err(map_err!(Table))?;
            table
                .insert(key, bytes.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

}

impl StateGateway for StateStore {
    fn get_ran(&self, ran_name: &str) -> StateResult<RanRecord> {
        self.get_json(RANS, ran_name)?
            .ok_or_else(|| StateError::NotFound(format!("ran {ran_name}")))
    }

    fn save_ran(&self, identity: &NbIdentity, ran: &RanRecord) -> StateResult<()> {
        let ran_bytes = serde_json::to_vec(ran).map_err(map_err!(Serialize))?;
        let id_bytes = serde_json::to_vec(identity).map_err(map_err!(Serialize))?;
        // Record and identity land in one transaction.
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut rans = txn.open_table(RANS).map_err(map_err!(Table))?;
            rans.insert(ran.ran_name.as_str(), ran_bytes.as_slice())
                .map_err(map_err!(Write))?;
            let mut ids = txn.open_table(RAN_IDENTITIES).map_err(map_err!(Table))?;
            ids.insert(identity.inventory_name.as_str(), id_bytes.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(ran_name = %ran.ran_name, "ran saved");
        Ok(())
    }

    fn update_ran(&self, ran: &RanRecord) -> StateResult<()> {
        self.put_json(RANS, &ran.ran_name, ran)?;
        debug!(
            ran_name = %ran.ran_name,
            status = %ran.connection_status,
            e2t = ?ran.associated_e2t_address,
            "ran updated"
        );
        Ok(())
    }

    fn get_instance(&self, address: &str) -> StateResult<InstanceRecord> {
        self.get_json(E2T_INSTANCES, address)?
            .ok_or_else(|| StateError::NotFound(format!("e2t instance {address}")))
    }

    fn get_instances(&self, addresses: &[String]) -> StateResult<Vec<InstanceRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(E2T_INSTANCES).map_err(map_err!(Table))?;
        let mut results = Vec::with_capacity(addresses.len());
        for address in addresses {
            if let Some(guard) = table.get(address.as_str()).map_err(map_err!(Read))? {
                let instance: InstanceRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                results.push(instance);
            }
        }
        Ok(results)
    }

    fn save_instance(&self, instance: &InstanceRecord) -> StateResult<()> {
        self.put_json(E2T_INSTANCES, &instance.address, instance)
    }

    fn remove_instance(&self, address: &str) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(E2T_INSTANCES).map_err(map_err!(Table))?;
            existed = table.remove(address).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%address, existed, "e2t instance removed");
        Ok(())
    }

    fn get_instance_addresses(&self) -> StateResult<Vec<String>> {
        self.get_json(E2T_ADDRESSES, E2T_ADDRESSES_KEY)?
            .ok_or_else(|| StateError::NotFound("e2t addresses".to_string()))
    }

    fn save_instance_addresses(&self, addresses: &[String]) -> StateResult<()> {
        self.put_json(E2T_ADDRESSES, E2T_ADDRESSES_KEY, &addresses)
    }
}
