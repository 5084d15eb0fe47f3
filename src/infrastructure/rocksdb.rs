use crate::domain::ports::StateStore;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column family holding all ledger state (payees, index, singleton).
pub const CF_STATE: &str = "state";

/// Persistent store implementation backed by RocksDB.
///
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
}

impl RocksDbStore {
    /// Opens or creates a RocksDB instance at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_state = ColumnFamilyDescriptor::new(CF_STATE, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_state])
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(CF_STATE)
            .ok_or_else(|| LedgerError::Storage("state column family not found".to_string()))
    }
}

#[async_trait]
impl StateStore for RocksDbStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let cf = self.cf()?;
        self.db
            .get_cf(cf, key.as_bytes())
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let cf = self.cf()?;
        self.db
            .put_cf(cf, key.as_bytes(), value)
            .map_err(|e| LedgerError::Storage(e.to_string()))
    }

    async fn has(&self, key: &str) -> Result<bool> {
        let cf = self.cf()?;
        let result = self
            .db
            .get_pinned_cf(cf, key.as_bytes())
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(result.is_some())
    }
}
