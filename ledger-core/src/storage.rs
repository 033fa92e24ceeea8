//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `transactions` - Finished transactions (key: transaction_id)
//! - `status_index` - Secondary index (key: status || transaction_id)
//!
//! Transaction IDs are UUIDv7, so index scans return records in creation
//! order.

use crate::{
    error::{Error, Result},
    store::TransactionStore,
    types::{Transaction, TransactionStatus},
    Config,
};
use async_trait::async_trait;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch,
    WriteOptions, DB,
};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_TRANSACTIONS: &str = "transactions";
const CF_STATUS_INDEX: &str = "status_index";

/// RocksDB-backed transaction store
#[derive(Clone)]
pub struct Storage {
    db: Arc<DB>,
    sync_writes: bool,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("path", &self.db.path())
            .field("sync_writes", &self.sync_writes)
            .finish()
    }
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Self::cf_options_transactions()),
            ColumnFamilyDescriptor::new(CF_STATUS_INDEX, Self::cf_options_index()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened transaction store");

        Ok(Self {
            db: Arc::new(db),
            sync_writes: config.rocksdb.sync_writes,
        })
    }

    fn cf_options_transactions() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_index() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    /// Write transaction and its status index entry (atomic)
    pub fn put_transaction(&self, tx: &Transaction) -> Result<()> {
        let cf_tx = self.cf_handle(CF_TRANSACTIONS)?;
        let cf_index = self.cf_handle(CF_STATUS_INDEX)?;
        let key = tx.id.as_bytes();

        let mut batch = WriteBatch::default();

        // Replacing a record in another status leaves a stale index entry
        if let Some(previous) = self.db.get_cf(cf_tx, key)? {
            let previous: Transaction = bincode::deserialize(&previous)?;
            if previous.status != tx.status {
                batch.delete_cf(cf_index, Self::index_key(previous.status, tx.id));
            }
        }

        batch.put_cf(cf_tx, key, bincode::serialize(tx)?);
        batch.put_cf(cf_index, Self::index_key(tx.status, tx.id), b"");

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.sync_writes);
        self.db.write_opt(batch, &write_opts)?;

        tracing::debug!(
            transaction_id = %tx.id,
            status = %tx.status,
            "Transaction persisted"
        );

        Ok(())
    }

    /// Get transaction by ID
    pub fn get_transaction(&self, id: Uuid) -> Result<Transaction> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;

        let value = self
            .db
            .get_cf(cf, id.as_bytes())?
            .ok_or(Error::TransactionNotFound(id))?;

        Ok(bincode::deserialize(&value)?)
    }

    /// Scan the status index
    pub fn transactions_with_status(&self, status: TransactionStatus) -> Result<Vec<Transaction>> {
        let cf_index = self.cf_handle(CF_STATUS_INDEX)?;
        let prefix = [status as u8];

        let mut found = Vec::new();
        for item in self
            .db
            .iterator_cf(cf_index, IteratorMode::From(&prefix, Direction::Forward))
        {
            let (key, _) = item?;
            if key.first() != Some(&(status as u8)) {
                break;
            }

            let id_bytes: [u8; 16] = key
                .get(1..17)
                .and_then(|b| b.try_into().ok())
                .ok_or_else(|| Error::Storage("Malformed status index key".to_string()))?;
            found.push(self.get_transaction(Uuid::from_bytes(id_bytes))?);
        }

        Ok(found)
    }

    /// Count stored transactions
    pub fn transaction_count(&self) -> Result<u64> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        let mut count = 0u64;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    fn index_key(status: TransactionStatus, id: Uuid) -> Vec<u8> {
        let mut key = Vec::with_capacity(17);
        key.push(status as u8);
        key.extend_from_slice(id.as_bytes());
        key
    }
}

#[async_trait]
impl TransactionStore for Storage {
    async fn upsert(&self, tx: &Transaction) -> Result<()> {
        let storage = self.clone();
        let tx = tx.clone();
        tokio::task::spawn_blocking(move || storage.put_transaction(&tx)).await?
    }

    async fn get(&self, id: Uuid) -> Result<Transaction> {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || storage.get_transaction(id)).await?
    }

    async fn list_by_status(&self, status: TransactionStatus) -> Result<Vec<Transaction>> {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || storage.transactions_with_status(status)).await?
    }

    async fn count(&self) -> Result<u64> {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || storage.transaction_count()).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{tests::sample_transaction, FailureReason};
    use tempfile::TempDir;

    fn test_config() -> (Config, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        config.rocksdb.sync_writes = false;
        (config, temp_dir)
    }

    #[test]
    fn test_storage_open() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();
        assert!(storage.db.cf_handle(CF_TRANSACTIONS).is_some());
        assert!(storage.db.cf_handle(CF_STATUS_INDEX).is_some());
    }

    #[test]
    fn test_put_and_get_transaction() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();

        let tx = sample_transaction();
        storage.put_transaction(&tx).unwrap();

        let retrieved = storage.get_transaction(tx.id).unwrap();
        assert_eq!(retrieved, tx);
    }

    #[test]
    fn test_rewrite_moves_status_index() {
        let (config, _temp) = test_config();
        let storage = Storage::open(&config).unwrap();

        let mut tx = sample_transaction();
        storage.put_transaction(&tx).unwrap();

        tx.fail(FailureReason::TimedOut).unwrap();
        storage.put_transaction(&tx).unwrap();
        storage.put_transaction(&tx).unwrap();

        assert!(storage
            .transactions_with_status(TransactionStatus::Initiated)
            .unwrap()
            .is_empty());
        let failed = storage
            .transactions_with_status(TransactionStatus::Failed)
            .unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(storage.transaction_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_store_trait_survives_reopen() {
        let (config, _temp) = test_config();
        let tx = sample_transaction();

        {
            let storage = Storage::open(&config).unwrap();
            storage.upsert(&tx).await.unwrap();
        }

        let storage = Storage::open(&config).unwrap();
        assert_eq!(storage.get(tx.id).await.unwrap().id, tx.id);
        assert_eq!(storage.count().await.unwrap(), 1);
    }
}
