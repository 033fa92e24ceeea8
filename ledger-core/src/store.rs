//! Durable-storage seam for finished transactions
//!
//! The settlement workflow hands each transaction to a [`TransactionStore`]
//! exactly once, after it reaches a terminal state. Implementations must
//! make `upsert` idempotent on the transaction ID: writing the same
//! transaction twice leaves one record.

use crate::{
    metrics::StoreMetrics,
    types::{Transaction, TransactionStatus},
    Error, Result,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Durable transaction storage
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Insert or replace the record keyed by `tx.id`
    async fn upsert(&self, tx: &Transaction) -> Result<()>;

    /// Fetch a transaction by ID
    async fn get(&self, id: Uuid) -> Result<Transaction>;

    /// All transactions currently in `status`, oldest first
    async fn list_by_status(&self, status: TransactionStatus) -> Result<Vec<Transaction>>;

    /// Number of stored transactions
    async fn count(&self) -> Result<u64>;
}

/// In-memory store backed by a concurrent map
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: DashMap<Uuid, Transaction>,
}

impl InMemoryStore {
    /// Create empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn upsert(&self, tx: &Transaction) -> Result<()> {
        self.records.insert(tx.id, tx.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Transaction> {
        self.records
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(Error::TransactionNotFound(id))
    }

    async fn list_by_status(&self, status: TransactionStatus) -> Result<Vec<Transaction>> {
        let mut matching: Vec<Transaction> = self
            .records
            .iter()
            .filter(|entry| entry.value().status == status)
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by_key(|tx| tx.id);
        Ok(matching)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.len() as u64)
    }
}

/// Store whose writes always fail; reads see nothing
///
/// Exercises the persistence-failure path of callers.
#[derive(Debug, Default)]
pub struct FailingStore {
    attempts: AtomicU64,
}

impl FailingStore {
    /// Create store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rejected writes
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TransactionStore for FailingStore {
    async fn upsert(&self, tx: &Transaction) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(Error::Storage(format!("write rejected for {}", tx.id)))
    }

    async fn get(&self, id: Uuid) -> Result<Transaction> {
        Err(Error::TransactionNotFound(id))
    }

    async fn list_by_status(&self, _status: TransactionStatus) -> Result<Vec<Transaction>> {
        Ok(Vec::new())
    }

    async fn count(&self) -> Result<u64> {
        Ok(0)
    }
}

/// Store decorator that records Prometheus metrics
pub struct MeteredStore {
    inner: Arc<dyn TransactionStore>,
    metrics: StoreMetrics,
}

impl MeteredStore {
    /// Wrap a store
    pub fn new(inner: Arc<dyn TransactionStore>, metrics: StoreMetrics) -> Self {
        Self { inner, metrics }
    }

    /// Metrics collector
    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }
}

impl std::fmt::Debug for MeteredStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeteredStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl TransactionStore for MeteredStore {
    async fn upsert(&self, tx: &Transaction) -> Result<()> {
        let start = Instant::now();
        let result = self.inner.upsert(tx).await;
        self.metrics
            .record_upsert(start.elapsed().as_secs_f64(), result.is_ok());
        result
    }

    async fn get(&self, id: Uuid) -> Result<Transaction> {
        self.inner.get(id).await
    }

    async fn list_by_status(&self, status: TransactionStatus) -> Result<Vec<Transaction>> {
        self.inner.list_by_status(status).await
    }

    async fn count(&self) -> Result<u64> {
        self.inner.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{tests::sample_transaction, FailureReason};

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = InMemoryStore::new();
        let tx = sample_transaction();

        store.upsert(&tx).await.unwrap();
        store.upsert(&tx).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.get(tx.id).await.unwrap(), tx);
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let store = InMemoryStore::new();

        let mut failed = sample_transaction();
        failed.fail(FailureReason::Declined).unwrap();
        store.upsert(&failed).await.unwrap();
        store.upsert(&sample_transaction()).await.unwrap();

        let listed = store.list_by_status(TransactionStatus::Failed).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, failed.id);
    }

    #[tokio::test]
    async fn test_missing_transaction() {
        let store = InMemoryStore::new();
        let id = Uuid::now_v7();
        assert!(matches!(
            store.get(id).await,
            Err(Error::TransactionNotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn test_metered_store_counts_upserts() {
        let metrics = StoreMetrics::new().unwrap();
        let store = MeteredStore::new(Arc::new(InMemoryStore::new()), metrics);

        store.upsert(&sample_transaction()).await.unwrap();
        store.upsert(&sample_transaction()).await.unwrap();

        assert_eq!(store.metrics().upserts_total.get(), 2);
        assert_eq!(store.metrics().upsert_failures.get(), 0);
    }

    #[tokio::test]
    async fn test_metered_store_counts_failures() {
        let metrics = StoreMetrics::new().unwrap();
        let failing = Arc::new(FailingStore::new());
        let store = MeteredStore::new(failing.clone(), metrics);

        assert!(matches!(
            store.upsert(&sample_transaction()).await,
            Err(Error::Storage(_))
        ));
        assert_eq!(store.metrics().upsert_failures.get(), 1);
        assert_eq!(failing.attempts(), 1);
    }
}
