//! Corridor Rail Ledger Core
//!
//! Transaction model and durable storage for the settlement rail.
//!
//! # Architecture
//!
//! - **Transaction**: the one mutable entity; forward-only status
//!   transitions are enforced by its methods
//! - **TransactionStore**: idempotent upsert keyed by transaction ID
//! - **Backends**: RocksDB for durability, in-memory for tests
//!
//! # Invariants
//!
//! - `completed_at` is set iff status is `Completed`
//! - No transition leaves `Completed` or `Failed`
//! - One stored record per transaction ID

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod error;
pub mod metrics;
pub mod storage;
pub mod store;
pub mod types;

// Re-exports
pub use config::{Config, StoreBackend};
pub use error::{Error, Result};
pub use metrics::StoreMetrics;
pub use storage::Storage;
pub use store::{FailingStore, InMemoryStore, MeteredStore, TransactionStore};
pub use types::{
    ComplianceTier, FailureReason, NewTransaction, PaymentMethod, StageRecord, TradeType,
    Transaction, TransactionStatus,
};

use std::sync::Arc;

/// Open the configured store, wrapped with metrics
pub fn open_store(config: &Config) -> Result<Arc<MeteredStore>> {
    let inner: Arc<dyn TransactionStore> = match config.backend {
        StoreBackend::RocksDb => Arc::new(Storage::open(config)?),
        StoreBackend::Memory => Arc::new(InMemoryStore::new()),
    };

    let metrics = StoreMetrics::new()
        .map_err(|e| Error::Config(format!("Failed to create store metrics: {}", e)))?;

    Ok(Arc::new(MeteredStore::new(inner, metrics)))
}
