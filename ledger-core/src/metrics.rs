//! Metrics collection for the transaction store
//!
//! # Metrics
//!
//! - `ledger_upserts_total` - Transactions written
//! - `ledger_upsert_failures_total` - Failed writes
//! - `ledger_upsert_duration_seconds` - Histogram of write latencies
//!
//! Each collector owns its own [`Registry`] so several stores can live in
//! one process (and in one test binary) without name collisions.

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone, Debug)]
pub struct StoreMetrics {
    /// Transactions written
    pub upserts_total: IntCounter,

    /// Failed writes
    pub upsert_failures: IntCounter,

    /// Write duration histogram
    pub upsert_duration: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl StoreMetrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let upserts_total = IntCounter::new("ledger_upserts_total", "Transactions written")?;
        registry.register(Box::new(upserts_total.clone()))?;

        let upsert_failures =
            IntCounter::new("ledger_upsert_failures_total", "Failed transaction writes")?;
        registry.register(Box::new(upsert_failures.clone()))?;

        let upsert_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_upsert_duration_seconds",
                "Histogram of write latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(upsert_duration.clone()))?;

        Ok(Self {
            upserts_total,
            upsert_failures,
            upsert_duration,
            registry,
        })
    }

    /// Record a write attempt
    pub fn record_upsert(&self, duration_seconds: f64, succeeded: bool) {
        self.upsert_duration.observe(duration_seconds);
        if succeeded {
            self.upserts_total.inc();
        } else {
            self.upsert_failures.inc();
        }
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
