//! Settlement metrics and the reporting sink
//!
//! # Metrics
//!
//! - `settlement_transactions_total{status}` - Finished transactions by terminal status
//! - `settlement_compliance_tier_total{tier}` - Finished transactions by tier
//! - `settlement_corridor_total{corridor}` - Finished transactions by corridor
//! - `settlement_fees` - Histogram of fees charged
//! - `settlement_rejections_total{kind}` - Requests rejected before intake
//! - `settlement_persistence_warnings_total` - Failed durable writes

use crate::Result;
use async_trait::async_trait;
use ledger_core::Transaction;
use prometheus::proto::MetricFamily;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;

/// Receives every finished transaction for aggregation
#[async_trait]
pub trait ReportingSink: Send + Sync {
    /// Record a transaction in a terminal state
    async fn report(&self, tx: &Transaction) -> Result<()>;
}

/// Metrics collector
#[derive(Clone, Debug)]
pub struct SettlementMetrics {
    /// Finished transactions by status
    pub transactions_total: IntCounterVec,

    /// Finished transactions by compliance tier
    pub compliance_tiers: IntCounterVec,

    /// Finished transactions by corridor
    pub corridors: IntCounterVec,

    /// Fees charged
    pub fees: Histogram,

    /// Rejections by error kind
    pub rejections: IntCounterVec,

    /// Failed durable writes
    pub persistence_warnings: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl SettlementMetrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transactions_total = IntCounterVec::new(
            Opts::new("settlement_transactions_total", "Finished transactions"),
            &["status"],
        )?;
        registry.register(Box::new(transactions_total.clone()))?;

        let compliance_tiers = IntCounterVec::new(
            Opts::new("settlement_compliance_tier_total", "Finished transactions by tier"),
            &["tier"],
        )?;
        registry.register(Box::new(compliance_tiers.clone()))?;

        let corridors = IntCounterVec::new(
            Opts::new("settlement_corridor_total", "Finished transactions by corridor"),
            &["corridor"],
        )?;
        registry.register(Box::new(corridors.clone()))?;

        let fees = Histogram::with_opts(
            HistogramOpts::new("settlement_fees", "Fees charged, in source currency")
                .buckets(vec![1.0, 10.0, 100.0, 1_000.0, 10_000.0, 100_000.0]),
        )?;
        registry.register(Box::new(fees.clone()))?;

        let rejections = IntCounterVec::new(
            Opts::new("settlement_rejections_total", "Requests rejected before intake"),
            &["kind"],
        )?;
        registry.register(Box::new(rejections.clone()))?;

        let persistence_warnings = IntCounter::new(
            "settlement_persistence_warnings_total",
            "Failed durable writes of finished transactions",
        )?;
        registry.register(Box::new(persistence_warnings.clone()))?;

        Ok(Self {
            transactions_total,
            compliance_tiers,
            corridors,
            fees,
            rejections,
            persistence_warnings,
            registry,
        })
    }

    /// Record a finished transaction
    pub fn record_transaction(&self, tx: &Transaction) {
        self.transactions_total
            .with_label_values(&[tx.status.as_str()])
            .inc();
        self.compliance_tiers
            .with_label_values(&[tx.compliance_tier.as_str()])
            .inc();
        self.corridors
            .with_label_values(&[tx.corridor_id.as_str()])
            .inc();
        self.fees.observe(tx.fees_total.to_f64().unwrap_or(0.0));
    }

    /// Record a rejected request
    pub fn record_rejection(&self, kind: &str) {
        self.rejections.with_label_values(&[kind]).inc();
    }

    /// Record a failed durable write
    pub fn record_persistence_warning(&self) {
        self.persistence_warnings.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Encode metric families in Prometheus text format
pub fn encode(families: &[MetricFamily]) -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

#[async_trait]
impl ReportingSink for SettlementMetrics {
    async fn report(&self, tx: &Transaction) -> Result<()> {
        self.record_transaction(tx);
        Ok(())
    }
}
