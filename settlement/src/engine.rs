//! Main settlement engine
//!
//! Owns the shared collaborators (reference snapshot handle, store,
//! backend, metrics) and hands each request its own workflow.

use crate::{
    backend::{ProbabilisticBackend, SettlementBackend},
    config::Config,
    group::GroupOptimizer,
    instrument::InstrumentIssuer,
    metrics::{self, ReportingSink, SettlementMetrics},
    types::*,
    workflow::SettlementWorkflow,
    Error, Result,
};
use ledger_core::{StoreMetrics, Transaction, TransactionStatus, TransactionStore};
use reference_data::{ReferenceSnapshot, SnapshotHandle};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Settlement engine
pub struct SettlementEngine {
    /// Reference data, swappable as a whole
    snapshot: SnapshotHandle,

    /// Durable storage for finished transactions
    store: Arc<dyn TransactionStore>,

    /// Settlement network
    backend: Arc<dyn SettlementBackend>,

    /// Metrics, also the default reporting sink
    metrics: SettlementMetrics,

    /// Reporting sink
    sink: Arc<dyn ReportingSink>,

    /// Store metrics, when the engine opened the store itself
    store_metrics: Option<StoreMetrics>,

    /// Bounds `settle_all`
    concurrency: Arc<Semaphore>,

    /// Configuration
    config: Config,
}

impl std::fmt::Debug for SettlementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementEngine")
            .field("service_name", &self.config.service_name)
            .finish_non_exhaustive()
    }
}

impl SettlementEngine {
    /// Create engine from configuration
    ///
    /// Loads reference data, opens the configured store and uses the
    /// probabilistic backend.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let snapshot = ReferenceSnapshot::from_file(&config.reference_data_path)?;

        let ledger_config = config.ledger.clone();
        let store = tokio::task::spawn_blocking(move || ledger_core::open_store(&ledger_config))
            .await
            .map_err(|e| Error::Other(format!("Store open task failed: {}", e)))??;

        let store_metrics = store.metrics().clone();

        let backend = Arc::new(ProbabilisticBackend::new(
            config.workflow.success_rates.clone(),
            config.workflow.backend_latency(),
        ));

        let mut engine =
            Self::with_components(config, SnapshotHandle::new(snapshot), store, backend)?;
        engine.store_metrics = Some(store_metrics);
        Ok(engine)
    }

    /// Create engine from explicit collaborators
    pub fn with_components(
        config: Config,
        snapshot: SnapshotHandle,
        store: Arc<dyn TransactionStore>,
        backend: Arc<dyn SettlementBackend>,
    ) -> Result<Self> {
        config.validate()?;

        let metrics = SettlementMetrics::new()
            .map_err(|e| Error::Config(format!("Failed to create metrics: {}", e)))?;
        let sink: Arc<dyn ReportingSink> = Arc::new(metrics.clone());

        tracing::info!(
            service = %config.service_name,
            backend = ?config.ledger.backend,
            max_concurrency = config.workflow.max_concurrency,
            "Settlement engine ready"
        );

        Ok(Self {
            snapshot,
            store,
            backend,
            metrics,
            sink,
            store_metrics: None,
            concurrency: Arc::new(Semaphore::new(config.workflow.max_concurrency)),
            config,
        })
    }

    /// Replace the reporting sink
    pub fn with_sink(mut self, sink: Arc<dyn ReportingSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Workflow bound to the current snapshot
    fn workflow(&self) -> SettlementWorkflow {
        SettlementWorkflow::new(
            self.snapshot.load(),
            self.backend.clone(),
            self.store.clone(),
            self.sink.clone(),
            self.config.workflow.attempt_timeout(),
        )
    }

    /// Settle one transfer
    pub async fn settle(&self, request: SettlementRequest) -> Result<SettlementResponse> {
        self.settle_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Settle one transfer, aborting to `Failed` if `cancel` fires first
    pub async fn settle_with_cancel(
        &self,
        request: SettlementRequest,
        cancel: CancellationToken,
    ) -> Result<SettlementResponse> {
        let result = self.workflow().execute(&request, &cancel).await;

        match &result {
            Ok(response) if response.persistence_failed() => {
                self.metrics.record_persistence_warning();
            }
            Ok(_) => {}
            Err(e) => {
                tracing::info!(error = %e, kind = e.kind(), "Settlement request rejected");
                self.metrics.record_rejection(e.kind());
            }
        }

        result
    }

    /// Settle independent transfers concurrently
    ///
    /// At most `max_concurrency` run at once. Results come back in input
    /// order; each one succeeds or fails on its own.
    pub async fn settle_all(
        self: &Arc<Self>,
        requests: Vec<SettlementRequest>,
    ) -> Vec<Result<SettlementResponse>> {
        let handles: Vec<_> = requests
            .into_iter()
            .map(|request| {
                let engine = Arc::clone(self);
                tokio::spawn(async move {
                    let _permit = engine
                        .concurrency
                        .clone()
                        .acquire_owned()
                        .await
                        .map_err(|e| Error::Other(format!("Concurrency limiter closed: {}", e)))?;
                    engine.settle(request).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(match handle.await {
                Ok(result) => result,
                Err(e) => Err(Error::Other(format!("Settlement task failed: {}", e))),
            });
        }
        results
    }

    /// Apply federation discounts to a batch
    pub fn optimize_group(
        &self,
        request: &GroupOptimizationRequest,
    ) -> Result<GroupOptimizationResult> {
        let snapshot = self.snapshot.load();
        GroupOptimizer::new(snapshot.federations(), &self.config.group).optimize(request)
    }

    /// Issue a trade instrument
    pub fn issue_instrument(&self, request: &InstrumentRequest) -> Result<TradeInstrument> {
        let snapshot = self.snapshot.load();
        InstrumentIssuer::new(snapshot.currencies(), &self.config.instruments).issue(request)
    }

    /// Reload reference data from the configured path
    ///
    /// Settlements already running keep the snapshot they started with.
    pub fn reload_reference_data(&self) -> Result<()> {
        self.snapshot
            .reload_from_file(&self.config.reference_data_path)?;
        Ok(())
    }

    /// Current reference snapshot
    pub fn snapshot(&self) -> Arc<ReferenceSnapshot> {
        self.snapshot.load()
    }

    /// Fetch a stored transaction
    pub async fn transaction(&self, id: Uuid) -> Result<Transaction> {
        Ok(self.store.get(id).await?)
    }

    /// Stored transactions with a status
    pub async fn transactions_by_status(
        &self,
        status: TransactionStatus,
    ) -> Result<Vec<Transaction>> {
        Ok(self.store.list_by_status(status).await?)
    }

    /// Metrics collector
    pub fn metrics(&self) -> &SettlementMetrics {
        &self.metrics
    }

    /// Settlement and store metrics in Prometheus text format
    pub fn export_metrics(&self) -> anyhow::Result<String> {
        let mut families = self.metrics.registry().gather();
        if let Some(store_metrics) = &self.store_metrics {
            families.extend(store_metrics.registry().gather());
        }
        metrics::encode(&families)
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shutdown engine
    pub async fn shutdown(self) -> Result<()> {
        tracing::info!("Shutting down settlement engine");
        self.concurrency.close();
        Ok(())
    }
}
