//! Settlement workflow
//!
//! Drives one transaction from intake to a terminal state:
//!
//! ```text
//! Initiated → Processing → ComplianceCheck → CurrencyExchange → Routing → {Completed | Failed}
//! ```
//!
//! 1. **Intake**: validate, route, price and classify. Rejections happen
//!    here, before any transaction ID exists.
//! 2. **Stages**: advance through the four intermediate states.
//! 3. **Attempt**: one backend call, bounded by the attempt timeout and
//!    raced against the cancellation token.
//! 4. **Finish**: persist once, report once, return the response.
//!
//! Cancellation is observed before every stage and during the backend
//! attempt. A cancelled transaction ends `Failed` with reason `Cancelled`.

use crate::backend::{AttemptOutcome, SettlementBackend};
use crate::metrics::ReportingSink;
use crate::types::{SettlementRequest, SettlementResponse, SettlementWarning};
use crate::{Error, Result};
use compliance_service::ComplianceClassifier;
use ledger_core::{FailureReason, NewTransaction, TradeType, Transaction, TransactionStore};
use reference_data::ReferenceSnapshot;
use routing_engine::{FeeCalculator, RouteSelector};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Highest community benefit score
pub const MAX_COMMUNITY_BENEFIT: u8 = 10;

/// Community benefit score for a transfer
///
/// Trade-type base, plus one when both currencies are network members,
/// plus one when the corridor is shared by both countries.
pub fn community_benefit_score(trade_type: TradeType, both_members: bool, direct: bool) -> u8 {
    let base: u8 = match trade_type {
        TradeType::GoodsExport => 7,
        TradeType::GoodsImport => 5,
        TradeType::ServicesExport => 6,
        TradeType::ServicesImport => 4,
        TradeType::Remittance => 8,
        TradeType::Investment => 6,
        TradeType::LoanRepayment => 5,
    };

    (base + u8::from(both_members) + u8::from(direct)).min(MAX_COMMUNITY_BENEFIT)
}

/// Per-request settlement state machine
pub struct SettlementWorkflow {
    snapshot: Arc<ReferenceSnapshot>,
    backend: Arc<dyn SettlementBackend>,
    store: Arc<dyn TransactionStore>,
    sink: Arc<dyn ReportingSink>,
    attempt_timeout: Duration,
}

impl std::fmt::Debug for SettlementWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementWorkflow")
            .field("attempt_timeout", &self.attempt_timeout)
            .finish_non_exhaustive()
    }
}

impl SettlementWorkflow {
    /// Create workflow over one reference snapshot
    pub fn new(
        snapshot: Arc<ReferenceSnapshot>,
        backend: Arc<dyn SettlementBackend>,
        store: Arc<dyn TransactionStore>,
        sink: Arc<dyn ReportingSink>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            snapshot,
            backend,
            store,
            sink,
            attempt_timeout,
        }
    }

    /// Intake and run to a terminal state
    pub async fn execute(
        &self,
        request: &SettlementRequest,
        cancel: &CancellationToken,
    ) -> Result<SettlementResponse> {
        let tx = self.intake(request)?;
        self.run(tx, cancel).await
    }

    /// Validate, route, price and classify; returns an `Initiated` transaction
    pub fn intake(&self, request: &SettlementRequest) -> Result<Transaction> {
        if request.amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(format!(
                "amount must be positive, got {}",
                request.amount
            )));
        }

        let selector = RouteSelector::new(self.snapshot.corridors());
        let calculator = FeeCalculator::new(self.snapshot.currencies());
        let classifier =
            ComplianceClassifier::new(self.snapshot.currencies(), self.snapshot.corridors());

        let from = calculator.currency(&request.from_currency)?;
        let to = calculator.currency(&request.to_currency)?;

        let route = selector.select_corridor(&request.from_country, &request.to_country)?;
        let corridor = selector.corridor(&route.corridor_id)?;

        let quote = calculator.compute_settlement(
            &request.from_currency,
            &request.to_currency,
            request.amount,
            corridor,
        )?;

        let compliance = classifier.classify_transfer(
            request.amount,
            &request.from_currency,
            &request.from_country,
            &request.to_country,
            request.trade_type,
        )?;

        let score = community_benefit_score(
            request.trade_type,
            from.network_member && to.network_member,
            route.is_direct(),
        );

        let tx = Transaction::initiate(NewTransaction {
            trade_type: request.trade_type,
            payment_method: request.payment_method,
            corridor_id: corridor.id.clone(),
            from_country: request.from_country.clone(),
            to_country: request.to_country.clone(),
            from_currency: request.from_currency.clone(),
            to_currency: request.to_currency.clone(),
            amount_source: request.amount,
            amount_destination: quote.amount_destination,
            exchange_rate: quote.exchange_rate,
            fees_total: quote.fees_total,
            processing_time_hours: corridor.processing_time_hours,
            compliance_tier: compliance.tier,
            community_benefit_score: score,
            context: request.context.clone(),
            retry_of: request.retry_of,
        });

        info!(
            transaction_id = %tx.id,
            corridor = %tx.corridor_id,
            amount = %tx.amount_source,
            currency = %tx.from_currency,
            tier = %tx.compliance_tier,
            retry_of = ?tx.retry_of,
            "Settlement initiated"
        );

        Ok(tx)
    }

    /// Drive an `Initiated` transaction to a terminal state
    pub async fn run(
        &self,
        mut tx: Transaction,
        cancel: &CancellationToken,
    ) -> Result<SettlementResponse> {
        while tx.status.next_stage().is_some() {
            if cancel.is_cancelled() {
                tx.fail(FailureReason::Cancelled)?;
                return Ok(self.finish(tx).await);
            }

            let stage = tx.advance()?;
            debug!(transaction_id = %tx.id, stage = %stage, "Stage entered");
            tokio::task::yield_now().await;
        }

        match self.attempt(&tx, cancel).await {
            None => tx.complete()?,
            Some(reason) => tx.fail(reason)?,
        }

        Ok(self.finish(tx).await)
    }

    /// One backend attempt; `None` means settled
    async fn attempt(&self, tx: &Transaction, cancel: &CancellationToken) -> Option<FailureReason> {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                warn!(transaction_id = %tx.id, "Settlement cancelled during backend attempt");
                Some(FailureReason::Cancelled)
            }

            result = tokio::time::timeout(self.attempt_timeout, self.backend.attempt(tx)) => {
                match result {
                    Ok(Ok(AttemptOutcome::Settled)) => None,
                    Ok(Ok(AttemptOutcome::Declined)) => Some(FailureReason::Declined),
                    Ok(Err(e)) => {
                        error!(transaction_id = %tx.id, error = %e, "Backend attempt failed");
                        Some(FailureReason::Backend(e.to_string()))
                    }
                    Err(_) => {
                        warn!(
                            transaction_id = %tx.id,
                            timeout_ms = self.attempt_timeout.as_millis() as u64,
                            "Backend attempt timed out"
                        );
                        Some(FailureReason::TimedOut)
                    }
                }
            }
        }
    }

    /// Persist and report a terminal transaction exactly once
    async fn finish(&self, tx: Transaction) -> SettlementResponse {
        let mut warnings = Vec::new();

        if let Err(e) = self.store.upsert(&tx).await {
            warn!(transaction_id = %tx.id, error = %e, "Failed to persist transaction");
            warnings.push(SettlementWarning::PersistenceFailure(e.to_string()));
        }

        if let Err(e) = self.sink.report(&tx).await {
            warn!(transaction_id = %tx.id, error = %e, "Failed to report transaction");
            warnings.push(SettlementWarning::ReportingFailure(e.to_string()));
        }

        match &tx.failure_reason {
            None => info!(
                transaction_id = %tx.id,
                status = %tx.status,
                fees = %tx.fees_total,
                "Settlement finished"
            ),
            Some(reason) => info!(
                transaction_id = %tx.id,
                status = %tx.status,
                reason = %reason,
                "Settlement finished"
            ),
        }

        SettlementResponse::new(&tx, warnings)
    }
}
