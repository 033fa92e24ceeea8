//! Settlement backend seam
//!
//! The workflow asks a [`SettlementBackend`] whether a transaction that
//! reached `Routing` actually settled. [`ProbabilisticBackend`] draws
//! against per-method success rates; [`ScriptedBackend`] replays a fixed
//! script for deterministic tests.

use crate::config::SuccessRates;
use crate::{Error, Result};
use async_trait::async_trait;
use ledger_core::Transaction;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Result of one settlement attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Funds moved
    Settled,
    /// Backend refused the transfer
    Declined,
}

/// External settlement network
#[async_trait]
pub trait SettlementBackend: Send + Sync {
    /// Attempt to settle `tx`
    async fn attempt(&self, tx: &Transaction) -> Result<AttemptOutcome>;
}

/// Backend that settles with a fixed probability per payment method
#[derive(Debug)]
pub struct ProbabilisticBackend {
    success_rates: SuccessRates,
    latency: Duration,
}

impl ProbabilisticBackend {
    /// Create backend
    pub fn new(success_rates: SuccessRates, latency: Duration) -> Self {
        Self {
            success_rates,
            latency,
        }
    }

    fn should_succeed(&self, tx: &Transaction) -> bool {
        let rate = self.success_rates.for_method(tx.payment_method);
        let mut rng = rand::thread_rng();
        rng.gen::<f64>() < rate
    }
}

#[async_trait]
impl SettlementBackend for ProbabilisticBackend {
    async fn attempt(&self, tx: &Transaction) -> Result<AttemptOutcome> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.should_succeed(tx) {
            debug!(
                transaction_id = %tx.id,
                method = %tx.payment_method.as_str(),
                "Backend settled"
            );
            Ok(AttemptOutcome::Settled)
        } else {
            warn!(
                transaction_id = %tx.id,
                method = %tx.payment_method.as_str(),
                "Backend declined"
            );
            Ok(AttemptOutcome::Declined)
        }
    }
}

/// One scripted backend response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedAttempt {
    /// Settle
    Settle,
    /// Decline
    Decline,
    /// Return a backend error
    Error(String),
    /// Never answer
    Hang,
}

/// Deterministic backend replaying a script, then a fallback
#[derive(Debug)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<ScriptedAttempt>>,
    fallback: ScriptedAttempt,
    attempts: AtomicUsize,
}

impl ScriptedBackend {
    /// Backend that replays `script`, then answers `fallback` forever
    pub fn new(
        script: impl IntoIterator<Item = ScriptedAttempt>,
        fallback: ScriptedAttempt,
    ) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            attempts: AtomicUsize::new(0),
        }
    }

    /// Backend that always gives the same answer
    pub fn always(answer: ScriptedAttempt) -> Self {
        Self::new(std::iter::empty(), answer)
    }

    /// Number of attempts received
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettlementBackend for ScriptedBackend {
    async fn attempt(&self, _tx: &Transaction) -> Result<AttemptOutcome> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match next {
            ScriptedAttempt::Settle => Ok(AttemptOutcome::Settled),
            ScriptedAttempt::Decline => Ok(AttemptOutcome::Declined),
            ScriptedAttempt::Error(msg) => Err(Error::Backend(msg)),
            ScriptedAttempt::Hang => {
                std::future::pending::<()>().await;
                Ok(AttemptOutcome::Declined)
            }
        }
    }
}
