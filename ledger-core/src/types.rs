//! Core types for the settlement ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (Decimal for money)
//! - Forward-only status transitions enforced at the type's API

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Commercial nature of a cross-border transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TradeType {
    /// Export of goods
    GoodsExport,
    /// Import of goods
    GoodsImport,
    /// Export of services
    ServicesExport,
    /// Import of services
    ServicesImport,
    /// Person-to-person remittance
    Remittance,
    /// Capital investment
    Investment,
    /// Repayment of a cross-border loan
    LoanRepayment,
}

impl TradeType {
    /// Every trade type, in declaration order
    pub const ALL: [TradeType; 7] = [
        TradeType::GoodsExport,
        TradeType::GoodsImport,
        TradeType::ServicesExport,
        TradeType::ServicesImport,
        TradeType::Remittance,
        TradeType::Investment,
        TradeType::LoanRepayment,
    ];

    /// Wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeType::GoodsExport => "goods-export",
            TradeType::GoodsImport => "goods-import",
            TradeType::ServicesExport => "services-export",
            TradeType::ServicesImport => "services-import",
            TradeType::Remittance => "remittance",
            TradeType::Investment => "investment",
            TradeType::LoanRepayment => "loan-repayment",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment instrument used to move the funds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// Direct interbank wire
    WireTransfer,
    /// Correspondent banking chain
    CorrespondentBanking,
    /// Mobile money operator
    MobileMoney,
    /// Digital wallet provider
    DigitalWallet,
    /// Trade finance instrument (LC, guarantee)
    TradeFinance,
    /// Shared-ledger transfer
    LedgerTransfer,
}

impl PaymentMethod {
    /// Every payment method, in declaration order
    pub const ALL: [PaymentMethod; 6] = [
        PaymentMethod::WireTransfer,
        PaymentMethod::CorrespondentBanking,
        PaymentMethod::MobileMoney,
        PaymentMethod::DigitalWallet,
        PaymentMethod::TradeFinance,
        PaymentMethod::LedgerTransfer,
    ];

    /// Wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::WireTransfer => "wire-transfer",
            PaymentMethod::CorrespondentBanking => "correspondent-banking",
            PaymentMethod::MobileMoney => "mobile-money",
            PaymentMethod::DigitalWallet => "digital-wallet",
            PaymentMethod::TradeFinance => "trade-finance",
            PaymentMethod::LedgerTransfer => "ledger-transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse regulatory classification attached to a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceTier {
    /// Standard checks
    Basic,
    /// High-value transfer, enhanced due diligence
    Enhanced,
    /// Countries share no corridor
    Strict,
    /// Both legs settle in network-member currencies
    NetworkOptimized,
}

impl ComplianceTier {
    /// Label used in metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceTier::Basic => "basic",
            ComplianceTier::Enhanced => "enhanced",
            ComplianceTier::Strict => "strict",
            ComplianceTier::NetworkOptimized => "network_optimized",
        }
    }
}

impl fmt::Display for ComplianceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement workflow state
///
/// ```text
/// Initiated → Processing → ComplianceCheck → CurrencyExchange → Routing → {Completed | Failed}
/// ```
///
/// `Failed` is also reachable from any non-terminal state when a
/// transaction is cancelled or times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum TransactionStatus {
    /// Entry state
    Initiated = 1,
    /// Intake accepted
    Processing = 2,
    /// Compliance tier recorded
    ComplianceCheck = 3,
    /// Conversion and fees recorded
    CurrencyExchange = 4,
    /// Corridor handed the transfer
    Routing = 5,
    /// Settled (terminal)
    Completed = 6,
    /// Not settled (terminal)
    Failed = 7,
}

impl TransactionStatus {
    /// Check if no transition can leave this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Completed | TransactionStatus::Failed)
    }

    /// Next intermediate stage on the linear path, if any
    pub fn next_stage(&self) -> Option<TransactionStatus> {
        match self {
            TransactionStatus::Initiated => Some(TransactionStatus::Processing),
            TransactionStatus::Processing => Some(TransactionStatus::ComplianceCheck),
            TransactionStatus::ComplianceCheck => Some(TransactionStatus::CurrencyExchange),
            TransactionStatus::CurrencyExchange => Some(TransactionStatus::Routing),
            TransactionStatus::Routing
            | TransactionStatus::Completed
            | TransactionStatus::Failed => None,
        }
    }

    /// Label used in metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Initiated => "INITIATED",
            TransactionStatus::Processing => "PROCESSING",
            TransactionStatus::ComplianceCheck => "COMPLIANCE_CHECK",
            TransactionStatus::CurrencyExchange => "CURRENCY_EXCHANGE",
            TransactionStatus::Routing => "ROUTING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a transaction ended in `Failed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Settlement backend declined the transfer
    Declined,
    /// Caller cancelled before a terminal state
    Cancelled,
    /// Backend attempt exceeded its deadline
    TimedOut,
    /// Backend reported an error
    Backend(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Declined => f.write_str("declined"),
            FailureReason::Cancelled => f.write_str("cancelled"),
            FailureReason::TimedOut => f.write_str("timed out"),
            FailureReason::Backend(msg) => write!(f, "backend error: {}", msg),
        }
    }
}

/// A state the transaction entered, and when
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    /// State entered
    pub status: TransactionStatus,
    /// Entry timestamp
    pub entered_at: DateTime<Utc>,
}

/// Values computed at intake, before the transaction exists
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Trade type
    pub trade_type: TradeType,
    /// Payment method
    pub payment_method: PaymentMethod,
    /// Selected corridor
    pub corridor_id: String,
    /// Sending country
    pub from_country: String,
    /// Receiving country
    pub to_country: String,
    /// Source currency code
    pub from_currency: String,
    /// Destination currency code
    pub to_currency: String,
    /// Amount debited, in source currency
    pub amount_source: Decimal,
    /// Amount credited, in destination currency (fee not deducted)
    pub amount_destination: Decimal,
    /// Source → destination rate
    pub exchange_rate: Decimal,
    /// Total fee, in source currency
    pub fees_total: Decimal,
    /// Corridor processing-time bound (hours)
    pub processing_time_hours: u32,
    /// Compliance tier
    pub compliance_tier: ComplianceTier,
    /// Community benefit score (0-10)
    pub community_benefit_score: u8,
    /// Opaque caller annotation
    pub context: Option<String>,
    /// Failed transaction this one resubmits
    pub retry_of: Option<Uuid>,
}

/// Cross-border transaction driven by the settlement workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique ID (UUIDv7 for time-ordering)
    pub id: Uuid,
    /// Trade type
    pub trade_type: TradeType,
    /// Payment method
    pub payment_method: PaymentMethod,
    /// Settlement corridor
    pub corridor_id: String,
    /// Sending country
    pub from_country: String,
    /// Receiving country
    pub to_country: String,
    /// Source currency code
    pub from_currency: String,
    /// Destination currency code
    pub to_currency: String,
    /// Amount debited, in source currency
    pub amount_source: Decimal,
    /// `amount_source × exchange_rate`
    pub amount_destination: Decimal,
    /// Source → destination rate
    pub exchange_rate: Decimal,
    /// Total fee, reported separately from the destination amount
    pub fees_total: Decimal,
    /// Corridor processing-time bound (hours)
    pub processing_time_hours: u32,
    /// Current workflow state
    pub status: TransactionStatus,
    /// Compliance tier
    pub compliance_tier: ComplianceTier,
    /// Community benefit score (0-10)
    pub community_benefit_score: u8,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Set only when status is `Completed`
    pub completed_at: Option<DateTime<Utc>>,
    /// Set only when status is `Failed`
    pub failure_reason: Option<FailureReason>,
    /// Every state entered, oldest first
    pub stage_history: Vec<StageRecord>,
    /// Opaque caller annotation, never used for decisions
    pub context: Option<String>,
    /// Failed transaction this one resubmits
    pub retry_of: Option<Uuid>,
}

impl Transaction {
    /// Create a transaction in the `Initiated` state
    pub fn initiate(new: NewTransaction) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::now_v7(),
            trade_type: new.trade_type,
            payment_method: new.payment_method,
            corridor_id: new.corridor_id,
            from_country: new.from_country,
            to_country: new.to_country,
            from_currency: new.from_currency,
            to_currency: new.to_currency,
            amount_source: new.amount_source,
            amount_destination: new.amount_destination,
            exchange_rate: new.exchange_rate,
            fees_total: new.fees_total,
            processing_time_hours: new.processing_time_hours,
            status: TransactionStatus::Initiated,
            compliance_tier: new.compliance_tier,
            community_benefit_score: new.community_benefit_score.min(10),
            created_at: now,
            completed_at: None,
            failure_reason: None,
            stage_history: vec![StageRecord {
                status: TransactionStatus::Initiated,
                entered_at: now,
            }],
            context: new.context,
            retry_of: new.retry_of,
        }
    }

    /// Check if transaction is in terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to the next intermediate stage
    pub fn advance(&mut self) -> Result<TransactionStatus> {
        let next = self.status.next_stage().ok_or(Error::InvalidTransition {
            from: self.status,
            to: "next stage",
        })?;
        self.enter(next);
        Ok(next)
    }

    /// Mark settled; only legal from `Routing`
    pub fn complete(&mut self) -> Result<()> {
        if self.status != TransactionStatus::Routing {
            return Err(Error::InvalidTransition {
                from: self.status,
                to: TransactionStatus::Completed.as_str(),
            });
        }

        self.enter(TransactionStatus::Completed);
        self.completed_at = self.stage_history.last().map(|s| s.entered_at);
        Ok(())
    }

    /// Mark failed; legal from any non-terminal state
    pub fn fail(&mut self, reason: FailureReason) -> Result<()> {
        if self.is_terminal() {
            return Err(Error::InvalidTransition {
                from: self.status,
                to: TransactionStatus::Failed.as_str(),
            });
        }

        self.enter(TransactionStatus::Failed);
        self.failure_reason = Some(reason);
        Ok(())
    }

    fn enter(&mut self, status: TransactionStatus) {
        self.status = status;
        self.stage_history.push(StageRecord {
            status,
            entered_at: Utc::now(),
        });
    }
}
