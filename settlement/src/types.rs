//! Request and response types for the settlement engine

use chrono::{DateTime, Utc};
use ledger_core::{
    ComplianceTier, FailureReason, PaymentMethod, TradeType, Transaction, TransactionStatus,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Transfer submitted for settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRequest {
    /// Sending country
    pub from_country: String,

    /// Receiving country
    pub to_country: String,

    /// Source currency code
    pub from_currency: String,

    /// Destination currency code
    pub to_currency: String,

    /// Amount in source currency (> 0)
    pub amount: Decimal,

    /// Trade type
    pub trade_type: TradeType,

    /// Payment method
    pub payment_method: PaymentMethod,

    /// Opaque annotation, carried through for reporting only
    #[serde(default)]
    pub context: Option<String>,

    /// Failed transaction this request resubmits
    #[serde(default)]
    pub retry_of: Option<Uuid>,
}

/// Non-fatal problem met after the settlement outcome was decided
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementWarning {
    /// Durable write of the finished transaction failed
    PersistenceFailure(String),

    /// Reporting sink rejected the finished transaction
    ReportingFailure(String),
}

impl fmt::Display for SettlementWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementWarning::PersistenceFailure(msg) => write!(f, "persistence failure: {}", msg),
            SettlementWarning::ReportingFailure(msg) => write!(f, "reporting failure: {}", msg),
        }
    }
}

/// Outcome of a settlement, returned for `Completed` and `Failed` alike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementResponse {
    /// Transaction ID
    pub transaction_id: Uuid,

    /// Terminal status
    pub status: TransactionStatus,

    /// Corridor used
    pub corridor_id: String,

    /// Amount in source currency
    pub amount_source: Decimal,

    /// Amount in destination currency
    pub amount_destination: Decimal,

    /// Exchange rate applied
    pub exchange_rate: Decimal,

    /// Total fee
    pub fees_total: Decimal,

    /// Corridor processing-time bound (hours)
    pub processing_time_hours: u32,

    /// Compliance tier
    pub compliance_tier: ComplianceTier,

    /// Community benefit score (0-10)
    pub community_benefit_score: u8,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Completed timestamp
    pub completed_at: Option<DateTime<Utc>>,

    /// Why the transaction failed
    pub failure_reason: Option<FailureReason>,

    /// Failed transaction this one resubmits
    pub retry_of: Option<Uuid>,

    /// Warnings raised after the outcome was decided
    pub warnings: Vec<SettlementWarning>,
}

impl SettlementResponse {
    /// Build from a finished transaction
    pub fn new(tx: &Transaction, warnings: Vec<SettlementWarning>) -> Self {
        Self {
            transaction_id: tx.id,
            status: tx.status,
            corridor_id: tx.corridor_id.clone(),
            amount_source: tx.amount_source,
            amount_destination: tx.amount_destination,
            exchange_rate: tx.exchange_rate,
            fees_total: tx.fees_total,
            processing_time_hours: tx.processing_time_hours,
            compliance_tier: tx.compliance_tier,
            community_benefit_score: tx.community_benefit_score,
            created_at: tx.created_at,
            completed_at: tx.completed_at,
            failure_reason: tx.failure_reason.clone(),
            retry_of: tx.retry_of,
            warnings,
        }
    }

    /// Check if the transfer settled
    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    /// Check if the durable write failed
    pub fn persistence_failed(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, SettlementWarning::PersistenceFailure(_)))
    }
}

/// One transfer in a group optimization batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTransaction {
    /// Amount
    pub amount: Decimal,
    /// Sending country
    pub from_country: String,
    /// Receiving country
    pub to_country: String,
    /// Trade type
    pub trade_type: TradeType,
}

/// Batch of transfers attributed to one federation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOptimizationRequest {
    /// Federation ID
    pub federation_id: String,
    /// Transfers
    pub transactions: Vec<GroupTransaction>,
}

/// Discount components applied to a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountBreakdown {
    /// From aggregate volume
    pub volume_discount: Decimal,
    /// From the federation's principle count
    pub membership_bonus: Decimal,
    /// Fixed cultural component
    pub cultural_component: Decimal,
    /// Fixed community component
    pub community_component: Decimal,
    /// Sum of the four components
    pub uncapped_total: Decimal,
    /// Discount actually applied
    pub total_discount: Decimal,
    /// Whether the ceiling reduced the sum
    pub capped: bool,
}

/// Per-transfer fee outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedTransaction {
    /// Input transfer
    pub transaction: GroupTransaction,
    /// Baseline fee
    pub original_fee: Decimal,
    /// Fee after discount
    pub optimized_fee: Decimal,
    /// `original_fee - optimized_fee`
    pub savings: Decimal,
}

/// Group optimization result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOptimizationResult {
    /// Federation ID
    pub federation_id: String,
    /// Aggregate volume
    pub total_volume: Decimal,
    /// Discount components
    pub discount: DiscountBreakdown,
    /// Per-transfer outcomes, in input order
    pub transactions: Vec<OptimizedTransaction>,
    /// Sum of original fees
    pub total_original_fees: Decimal,
    /// Sum of optimized fees
    pub total_optimized_fees: Decimal,
    /// Sum of savings
    pub total_savings: Decimal,
    /// Human-readable description of each component
    pub explanation: Vec<String>,
}

/// Trade instrument kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstrumentType {
    /// Letter of credit
    LetterOfCredit,
    /// Bank guarantee
    BankGuarantee,
    /// Documentary collection
    DocumentaryCollection,
    /// Standby letter of credit
    StandbyLetterOfCredit,
}

impl InstrumentType {
    /// Every instrument type
    pub const ALL: [InstrumentType; 4] = [
        InstrumentType::LetterOfCredit,
        InstrumentType::BankGuarantee,
        InstrumentType::DocumentaryCollection,
        InstrumentType::StandbyLetterOfCredit,
    ];
}

/// Trade instrument issuance request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRequest {
    /// Instrument kind
    pub instrument_type: InstrumentType,
    /// Issuing party
    pub issuing_party: String,
    /// Beneficiary party
    pub beneficiary_party: String,
    /// Face amount (> 0)
    pub amount: Decimal,
    /// Settlement currency
    pub currency: String,
    /// Free-text trade terms
    #[serde(default)]
    pub trade_terms: String,
}

/// Issued trade instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeInstrument {
    /// Instrument ID
    pub id: Uuid,
    /// Instrument kind
    pub instrument_type: InstrumentType,
    /// Issuing party
    pub issuing_party: String,
    /// Beneficiary party
    pub beneficiary_party: String,
    /// Face amount
    pub amount: Decimal,
    /// Settlement currency
    pub currency: String,
    /// Trade terms
    pub trade_terms: String,
    /// Issue date
    pub issue_date: DateTime<Utc>,
    /// `issue_date` plus the validity for the instrument kind
    pub expiry_date: DateTime<Utc>,
    /// Settlement currency is a network member
    pub network_eligible: bool,
}
