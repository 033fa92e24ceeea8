//! Settlement Engine
//!
//! Routes, prices, classifies and settles cross-border transfers over a
//! registry of regional corridors.
//!
//! # Architecture
//!
//! Each request runs through its own [`SettlementWorkflow`]:
//!
//! 1. **Intake**: corridor selection, fees and compliance tier
//! 2. **Stages**: `Initiated → Processing → ComplianceCheck → CurrencyExchange → Routing`
//! 3. **Attempt**: one call to the [`SettlementBackend`], bounded by a
//!    timeout and a cancellation token
//! 4. **Finish**: `Completed` or `Failed`, persisted once and reported once
//!
//! Requests share nothing mutable except the transaction store. Reference
//! data is an immutable snapshot swapped as a whole on reload.
//!
//! # Example
//!
//! ```no_run
//! use settlement::{Config, SettlementEngine, SettlementRequest};
//! use ledger_core::{PaymentMethod, TradeType};
//! use rust_decimal::Decimal;
//!
//! #[tokio::main]
//! async fn main() -> settlement::Result<()> {
//!     let engine = SettlementEngine::new(Config::default()).await?;
//!
//!     let response = engine
//!         .settle(SettlementRequest {
//!             from_country: "KE".to_string(),
//!             to_country: "UG".to_string(),
//!             from_currency: "KES".to_string(),
//!             to_currency: "UGX".to_string(),
//!             amount: Decimal::from(50_000),
//!             trade_type: TradeType::GoodsExport,
//!             payment_method: PaymentMethod::WireTransfer,
//!             context: None,
//!             retry_of: None,
//!         })
//!         .await?;
//!
//!     println!("{} via {}: {}", response.transaction_id, response.corridor_id, response.status);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod group;
pub mod instrument;
pub mod metrics;
pub mod types;
pub mod workflow;

// Re-exports
pub use backend::{
    AttemptOutcome, ProbabilisticBackend, ScriptedAttempt, ScriptedBackend, SettlementBackend,
};
pub use config::{Config, GroupConfig, InstrumentConfig, SuccessRates, WorkflowConfig};
pub use engine::SettlementEngine;
pub use error::{Error, Result};
pub use group::GroupOptimizer;
pub use instrument::InstrumentIssuer;
pub use metrics::{ReportingSink, SettlementMetrics};
pub use types::*;
pub use workflow::{community_benefit_score, SettlementWorkflow};
