pub mod classifier;
pub mod error;

pub use classifier::{ComplianceClassifier, ComplianceDecision, ComplianceRule, ENHANCED_THRESHOLD};
pub use error::{ComplianceError, Result};
pub use ledger_core::ComplianceTier;
