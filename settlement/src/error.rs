//! Error types for the settlement engine

use thiserror::Error;

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, Error>;

/// Settlement errors
///
/// Request rejections (`InvalidAmount`, `UnsupportedCurrency`,
/// `NoCorridorFound`) are raised before any transaction exists. A declined
/// settlement is not an error: it is a `Failed` transaction in the response.
#[derive(Error, Debug)]
pub enum Error {
    /// Amount is zero or negative
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Currency code not in the registry
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// No corridor scores for the country pair
    #[error("No corridor found from {from} to {to}")]
    NoCorridorFound {
        /// Source country
        from: String,
        /// Destination country
        to: String,
    },

    /// Federation ID not in the registry
    #[error("Federation not found: {0}")]
    FederationNotFound(String),

    /// Group optimization called with no transactions
    #[error("Empty batch")]
    EmptyBatch,

    /// Settlement backend error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Reference data error
    #[error("Reference data error: {0}")]
    ReferenceData(#[from] reference_data::Error),

    /// Ledger error
    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger_core::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Short label used in metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidAmount(_) => "invalid_amount",
            Error::UnsupportedCurrency(_) => "unsupported_currency",
            Error::NoCorridorFound { .. } => "no_corridor_found",
            Error::FederationNotFound(_) => "federation_not_found",
            Error::EmptyBatch => "empty_batch",
            Error::Backend(_) => "backend",
            Error::ReferenceData(_) => "reference_data",
            Error::Ledger(_) => "ledger",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Other(_) => "other",
        }
    }
}

impl From<routing_engine::Error> for Error {
    fn from(err: routing_engine::Error) -> Self {
        match err {
            routing_engine::Error::UnsupportedCurrency(code) => Error::UnsupportedCurrency(code),
            routing_engine::Error::NoCorridorFound { from, to } => {
                Error::NoCorridorFound { from, to }
            }
            routing_engine::Error::CorridorNotFound(id) => {
                Error::ReferenceData(reference_data::Error::CorridorNotFound(id))
            }
            routing_engine::Error::AmountOverflow(amount) => {
                Error::InvalidAmount(format!("amount {} is out of range", amount))
            }
        }
    }
}

impl From<compliance_service::ComplianceError> for Error {
    fn from(err: compliance_service::ComplianceError) -> Self {
        match err {
            compliance_service::ComplianceError::UnsupportedCurrency(code) => {
                Error::UnsupportedCurrency(code)
            }
            compliance_service::ComplianceError::AmountOverflow(amount) => {
                Error::InvalidAmount(format!("amount {} is out of range", amount))
            }
            compliance_service::ComplianceError::UnknownCountry(country) => {
                Error::Other(format!("Unknown country: {}", country))
            }
        }
    }
}
