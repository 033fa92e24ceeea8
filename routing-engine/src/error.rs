//! Error types for routing engine

use thiserror::Error;

/// Routing engine error
#[derive(Debug, Error)]
pub enum Error {
    /// Currency code not in registry
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

    /// Amount too large to price
    #[error("Amount out of range: {0}")]
    AmountOverflow(String),

    /// Corridor ID not in registry
    #[error("Corridor not found: {0}")]
    CorridorNotFound(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
