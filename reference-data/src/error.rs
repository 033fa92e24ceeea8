//! Error types for reference data

use thiserror::Error;

/// Reference data error
#[derive(Debug, Error)]
pub enum Error {
    /// Currency code not in registry
    #[error("Currency not found: {0}")]
    CurrencyNotFound(String),

    /// Corridor ID not in registry
    #[error("Corridor not found: {0}")]
    CorridorNotFound(String),

    /// Federation ID not in registry
    #[error("Federation not found: {0}")]
    FederationNotFound(String),

    /// Snapshot failed validation
    #[error("Invalid reference data: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("Failed to parse reference data: {0}")]
    Parse(#[from] toml::de::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
