use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ComplianceError {
    #[error("Unknown country: {0}")]
    UnknownCountry(String),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Amount out of range: {0}")]
    AmountOverflow(String),
}

pub type Result<T> = std::result::Result<T, ComplianceError>;
