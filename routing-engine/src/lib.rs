//! Routing Engine for the corridor settlement rail
//!
//! Corridor selection and settlement pricing over a reference snapshot

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod fees;
pub mod route;

pub use error::{Error, Result};
pub use fees::{FeeCalculator, SettlementQuote, NETWORK_DISCOUNT_RATE};
pub use route::{fallback_score, RouteDecision, RouteKind, RouteSelector};
