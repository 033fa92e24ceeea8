//! Reference data for the corridor settlement engine
//!
//! Currencies, corridors and federations are loaded from TOML, validated
//! once, and exposed as an immutable [`ReferenceSnapshot`]. A
//! [`SnapshotHandle`] lets a running node swap in a new snapshot without
//! disturbing settlements already in flight.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod error;
pub mod handle;
pub mod registry;
pub mod snapshot;
pub mod types;

pub use error::{Error, Result};
pub use handle::SnapshotHandle;
pub use registry::{CorridorRegistry, CurrencyRegistry, FederationRegistry, Keyed, Registry};
pub use snapshot::ReferenceSnapshot;
pub use types::{Corridor, Currency, Federation, ReferenceData};
