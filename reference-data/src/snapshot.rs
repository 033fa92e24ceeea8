//! Validated, immutable reference snapshot

use crate::registry::{CorridorRegistry, CurrencyRegistry, FederationRegistry};
use crate::types::ReferenceData;
use crate::{Error, Result};
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{debug, info};

/// Currency, corridor and federation registries loaded together
///
/// Built once from [`ReferenceData`] and never mutated afterwards. Every
/// component that needs reference data receives a shared snapshot rather
/// than reaching into process-wide state.
#[derive(Debug, Clone)]
pub struct ReferenceSnapshot {
    currencies: CurrencyRegistry,
    corridors: CorridorRegistry,
    federations: FederationRegistry,
}

impl ReferenceSnapshot {
    /// Validate raw data and build the registries
    pub fn new(data: ReferenceData) -> Result<Self> {
        validate(&data)?;

        let snapshot = Self {
            currencies: CurrencyRegistry::new(data.currencies)?,
            corridors: CorridorRegistry::new(data.corridors)?,
            federations: FederationRegistry::new(data.federations)?,
        };

        // Corridor currencies must resolve
        for corridor in snapshot.corridors.all() {
            for code in &corridor.member_currencies {
                if snapshot.currencies.get(code).is_none() {
                    return Err(Error::Invalid(format!(
                        "corridor '{}' references unknown currency '{}'",
                        corridor.id, code
                    )));
                }
            }
        }

        debug!(
            currencies = snapshot.currencies.len(),
            corridors = snapshot.corridors.len(),
            federations = snapshot.federations.len(),
            "Reference snapshot built"
        );

        Ok(snapshot)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let data: ReferenceData = toml::from_str(input)?;
        Self::new(data)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let snapshot = Self::from_toml_str(&content)?;

        info!(path = %path.display(), "Reference data loaded");
        Ok(snapshot)
    }

    /// Currency registry
    pub fn currencies(&self) -> &CurrencyRegistry {
        &self.currencies
    }

    /// Corridor registry
    pub fn corridors(&self) -> &CorridorRegistry {
        &self.corridors
    }

    /// Federation registry
    pub fn federations(&self) -> &FederationRegistry {
        &self.federations
    }
}

fn validate(data: &ReferenceData) -> Result<()> {
    for currency in &data.currencies {
        if currency.reference_rate <= Decimal::ZERO {
            return Err(Error::Invalid(format!(
                "currency '{}' has non-positive reference rate {}",
                currency.code, currency.reference_rate
            )));
        }
        if currency.volatility_index.is_nan() || currency.volatility_index < 0.0 {
            return Err(Error::Invalid(format!(
                "currency '{}' has invalid volatility index {}",
                currency.code, currency.volatility_index
            )));
        }
    }

    for corridor in &data.corridors {
        if corridor.fee_rate < Decimal::ZERO || corridor.fee_rate >= Decimal::ONE {
            return Err(Error::Invalid(format!(
                "corridor '{}' fee rate {} outside [0, 1)",
                corridor.id, corridor.fee_rate
            )));
        }
        if corridor.processing_time_hours == 0 {
            return Err(Error::Invalid(format!(
                "corridor '{}' has zero processing time bound",
                corridor.id
            )));
        }
        if corridor.member_countries.is_empty() {
            return Err(Error::Invalid(format!(
                "corridor '{}' has no member countries",
                corridor.id
            )));
        }
    }

    Ok(())
}
