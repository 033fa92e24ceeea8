//! Reference records: currencies, corridors, federations

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Currency metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    /// Currency code (e.g. "KES")
    pub code: String,

    /// Issuing country code
    pub country: String,

    /// Value of one unit in the common anchor unit
    pub reference_rate: Decimal,

    /// Participates in the preferential settlement network
    #[serde(default)]
    pub network_member: bool,

    /// Volatility index (>= 0)
    #[serde(default)]
    pub volatility_index: f64,
}

/// Settlement corridor spanning a fixed set of countries and currencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corridor {
    /// Unique corridor ID
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Member country codes
    pub member_countries: BTreeSet<String>,

    /// Member currency codes
    #[serde(default)]
    pub member_currencies: BTreeSet<String>,

    /// Fee as a fraction of the amount, in [0, 1)
    pub fee_rate: Decimal,

    /// Processing-time bound in hours (> 0)
    pub processing_time_hours: u32,

    /// Regulatory framework label
    #[serde(default)]
    pub regulatory_framework: String,

    /// Principles the network subscribes to (reporting only)
    #[serde(default)]
    pub network_principles: Vec<String>,
}

impl Corridor {
    /// Check country membership
    pub fn has_country(&self, country: &str) -> bool {
        self.member_countries.contains(country)
    }

    /// Check currency membership
    pub fn has_currency(&self, code: &str) -> bool {
        self.member_currencies.contains(code)
    }

    /// Check that both countries are members
    pub fn connects(&self, from_country: &str, to_country: &str) -> bool {
        self.has_country(from_country) && self.has_country(to_country)
    }

    /// Processing-time bound as a duration
    pub fn processing_time_bound(&self) -> Duration {
        Duration::hours(i64::from(self.processing_time_hours))
    }
}

/// Group of participants eligible for batch fee optimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Federation {
    /// Unique federation ID
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Named principles; the count drives the membership bonus
    #[serde(default)]
    pub principles: Vec<String>,

    /// Member country codes
    #[serde(default)]
    pub member_countries: BTreeSet<String>,
}

/// Raw reference data as loaded from configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    /// Currencies, in registry order
    #[serde(default)]
    pub currencies: Vec<Currency>,

    /// Corridors, in registry order
    #[serde(default)]
    pub corridors: Vec<Corridor>,

    /// Federations, in registry order
    #[serde(default)]
    pub federations: Vec<Federation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_corridor_membership() {
        let corridor = Corridor {
            id: "EAC".to_string(),
            name: "East African Community".to_string(),
            member_countries: ["KE", "UG", "TZ"].iter().map(|c| c.to_string()).collect(),
            member_currencies: ["KES", "UGX"].iter().map(|c| c.to_string()).collect(),
            fee_rate: dec!(0.015),
            processing_time_hours: 24,
            regulatory_framework: "EAPS".to_string(),
            network_principles: vec![],
        };

        assert!(corridor.connects("KE", "UG"));
        assert!(!corridor.connects("KE", "NG"));
        assert!(corridor.has_currency("KES"));
        assert!(!corridor.has_currency("TZS"));
        assert_eq!(corridor.processing_time_bound(), Duration::hours(24));
    }
}
