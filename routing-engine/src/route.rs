//! Corridor selection

use crate::{Error, Result};
use reference_data::{Corridor, CorridorRegistry};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fee rate at which the fee term of the fallback score reaches zero
const FEE_RATE_CEILING: f64 = 0.05;

/// Processing time at which the time term of the fallback score reaches zero
const PROCESSING_HOURS_CEILING: f64 = 72.0;

const MEMBERSHIP_WEIGHT: f64 = 0.5;
const FEE_WEIGHT: f64 = 0.3;
const TIME_WEIGHT: f64 = 0.2;

/// How a corridor was chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    /// Both countries are members of the corridor
    Direct,

    /// Best-scoring corridor containing at least one of the countries
    Fallback {
        /// Fallback score
        score: f64,
    },
}

/// Outcome of corridor selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDecision {
    /// Selected corridor
    pub corridor_id: String,

    /// Selection kind
    pub kind: RouteKind,
}

impl RouteDecision {
    /// Check if the corridor is shared by both countries
    pub fn is_direct(&self) -> bool {
        matches!(self.kind, RouteKind::Direct)
    }
}

/// Fallback score of a corridor for a country pair
///
/// `0.5 per member country + 0.3 x fee term + 0.2 x time term`, where the
/// fee and time terms are clamped at zero.
pub fn fallback_score(corridor: &Corridor, from_country: &str, to_country: &str) -> f64 {
    let mut score = 0.0;

    if corridor.has_country(from_country) {
        score += MEMBERSHIP_WEIGHT;
    }
    if corridor.has_country(to_country) {
        score += MEMBERSHIP_WEIGHT;
    }

    let fee_rate = corridor.fee_rate.to_f64().unwrap_or(FEE_RATE_CEILING);
    let fee_term = (1.0 - fee_rate / FEE_RATE_CEILING).max(0.0);

    let hours = f64::from(corridor.processing_time_hours);
    let time_term = (1.0 - hours / PROCESSING_HOURS_CEILING).max(0.0);

    score + FEE_WEIGHT * fee_term + TIME_WEIGHT * time_term
}

/// Picks the settlement corridor for a country pair
#[derive(Debug, Clone, Copy)]
pub struct RouteSelector<'a> {
    corridors: &'a CorridorRegistry,
}

impl<'a> RouteSelector<'a> {
    /// Create selector over a corridor registry
    pub fn new(corridors: &'a CorridorRegistry) -> Self {
        Self { corridors }
    }

    /// Select a corridor
    ///
    /// The first corridor containing both countries wins outright. Failing
    /// that, corridors containing at least one of the countries are scored
    /// with [`fallback_score`] and the first with the highest score wins.
    pub fn select_corridor(&self, from_country: &str, to_country: &str) -> Result<RouteDecision> {
        if let Some(corridor) = self
            .corridors
            .all()
            .find(|corridor| corridor.connects(from_country, to_country))
        {
            debug!(corridor = %corridor.id, from_country, to_country, "Direct corridor");
            return Ok(RouteDecision {
                corridor_id: corridor.id.clone(),
                kind: RouteKind::Direct,
            });
        }

        let mut best: Option<(&Corridor, f64)> = None;

        for corridor in self.corridors.all() {
            if !corridor.has_country(from_country) && !corridor.has_country(to_country) {
                continue;
            }

            let score = fallback_score(corridor, from_country, to_country);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((corridor, score)),
            }
        }

        match best {
            Some((corridor, score)) => {
                debug!(
                    corridor = %corridor.id,
                    score,
                    from_country,
                    to_country,
                    "Fallback corridor"
                );
                Ok(RouteDecision {
                    corridor_id: corridor.id.clone(),
                    kind: RouteKind::Fallback { score },
                })
            }
            None => Err(Error::NoCorridorFound {
                from: from_country.to_string(),
                to: to_country.to_string(),
            }),
        }
    }

    /// Resolve a corridor by ID
    pub fn corridor(&self, id: &str) -> Result<&'a Corridor> {
        self.corridors
            .get(id)
            .ok_or_else(|| Error::CorridorNotFound(id.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    pub(crate) fn corridor(
        id: &str,
        countries: &[&str],
        fee_rate: Decimal,
        hours: u32,
    ) -> Corridor {
        Corridor {
            id: id.to_string(),
            name: id.to_string(),
            member_countries: countries.iter().map(|c| c.to_string()).collect(),
            member_currencies: Default::default(),
            fee_rate,
            processing_time_hours: hours,
            regulatory_framework: String::new(),
            network_principles: vec![],
        }
    }

    fn registry() -> CorridorRegistry {
        CorridorRegistry::new(vec![
            corridor("EAC", &["KE", "UG", "TZ"], dec!(0.015), 24),
            corridor("COMESA", &["KE", "UG", "EG"], dec!(0.025), 72),
            corridor("PAPSS", &["KE", "NG", "EG"], dec!(0.01), 6),
        ])
        .unwrap()
    }

    #[test]
    fn test_direct_first_match() {
        let registry = registry();
        let selector = RouteSelector::new(&registry);

        // KE and UG share EAC and COMESA; EAC is first
        let decision = selector.select_corridor("KE", "UG").unwrap();
        assert_eq!(decision.corridor_id, "EAC");
        assert!(decision.is_direct());

        let decision = selector.select_corridor("EG", "NG").unwrap();
        assert_eq!(decision.corridor_id, "PAPSS");
    }

    #[test]
    fn test_fallback_best_score() {
        let registry = registry();
        let selector = RouteSelector::new(&registry);

        // TZ is only in EAC; MA is nowhere
        let decision = selector.select_corridor("TZ", "MA").unwrap();
        assert_eq!(decision.corridor_id, "EAC");
        assert!(!decision.is_direct());

        // KE in all three, PAPSS is cheapest and fastest
        let decision = selector.select_corridor("KE", "MA").unwrap();
        assert_eq!(decision.corridor_id, "PAPSS");
        match decision.kind {
            RouteKind::Fallback { score } => {
                let expected = 0.5 + 0.3 * (1.0 - 0.01 / 0.05) + 0.2 * (1.0 - 6.0 / 72.0);
                assert!((score - expected).abs() < 1e-9);
            }
            RouteKind::Direct => panic!("expected fallback"),
        }
    }

    #[test]
    fn test_fallback_tie_resolves_to_first() {
        let registry = CorridorRegistry::new(vec![
            corridor("A", &["KE"], dec!(0.02), 24),
            corridor("B", &["KE"], dec!(0.02), 24),
        ])
        .unwrap();
        let selector = RouteSelector::new(&registry);

        assert_eq!(selector.select_corridor("KE", "MA").unwrap().corridor_id, "A");
    }

    #[test]
    fn test_no_corridor() {
        let registry = registry();
        let selector = RouteSelector::new(&registry);

        assert!(matches!(
            selector.select_corridor("MA", "US"),
            Err(Error::NoCorridorFound { from, to }) if from == "MA" && to == "US"
        ));
    }

    #[test]
    fn test_terms_clamped() {
        // Expensive and slow: both terms clamp at zero
        let expensive = corridor("X", &["KE"], dec!(0.09), 240);
        assert_eq!(fallback_score(&expensive, "KE", "MA"), 0.5);
    }

    #[test]
    fn test_corridor_lookup() {
        let registry = registry();
        let selector = RouteSelector::new(&registry);

        assert_eq!(selector.corridor("COMESA").unwrap().processing_time_hours, 72);
        assert!(matches!(
            selector.corridor("NOPE"),
            Err(Error::CorridorNotFound(_))
        ));
    }
}
