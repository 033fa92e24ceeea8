use crate::error::{ComplianceError, Result};
use ledger_core::{ComplianceTier, TradeType};
use reference_data::{CorridorRegistry, Currency, CurrencyRegistry};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reporting-unit amount above which a transfer needs enhanced checks
pub const ENHANCED_THRESHOLD: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// Which rule decided the tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceRule {
    AmountThreshold,
    NoSharedCorridor,
    NetworkMembers,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceDecision {
    pub tier: ComplianceTier,
    pub rule: ComplianceRule,
    pub reporting_amount: Decimal,
}

/// ComplianceClassifier assigns a compliance tier to a transfer.
///
/// Rules are checked in order and the first match decides:
/// 1. reporting amount above the threshold -> Enhanced
/// 2. countries share no corridor -> Strict
/// 3. both primary currencies are network members -> NetworkOptimized
/// 4. otherwise -> Basic
#[derive(Debug, Clone, Copy)]
pub struct ComplianceClassifier<'a> {
    currencies: &'a CurrencyRegistry,
    corridors: &'a CorridorRegistry,
    enhanced_threshold: Decimal,
}

impl<'a> ComplianceClassifier<'a> {
    pub fn new(currencies: &'a CurrencyRegistry, corridors: &'a CorridorRegistry) -> Self {
        Self {
            currencies,
            corridors,
            enhanced_threshold: ENHANCED_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: Decimal) -> Self {
        self.enhanced_threshold = threshold;
        self
    }

    /// Convert an amount into the common reporting unit
    pub fn reporting_amount(&self, amount: Decimal, currency: &str) -> Result<Decimal> {
        let currency = self
            .currencies
            .get(currency)
            .ok_or_else(|| ComplianceError::UnsupportedCurrency(currency.to_string()))?;
        amount
            .checked_mul(currency.reference_rate)
            .ok_or_else(|| ComplianceError::AmountOverflow(amount.to_string()))
    }

    /// First registered currency issued by `country`
    pub fn primary_currency(&self, country: &str) -> Result<&'a Currency> {
        self.currencies
            .primary_for_country(country)
            .ok_or_else(|| ComplianceError::UnknownCountry(country.to_string()))
    }

    /// Classify an amount already expressed in reporting units
    pub fn classify(
        &self,
        reporting_amount: Decimal,
        from_country: &str,
        to_country: &str,
        _trade_type: TradeType,
    ) -> ComplianceDecision {
        let rule = if reporting_amount > self.enhanced_threshold {
            ComplianceRule::AmountThreshold
        } else if !self.corridors.share_corridor(from_country, to_country) {
            ComplianceRule::NoSharedCorridor
        } else if self.is_member_country(from_country) && self.is_member_country(to_country) {
            ComplianceRule::NetworkMembers
        } else {
            ComplianceRule::Default
        };

        let tier = match rule {
            ComplianceRule::AmountThreshold => ComplianceTier::Enhanced,
            ComplianceRule::NoSharedCorridor => ComplianceTier::Strict,
            ComplianceRule::NetworkMembers => ComplianceTier::NetworkOptimized,
            ComplianceRule::Default => ComplianceTier::Basic,
        };

        debug!(
            from_country,
            to_country,
            %reporting_amount,
            ?tier,
            ?rule,
            "Compliance tier assigned"
        );

        ComplianceDecision {
            tier,
            rule,
            reporting_amount,
        }
    }

    /// Convert `amount` from `from_currency` and classify
    pub fn classify_transfer(
        &self,
        amount: Decimal,
        from_currency: &str,
        from_country: &str,
        to_country: &str,
        trade_type: TradeType,
    ) -> Result<ComplianceDecision> {
        let reporting_amount = self.reporting_amount(amount, from_currency)?;
        Ok(self.classify(reporting_amount, from_country, to_country, trade_type))
    }

    fn is_member_country(&self, country: &str) -> bool {
        // A country with no registered currency is not a member
        self.primary_currency(country)
            .map(|currency| currency.network_member)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reference_data::{Corridor, ReferenceSnapshot};
    use rust_decimal_macros::dec;

    fn currency(code: &str, country: &str, rate: Decimal, member: bool) -> Currency {
        Currency {
            code: code.to_string(),
            country: country.to_string(),
            reference_rate: rate,
            network_member: member,
            volatility_index: 0.0,
        }
    }

    fn corridor(id: &str, countries: &[&str]) -> Corridor {
        Corridor {
            id: id.to_string(),
            name: String::new(),
            member_countries: countries.iter().map(|c| c.to_string()).collect(),
            member_currencies: Default::default(),
            fee_rate: dec!(0.015),
            processing_time_hours: 24,
            regulatory_framework: String::new(),
            network_principles: vec![],
        }
    }

    fn snapshot() -> ReferenceSnapshot {
        ReferenceSnapshot::new(reference_data::ReferenceData {
            currencies: vec![
                currency("KES", "KE", dec!(1), true),
                currency("UGX", "UG", dec!(1), true),
                currency("EGP", "EG", dec!(0.02), false),
                currency("NGN", "NG", dec!(0.00065), true),
            ],
            corridors: vec![corridor("EAC", &["KE", "UG"]), corridor("COMESA", &["KE", "EG"])],
            federations: vec![],
        })
        .unwrap()
    }

    #[test]
    fn test_amount_short_circuits() {
        let snapshot = snapshot();
        let classifier = ComplianceClassifier::new(snapshot.currencies(), snapshot.corridors());

        let decision = classifier.classify(dec!(150000), "KE", "UG", TradeType::GoodsExport);
        assert_eq!(decision.tier, ComplianceTier::Enhanced);
        assert_eq!(decision.rule, ComplianceRule::AmountThreshold);

        // Exactly at the threshold is not above it
        let decision = classifier.classify(dec!(100000), "KE", "UG", TradeType::GoodsExport);
        assert_eq!(decision.tier, ComplianceTier::NetworkOptimized);
    }

    #[test]
    fn test_reporting_amount_overflow() {
        let currencies =
            reference_data::CurrencyRegistry::new(vec![currency("XAU", "XA", dec!(2400), false)])
                .unwrap();
        let corridors =
            reference_data::CorridorRegistry::new(vec![corridor("EAC", &["KE"])]).unwrap();
        let classifier = ComplianceClassifier::new(&currencies, &corridors);

        assert!(matches!(
            classifier.reporting_amount(Decimal::MAX, "XAU"),
            Err(ComplianceError::AmountOverflow(_))
        ));
        assert_eq!(classifier.reporting_amount(dec!(2), "XAU").unwrap(), dec!(4800));
    }

    #[test]
    fn test_no_shared_corridor_is_strict() {
        let snapshot = snapshot();
        let classifier = ComplianceClassifier::new(snapshot.currencies(), snapshot.corridors());

        let decision = classifier.classify(dec!(10), "UG", "NG", TradeType::Remittance);
        assert_eq!(decision.tier, ComplianceTier::Strict);
    }

    #[test]
    fn test_non_member_is_basic() {
        let snapshot = snapshot();
        let classifier = ComplianceClassifier::new(snapshot.currencies(), snapshot.corridors());

        let decision = classifier.classify(dec!(10), "KE", "EG", TradeType::Investment);
        assert_eq!(decision.tier, ComplianceTier::Basic);
        assert_eq!(decision.rule, ComplianceRule::Default);
    }

    #[test]
    fn test_transfer_converts_to_reporting_units() {
        let snapshot = snapshot();
        let classifier = ComplianceClassifier::new(snapshot.currencies(), snapshot.corridors());

        // 6,000,000 EGP x 0.02 = 120,000 reporting units
        let decision = classifier
            .classify_transfer(dec!(6000000), "EGP", "EG", "KE", TradeType::GoodsImport)
            .unwrap();
        assert_eq!(decision.reporting_amount, dec!(120000));
        assert_eq!(decision.tier, ComplianceTier::Enhanced);

        assert!(matches!(
            classifier.classify_transfer(dec!(1), "XYZ", "EG", "KE", TradeType::GoodsImport),
            Err(ComplianceError::UnsupportedCurrency(_))
        ));
    }

    #[test]
    fn test_custom_threshold() {
        let snapshot = snapshot();
        let classifier = ComplianceClassifier::new(snapshot.currencies(), snapshot.corridors())
            .with_threshold(dec!(500));

        let decision = classifier.classify(dec!(501), "KE", "UG", TradeType::GoodsExport);
        assert_eq!(decision.tier, ComplianceTier::Enhanced);
    }

    #[test]
    fn test_primary_currency() {
        let snapshot = snapshot();
        let classifier = ComplianceClassifier::new(snapshot.currencies(), snapshot.corridors());

        assert_eq!(classifier.primary_currency("EG").unwrap().code, "EGP");
        assert!(matches!(
            classifier.primary_currency("MA"),
            Err(ComplianceError::UnknownCountry(country)) if country == "MA"
        ));
    }
}
