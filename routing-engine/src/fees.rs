//! Settlement pricing: exchange rate, destination amount, fees

use crate::{Error, Result};
use reference_data::{Corridor, Currency, CurrencyRegistry};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fee discount when both currencies are network members
pub const NETWORK_DISCOUNT_RATE: Decimal = Decimal::from_parts(25, 0, 0, false, 2);

/// Priced settlement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementQuote {
    /// Source to destination exchange rate
    pub exchange_rate: Decimal,

    /// `amount x exchange_rate`; fees are not deducted
    pub amount_destination: Decimal,

    /// `amount x corridor fee rate`
    pub base_fee: Decimal,

    /// Network-membership discount
    pub discount: Decimal,

    /// `base_fee - discount`
    pub fees_total: Decimal,
}

impl SettlementQuote {
    /// Check if the membership discount was applied
    pub fn discounted(&self) -> bool {
        !self.discount.is_zero()
    }
}

/// Prices settlements against the currency registry
#[derive(Debug, Clone, Copy)]
pub struct FeeCalculator<'a> {
    currencies: &'a CurrencyRegistry,
}

impl<'a> FeeCalculator<'a> {
    /// Create calculator over a currency registry
    pub fn new(currencies: &'a CurrencyRegistry) -> Self {
        Self { currencies }
    }

    /// Resolve a currency, failing with `UnsupportedCurrency`
    pub fn currency(&self, code: &str) -> Result<&'a Currency> {
        self.currencies
            .get(code)
            .ok_or_else(|| Error::UnsupportedCurrency(code.to_string()))
    }

    /// Reference-rate cross rate; self pairs and undefined rates are 1
    pub fn exchange_rate(&self, from_currency: &str, to_currency: &str) -> Result<Decimal> {
        let from = self.currency(from_currency)?;
        let to = self.currency(to_currency)?;

        if from.code == to.code {
            return Ok(Decimal::ONE);
        }

        Ok(from
            .reference_rate
            .checked_div(to.reference_rate)
            .filter(|rate| !rate.is_zero())
            .unwrap_or(Decimal::ONE))
    }

    /// Price a settlement through `corridor`
    pub fn compute_settlement(
        &self,
        from_currency: &str,
        to_currency: &str,
        amount: Decimal,
        corridor: &Corridor,
    ) -> Result<SettlementQuote> {
        let from = self.currency(from_currency)?;
        let to = self.currency(to_currency)?;
        let exchange_rate = self.exchange_rate(from_currency, to_currency)?;

        let overflow = || Error::AmountOverflow(amount.to_string());

        let amount_destination = amount.checked_mul(exchange_rate).ok_or_else(overflow)?;
        let base_fee = amount.checked_mul(corridor.fee_rate).ok_or_else(overflow)?;
        let discount = if from.network_member && to.network_member {
            base_fee
                .checked_mul(NETWORK_DISCOUNT_RATE)
                .ok_or_else(overflow)?
        } else {
            Decimal::ZERO
        };

        Ok(SettlementQuote {
            exchange_rate,
            amount_destination,
            base_fee,
            discount,
            fees_total: base_fee - discount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::tests::corridor;
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

    fn registry() -> CurrencyRegistry {
        CurrencyRegistry::new(vec![
            currency("KES", "KE", dec!(0.0077), true),
            currency("UGX", "UG", dec!(0.00027), true),
            currency("EGP", "EG", dec!(0.020), false),
            currency("USD", "US", dec!(1), false),
        ])
        .unwrap()
    }

    #[test]
    fn test_overflowing_amount_rejected() {
        let registry = registry();
        let calculator = FeeCalculator::new(&registry);
        let eac = corridor("EAC", &["KE", "UG"], dec!(0.015), 24);

        // KES -> UGX is ~28.5, so the destination amount exceeds Decimal::MAX
        let huge = Decimal::from_i128_with_scale(10_000_000_000_000_000_000_000_000_000, 0);
        assert!(matches!(
            calculator.compute_settlement("KES", "UGX", huge, &eac),
            Err(Error::AmountOverflow(_))
        ));

        assert!(calculator
            .compute_settlement("UGX", "KES", huge, &eac)
            .is_ok());
    }

    #[test]
    fn test_discount_constant() {
        assert_eq!(NETWORK_DISCOUNT_RATE, dec!(0.25));
    }

    #[test]
    fn test_both_members_discounted() {
        let registry = registry();
        let calculator = FeeCalculator::new(&registry);
        let eac = corridor("EAC", &["KE", "UG"], dec!(0.02), 24);

        let quote = calculator
            .compute_settlement("KES", "UGX", dec!(1000), &eac)
            .unwrap();
        assert_eq!(quote.base_fee, dec!(20));
        assert_eq!(quote.fees_total, dec!(15));
        assert!(quote.discounted());
    }

    #[test]
    fn test_one_member_not_discounted() {
        let registry = registry();
        let calculator = FeeCalculator::new(&registry);
        let comesa = corridor("COMESA", &["KE", "EG"], dec!(0.02), 72);

        let quote = calculator
            .compute_settlement("KES", "EGP", dec!(1000), &comesa)
            .unwrap();
        assert_eq!(quote.fees_total, dec!(20));
        assert!(!quote.discounted());
    }

    #[test]
    fn test_exchange_rate() {
        let registry = registry();
        let calculator = FeeCalculator::new(&registry);

        assert_eq!(calculator.exchange_rate("KES", "KES").unwrap(), Decimal::ONE);
        assert_eq!(calculator.exchange_rate("USD", "EGP").unwrap(), dec!(50));

        let quote = calculator
            .compute_settlement("USD", "EGP", dec!(10), &corridor("X", &["US"], dec!(0.01), 6))
            .unwrap();
        assert_eq!(quote.amount_destination, dec!(500));
    }

    #[test]
    fn test_unsupported_currency() {
        let registry = registry();
        let calculator = FeeCalculator::new(&registry);
        let eac = corridor("EAC", &["KE", "UG"], dec!(0.015), 24);

        assert!(matches!(
            calculator.compute_settlement("KES", "XYZ", dec!(1), &eac),
            Err(Error::UnsupportedCurrency(code)) if code == "XYZ"
        ));
        assert!(matches!(
            calculator.exchange_rate("ABC", "KES"),
            Err(Error::UnsupportedCurrency(code)) if code == "ABC"
        ));
    }
}
