//! Trade instrument issuance

use crate::config::InstrumentConfig;
use crate::types::{InstrumentRequest, InstrumentType, TradeInstrument};
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use reference_data::CurrencyRegistry;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

impl InstrumentConfig {
    /// Validity for an instrument kind, in days
    pub fn validity_days(&self, instrument_type: InstrumentType) -> u32 {
        match instrument_type {
            InstrumentType::LetterOfCredit => self.letter_of_credit_days,
            InstrumentType::BankGuarantee => self.bank_guarantee_days,
            InstrumentType::DocumentaryCollection => self.documentary_collection_days,
            InstrumentType::StandbyLetterOfCredit => self.standby_letter_of_credit_days,
        }
    }
}

/// Issues trade instruments against the currency registry
#[derive(Debug, Clone, Copy)]
pub struct InstrumentIssuer<'a> {
    currencies: &'a CurrencyRegistry,
    config: &'a InstrumentConfig,
}

impl<'a> InstrumentIssuer<'a> {
    /// Create issuer
    pub fn new(currencies: &'a CurrencyRegistry, config: &'a InstrumentConfig) -> Self {
        Self { currencies, config }
    }

    /// Issue an instrument dated now
    pub fn issue(&self, request: &InstrumentRequest) -> Result<TradeInstrument> {
        self.issue_at(request, Utc::now())
    }

    /// Issue an instrument with an explicit issue date
    pub fn issue_at(
        &self,
        request: &InstrumentRequest,
        issue_date: DateTime<Utc>,
    ) -> Result<TradeInstrument> {
        if request.amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount(format!(
                "instrument amount must be positive, got {}",
                request.amount
            )));
        }

        let currency = self
            .currencies
            .get(&request.currency)
            .ok_or_else(|| Error::UnsupportedCurrency(request.currency.clone()))?;

        let days = self.config.validity_days(request.instrument_type);
        let expiry_date = issue_date + Duration::days(i64::from(days));

        let instrument = TradeInstrument {
            id: Uuid::now_v7(),
            instrument_type: request.instrument_type,
            issuing_party: request.issuing_party.clone(),
            beneficiary_party: request.beneficiary_party.clone(),
            amount: request.amount,
            currency: currency.code.clone(),
            trade_terms: request.trade_terms.clone(),
            issue_date,
            expiry_date,
            network_eligible: currency.network_member,
        };

        info!(
            instrument_id = %instrument.id,
            instrument_type = ?instrument.instrument_type,
            currency = %instrument.currency,
            expiry = %instrument.expiry_date,
            "Trade instrument issued"
        );

        Ok(instrument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reference_data::Currency;
    use rust_decimal_macros::dec;

    fn registry() -> CurrencyRegistry {
        CurrencyRegistry::new(vec![
            Currency {
                code: "GHS".to_string(),
                country: "GH".to_string(),
                reference_rate: dec!(0.066),
                network_member: true,
                volatility_index: 0.25,
            },
            Currency {
                code: "ETB".to_string(),
                country: "ET".to_string(),
                reference_rate: dec!(0.0083),
                network_member: false,
                volatility_index: 0.26,
            },
        ])
        .unwrap()
    }

    fn request(instrument_type: InstrumentType, currency: &str) -> InstrumentRequest {
        InstrumentRequest {
            instrument_type,
            issuing_party: "Accra Commercial Bank".to_string(),
            beneficiary_party: "Kumasi Cocoa Cooperative".to_string(),
            amount: dec!(250000),
            currency: currency.to_string(),
            trade_terms: "FOB Tema".to_string(),
        }
    }

    #[test]
    fn test_expiry_by_type() {
        let registry = registry();
        let config = InstrumentConfig::default();
        let issuer = InstrumentIssuer::new(&registry, &config);
        let issued = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        let expected = [
            (InstrumentType::LetterOfCredit, 90),
            (InstrumentType::BankGuarantee, 365),
            (InstrumentType::DocumentaryCollection, 30),
            (InstrumentType::StandbyLetterOfCredit, 180),
        ];

        for (instrument_type, days) in expected {
            let instrument = issuer
                .issue_at(&request(instrument_type, "GHS"), issued)
                .unwrap();
            assert_eq!(instrument.expiry_date - instrument.issue_date, Duration::days(days));
        }
    }

    #[test]
    fn test_eligibility_follows_membership() {
        let registry = registry();
        let config = InstrumentConfig::default();
        let issuer = InstrumentIssuer::new(&registry, &config);

        let member = issuer
            .issue(&request(InstrumentType::LetterOfCredit, "GHS"))
            .unwrap();
        assert!(member.network_eligible);

        let outsider = issuer
            .issue(&request(InstrumentType::LetterOfCredit, "ETB"))
            .unwrap();
        assert!(!outsider.network_eligible);
    }

    #[test]
    fn test_rejections() {
        let registry = registry();
        let config = InstrumentConfig::default();
        let issuer = InstrumentIssuer::new(&registry, &config);

        assert!(matches!(
            issuer.issue(&request(InstrumentType::BankGuarantee, "XYZ")),
            Err(Error::UnsupportedCurrency(_))
        ));

        let mut zero = request(InstrumentType::BankGuarantee, "GHS");
        zero.amount = Decimal::ZERO;
        assert!(matches!(issuer.issue(&zero), Err(Error::InvalidAmount(_))));
    }
}
