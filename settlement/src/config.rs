//! Configuration for the settlement engine

use ledger_core::PaymentMethod;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Settlement engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// TOML file with currencies, corridors and federations
    pub reference_data_path: PathBuf,

    /// Transaction store configuration
    pub ledger: ledger_core::Config,

    /// Workflow configuration
    pub workflow: WorkflowConfig,

    /// Group optimization configuration
    pub group: GroupConfig,

    /// Trade instrument configuration
    pub instruments: InstrumentConfig,

    /// Emit JSON log lines
    pub log_json: bool,

    /// Metrics listen address
    pub metrics_listen_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "settlement-node".to_string(),
            reference_data_path: PathBuf::from("./config/reference-data.toml"),
            ledger: ledger_core::Config::default(),
            workflow: WorkflowConfig::default(),
            group: GroupConfig::default(),
            instruments: InstrumentConfig::default(),
            log_json: false,
            metrics_listen_addr: "0.0.0.0:9091".to_string(),
        }
    }
}

/// Settlement workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Probability that the backend settles, per payment method
    pub success_rates: SuccessRates,

    /// Simulated backend latency (ms)
    pub backend_latency_ms: u64,

    /// Deadline for one backend attempt (ms)
    pub attempt_timeout_ms: u64,

    /// Settlements run at once by `settle_all`
    pub max_concurrency: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            success_rates: SuccessRates::default(),
            backend_latency_ms: 50,
            attempt_timeout_ms: 5_000,
            max_concurrency: 64,
        }
    }
}

impl WorkflowConfig {
    /// Backend attempt deadline
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    /// Simulated backend latency
    pub fn backend_latency(&self) -> Duration {
        Duration::from_millis(self.backend_latency_ms)
    }
}

/// Per-method success probabilities
///
/// Simple instruments settle more reliably than documentary ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuccessRates {
    /// Wire transfer
    pub wire_transfer: f64,
    /// Correspondent banking
    pub correspondent_banking: f64,
    /// Mobile money
    pub mobile_money: f64,
    /// Digital wallet
    pub digital_wallet: f64,
    /// Trade finance
    pub trade_finance: f64,
    /// Ledger transfer
    pub ledger_transfer: f64,
}

impl Default for SuccessRates {
    fn default() -> Self {
        Self {
            wire_transfer: 0.95,
            correspondent_banking: 0.90,
            mobile_money: 0.98,
            digital_wallet: 0.97,
            trade_finance: 0.85,
            ledger_transfer: 0.99,
        }
    }
}

impl SuccessRates {
    /// Success probability for a method
    pub fn for_method(&self, method: PaymentMethod) -> f64 {
        match method {
            PaymentMethod::WireTransfer => self.wire_transfer,
            PaymentMethod::CorrespondentBanking => self.correspondent_banking,
            PaymentMethod::MobileMoney => self.mobile_money,
            PaymentMethod::DigitalWallet => self.digital_wallet,
            PaymentMethod::TradeFinance => self.trade_finance,
            PaymentMethod::LedgerTransfer => self.ledger_transfer,
        }
    }
}

/// Group fee optimization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Flat fee rate charged before discounts
    pub baseline_fee_rate: Decimal,

    /// Volume per discount step
    pub volume_step: Decimal,

    /// Discount per volume step
    pub volume_step_discount: Decimal,

    /// Volume discount cap
    pub volume_cap: Decimal,

    /// Principle count per bonus step
    pub principle_divisor: u32,

    /// Bonus per principle step
    pub principle_step_bonus: Decimal,

    /// Membership bonus cap
    pub membership_cap: Decimal,

    /// Fixed cultural component
    pub cultural_component: Decimal,

    /// Fixed community component
    pub community_component: Decimal,

    /// Ceiling on the summed discount; `None` leaves it uncapped
    pub max_total_discount: Option<Decimal>,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            baseline_fee_rate: Decimal::new(2, 2),
            volume_step: Decimal::from(1_000_000),
            volume_step_discount: Decimal::new(1, 1),
            volume_cap: Decimal::new(5, 1),
            principle_divisor: 10,
            principle_step_bonus: Decimal::new(2, 1),
            membership_cap: Decimal::new(2, 1),
            cultural_component: Decimal::new(10, 2),
            community_component: Decimal::new(15, 2),
            max_total_discount: Some(Decimal::new(9, 1)),
        }
    }
}

/// Trade instrument validity, in days
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Letter of credit
    pub letter_of_credit_days: u32,
    /// Bank guarantee
    pub bank_guarantee_days: u32,
    /// Documentary collection
    pub documentary_collection_days: u32,
    /// Standby letter of credit
    pub standby_letter_of_credit_days: u32,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            letter_of_credit_days: 90,
            bank_guarantee_days: 365,
            documentary_collection_days: 30,
            standby_letter_of_credit_days: 180,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) -> crate::Result<()> {
        if let Ok(path) = std::env::var("RAIL_REFERENCE_DATA") {
            self.reference_data_path = PathBuf::from(path);
        }

        if let Ok(timeout) = std::env::var("RAIL_ATTEMPT_TIMEOUT_MS") {
            self.workflow.attempt_timeout_ms = timeout.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid RAIL_ATTEMPT_TIMEOUT_MS: {}", e))
            })?;
        }

        if let Ok(json) = std::env::var("RAIL_LOG_JSON") {
            self.log_json = matches!(json.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        self.ledger.apply_env()?;
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> crate::Result<()> {
        for method in PaymentMethod::ALL {
            let rate = self.workflow.success_rates.for_method(method);
            if !(0.0..=1.0).contains(&rate) {
                return Err(crate::Error::Config(format!(
                    "Success rate for {} must be within [0, 1], got {}",
                    method.as_str(),
                    rate
                )));
            }
        }

        if self.workflow.attempt_timeout_ms == 0 {
            return Err(crate::Error::Config(
                "attempt_timeout_ms must be positive".to_string(),
            ));
        }

        if self.workflow.max_concurrency == 0 {
            return Err(crate::Error::Config(
                "max_concurrency must be positive".to_string(),
            ));
        }

        if self.group.volume_step <= Decimal::ZERO || self.group.principle_divisor == 0 {
            return Err(crate::Error::Config(
                "Group volume step and principle divisor must be positive".to_string(),
            ));
        }

        if let Some(cap) = self.group.max_total_discount {
            if cap < Decimal::ZERO || cap > Decimal::ONE {
                return Err(crate::Error::Config(format!(
                    "max_total_discount must be within [0, 1], got {}",
                    cap
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        config.validate().unwrap();

        assert_eq!(config.group.baseline_fee_rate, dec!(0.02));
        assert_eq!(config.group.max_total_discount, Some(dec!(0.9)));
        assert_eq!(config.instruments.bank_guarantee_days, 365);
        assert_eq!(config.workflow.attempt_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
log_json = true

[ledger]
backend = "memory"

[workflow]
attempt_timeout_ms = 250

[workflow.success_rates]
trade_finance = 0.5

[group]
max_total_discount = "0.75"
"#,
        )
        .unwrap();

        assert!(config.log_json);
        assert_eq!(config.ledger.backend, ledger_core::StoreBackend::Memory);
        assert_eq!(config.workflow.attempt_timeout_ms, 250);
        assert_eq!(
            config.workflow.success_rates.for_method(PaymentMethod::TradeFinance),
            0.5
        );
        assert_eq!(
            config.workflow.success_rates.for_method(PaymentMethod::WireTransfer),
            0.95
        );
        assert_eq!(config.group.max_total_discount, Some(dec!(0.75)));
        assert_eq!(config.group.cultural_component, dec!(0.10));
    }

    #[test]
    fn test_sample_config_file() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../config/settlement.toml");
        let config = Config::from_file(path).unwrap();

        assert_eq!(config.ledger.backend, ledger_core::StoreBackend::RocksDb);
        assert_eq!(config.workflow.max_concurrency, 64);
        assert_eq!(config.group.volume_step, dec!(1000000));
        assert_eq!(config.instruments.standby_letter_of_credit_days, 180);
    }

    #[test]
    fn test_invalid_success_rate() {
        let mut config = Config::default();
        config.workflow.success_rates.mobile_money = 1.5;
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_invalid_discount_cap() {
        let mut config = Config::default();
        config.group.max_total_discount = Some(dec!(1.2));
        assert!(config.validate().is_err());

        config.group.max_total_discount = None;
        assert!(config.validate().is_ok());
    }
}
