// 8.0 config.rs: client-side settings in one place. token precision, slippage, fees.
// 8.1 loading from toml, presets per environment. market curve parameters come
// from the snapshot, not from here (see vertex::PriceConfig).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::margin::FeeRates;
use crate::math::{DEFAULT_PRECISION, DEFAULT_QUOTE_PRECISION};

// Token decimals used to scale sizes and prices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecisionConfig {
    // Base token (size) decimals
    pub base_decimals: u32,
    // Quote token (USD) decimals
    pub quote_decimals: u32,
}

impl Default for PrecisionConfig {
    fn default() -> Self {
        Self {
            base_decimals: DEFAULT_PRECISION,
            quote_decimals: DEFAULT_QUOTE_PRECISION,
        }
    }
}

/** 8.2: slippage tolerance, in percent. 0.30 = 0.3% */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlippageConfig {
    // Tolerance applied when the caller does not pick one
    pub default_percent: Decimal,
    // Floor for automatic slippage
    pub min_auto_percent: Decimal,
    // Ceiling for automatic slippage
    pub max_auto_percent: Decimal,
}

impl Default for SlippageConfig {
    fn default() -> Self {
        Self {
            default_percent: dec!(0.30),
            min_auto_percent: dec!(0.30),
            max_auto_percent: dec!(25),
        }
    }
}

impl SlippageConfig {
    // Clamp an automatic slippage into the configured band
    pub fn clamp_auto(&self, percent: Decimal) -> Decimal {
        percent.max(self.min_auto_percent).min(self.max_auto_percent)
    }
}

// The complete client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub environment: Environment,
    #[serde(default)]
    pub precision: PrecisionConfig,
    #[serde(default)]
    pub slippage: SlippageConfig,
    #[serde(default)]
    pub fees: FeeRates,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            precision: PrecisionConfig::default(),
            slippage: SlippageConfig::default(),
            fees: FeeRates::default(),
        }
    }
}

impl EngineConfig {
    // Preset for testnet: looser slippage so quotes survive thin books
    pub fn testnet() -> Self {
        let mut config = Self::default();
        config.environment = Environment::Testnet;
        config.slippage.default_percent = dec!(1);
        config.slippage.min_auto_percent = dec!(1);
        config
    }

    // Preset for mainnet with conservative settings
    pub fn mainnet_conservative() -> Self {
        let mut config = Self::default();
        config.environment = Environment::Mainnet;
        config.slippage.max_auto_percent = dec!(5);
        config
    }

    // 8.1: parse from toml. missing sections fall back to defaults
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        // decimal supports 28 fractional digits
        if self.precision.base_decimals > 28 || self.precision.quote_decimals > 28 {
            return Err(ConfigError::InvalidPrecision {
                reason: "decimals must not exceed 28".to_string(),
            });
        }

        let slippage = &self.slippage;
        if slippage.min_auto_percent < Decimal::ZERO
            || slippage.min_auto_percent > slippage.max_auto_percent
        {
            return Err(ConfigError::InvalidSlippage {
                reason: "auto slippage band must satisfy 0 <= min <= max".to_string(),
            });
        }
        if slippage.max_auto_percent >= dec!(100) {
            return Err(ConfigError::InvalidSlippage {
                reason: "slippage of 100% or more allows any price".to_string(),
            });
        }
        if slippage.default_percent < Decimal::ZERO || slippage.default_percent >= dec!(100) {
            return Err(ConfigError::InvalidSlippage {
                reason: "default slippage must be in [0, 100)".to_string(),
            });
        }

        let fees = &self.fees;
        if fees.trading_fee_rate < Decimal::ZERO || fees.trading_fee_rate >= Decimal::ONE {
            return Err(ConfigError::InvalidFees {
                reason: "trading fee rate must be in [0, 1)".to_string(),
            });
        }
        if fees.liquidation_fee_rate < Decimal::ZERO || fees.liquidation_fee_rate >= Decimal::ONE {
            return Err(ConfigError::InvalidFees {
                reason: "liquidation fee rate must be in [0, 1)".to_string(),
            });
        }
        if fees.liquidation_execution_fee < Decimal::ZERO {
            return Err(ConfigError::InvalidFees {
                reason: "execution fee must not be negative".to_string(),
            });
        }

        Ok(())
    }
}

// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid precision: {reason}")]
    InvalidPrecision { reason: String },
    #[error("invalid slippage: {reason}")]
    InvalidSlippage { reason: String },
    #[error("invalid fees: {reason}")]
    InvalidFees { reason: String },
    #[error("invalid price config: {reason}")]
    InvalidPriceConfig { reason: String },
    #[error("config parse error: {0}")]
    Parse(String),
}

// Environment presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Testnet,
    Mainnet,
}

impl Environment {
    pub fn config(&self) -> EngineConfig {
        match self {
            Environment::Development => EngineConfig::default(),
            Environment::Testnet => EngineConfig::testnet(),
            Environment::Mainnet => EngineConfig::mainnet_conservative(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.precision.base_decimals, 18);
        assert_eq!(config.precision.quote_decimals, 6);
        assert_eq!(config.slippage.default_percent, dec!(0.30));
        assert_eq!(config.slippage.max_auto_percent, dec!(25));
    }

    #[test]
    fn test_environment_presets() {
        assert!(Environment::Development.config().validate().is_ok());
        assert!(Environment::Testnet.config().validate().is_ok());
        assert!(Environment::Mainnet.config().validate().is_ok());
        assert_eq!(Environment::Mainnet.config().environment, Environment::Mainnet);
    }

    #[test]
    fn test_clamp_auto_slippage() {
        let slippage = SlippageConfig::default();
        assert_eq!(slippage.clamp_auto(dec!(0.1)), dec!(0.30));
        assert_eq!(slippage.clamp_auto(dec!(3)), dec!(3));
        assert_eq!(slippage.clamp_auto(dec!(40)), dec!(25));
    }

    #[test]
    fn test_invalid_slippage() {
        let mut config = EngineConfig::default();
        config.slippage.min_auto_percent = dec!(30);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSlippage { .. })));

        let mut config = EngineConfig::default();
        config.slippage.default_percent = dec!(100);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSlippage { .. })));
    }

    #[test]
    fn test_invalid_fees() {
        let mut config = EngineConfig::default();
        config.fees.trading_fee_rate = Decimal::ONE;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidFees { .. })));
    }

    #[test]
    fn test_toml_loading() {
        let config = EngineConfig::from_toml_str(
            r#"
            environment = "testnet"

            [slippage]
            default_percent = "0.5"
            min_auto_percent = "0.3"
            max_auto_percent = "10"
            "#,
        )
        .unwrap();
        assert_eq!(config.environment, Environment::Testnet);
        assert_eq!(config.slippage.default_percent, dec!(0.5));
        // omitted sections take defaults
        assert_eq!(config.precision, PrecisionConfig::default());
        assert_eq!(config.fees, FeeRates::default());
    }

    #[test]
    fn test_toml_rejects_garbage() {
        assert!(matches!(
            EngineConfig::from_toml_str("environment = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_config_serialization() {
        let config = EngineConfig::mainnet_conservative();
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);

        let toml = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&toml).unwrap(), config);
    }
}
