// 8.0 config.rs: all settings in one place. wrapper token, fee, collateral risk params.
// 8.1 values are human decimals here and converted to 1e18 rates once, at construction.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::fee::EntryFeeModel;
use crate::types::{AccountId, CurrencyId, Rate};

// Wrapper token and venue wiring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapperConfig {
    // Human readable token name
    pub name: String,
    // Token symbol (e.g. "wfUSDC")
    pub symbol: String,
    // Venue currency id of the underlying
    pub currency_id: CurrencyId,
    // Native decimals of the underlying (and of the wrapper token)
    pub underlying_decimals: u32,
    // Address of the fixed-term venue. must be set
    pub venue_address: String,
    // Account the venue sees as the holder of all claims
    pub custody: AccountId,
    // Annual entry fee, e.g. 0.003 = 0.30%/year
    pub annual_fee: Decimal,
    // Maximum number of events kept in memory
    pub max_events: usize,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            name: "Wrapped Fixed-Term USDC".to_string(),
            symbol: "wfUSDC".to_string(),
            currency_id: CurrencyId(3),
            underlying_decimals: 6,
            venue_address: "venue:fixed-term".to_string(),
            custody: AccountId(0),
            annual_fee: dec!(0.003),
            max_events: 100_000,
        }
    }
}

impl WrapperConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.venue_address.trim().is_empty() {
            return Err(ConfigError::invalid("venue address is missing"));
        }
        if self.underlying_decimals > 36 {
            return Err(ConfigError::invalid("underlying decimals above 36"));
        }
        if self.annual_fee < Decimal::ZERO || self.annual_fee >= Decimal::ONE {
            return Err(ConfigError::invalid("annual fee must be in [0, 1)"));
        }
        Ok(())
    }

    pub fn fee_model(&self) -> Result<EntryFeeModel, ConfigError> {
        let rate = Rate::from_decimal(self.annual_fee)
            .map_err(|_| ConfigError::invalid("annual fee out of range"))?;
        EntryFeeModel::new(rate).ok_or_else(|| ConfigError::invalid("annual fee must be in [0, 1)"))
    }
}

/** 8.2: collateral risk params. allowed_drop is the revenue hiding margin */
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralConfig {
    // Target price of the reference unit, e.g. 1.0 for a dollar stablecoin
    pub peg: Decimal,
    // Tolerated dip of the actual rate below its high-water mark, in (0, 1)
    pub allowed_drop: Decimal,
    // Peg deviation that counts as a soft default, in [0, 1)
    pub default_threshold: Decimal,
    // Peg oracle staleness bound
    pub oracle_timeout_secs: u64,
    // How long a soft default may last before it becomes a hard default
    pub delay_until_default_secs: u64,
}

impl Default for CollateralConfig {
    fn default() -> Self {
        Self {
            peg: Decimal::ONE,
            allowed_drop: dec!(0.01),
            default_threshold: dec!(0.05),
            oracle_timeout_secs: 86_400,
            delay_until_default_secs: 86_400,
        }
    }
}

impl CollateralConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.peg <= Decimal::ZERO {
            return Err(ConfigError::invalid("peg must be positive"));
        }
        if self.allowed_drop <= Decimal::ZERO || self.allowed_drop >= Decimal::ONE {
            return Err(ConfigError::invalid("allowed drop must be in (0, 1)"));
        }
        if self.default_threshold < Decimal::ZERO || self.default_threshold >= Decimal::ONE {
            return Err(ConfigError::invalid("default threshold must be in [0, 1)"));
        }
        if self.oracle_timeout_secs == 0 {
            return Err(ConfigError::invalid("oracle timeout must be non-zero"));
        }
        Ok(())
    }

    /// 1 - allowed_drop
    pub fn margin_ratio(&self) -> Result<Rate, ConfigError> {
        Rate::from_decimal(Decimal::ONE - self.allowed_drop)
            .map_err(|_| ConfigError::invalid("allowed drop out of range"))
    }
}

// Everything one deployment needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub wrapper: WrapperConfig,
    pub collateral: CollateralConfig,
}

impl DeploymentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.wrapper.validate()?;
        self.collateral.validate()
    }

    // Loose settings for local runs
    pub fn testnet() -> Self {
        let mut config = Self::default();
        config.wrapper.name = "Wrapped Fixed-Term USDC Testnet".to_string();
        config.wrapper.annual_fee = Decimal::ZERO;
        config.collateral.oracle_timeout_secs = 3_600;
        config.collateral.delay_until_default_secs = 3_600;
        config
    }

    // Wider margin and longer soft-default window
    pub fn mainnet_conservative() -> Self {
        let mut config = Self::default();
        config.collateral.allowed_drop = dec!(0.02);
        config.collateral.default_threshold = dec!(0.02);
        config.collateral.oracle_timeout_secs = 86_400;
        config.collateral.delay_until_default_secs = 259_200; // 3 days
        config
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(reason: &str) -> Self {
        ConfigError::InvalidConfiguration {
            reason: reason.to_string(),
        }
    }
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
    pub fn config(&self) -> DeploymentConfig {
        match self {
            Environment::Development => DeploymentConfig::default(),
            Environment::Testnet => DeploymentConfig::testnet(),
            Environment::Mainnet => DeploymentConfig::mainnet_conservative(),
        }
    }
}
