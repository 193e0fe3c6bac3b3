use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::account::Address;
use crate::error::{LedgerError, Result};
use crate::fixed::{WAD, WAD_DECIMALS};

pub const DEFAULT_COOLDOWN_SECS: u64 = 3_600;
pub const DEFAULT_ANNUAL_DEFLATION_BPS: u32 = 100;
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 3_600;
pub const DEFAULT_INITIAL_SUPPLY_TOKENS: u64 = 100_000_000;
pub const BPS: u32 = 10_000;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    #[serde(default)]
    pub token: TokenMetadata,
    #[serde(default)]
    pub supply: SupplyConfig,
    pub rebase: RebaseConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: "hf_stableCoin".to_string(),
            symbol: "HFSC".to_string(),
            decimals: WAD_DECIMALS,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SupplyConfig {
    /// Whole tokens minted to the deployer at construction
    pub initial_supply_tokens: u64,
}

impl Default for SupplyConfig {
    fn default() -> Self {
        Self {
            initial_supply_tokens: DEFAULT_INITIAL_SUPPLY_TOKENS,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RebaseConfig {
    /// Only identity allowed to trigger a rebase
    pub oracle: Address,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_annual_deflation_bps")]
    pub annual_deflation_bps: u32,
    #[serde(default = "default_seconds_per_year")]
    pub seconds_per_year: u64,
}

fn default_cooldown_secs() -> u64 {
    DEFAULT_COOLDOWN_SECS
}

fn default_annual_deflation_bps() -> u32 {
    DEFAULT_ANNUAL_DEFLATION_BPS
}

fn default_seconds_per_year() -> u64 {
    SECONDS_PER_YEAR
}

impl RebaseConfig {
    pub fn new(oracle: Address) -> Self {
        Self {
            oracle,
            cooldown_secs: DEFAULT_COOLDOWN_SECS,
            annual_deflation_bps: DEFAULT_ANNUAL_DEFLATION_BPS,
            seconds_per_year: SECONDS_PER_YEAR,
        }
    }

    /// Annual deflation as a WAD fraction (1% == WAD / 100)
    pub fn annual_rate_wad(&self) -> u128 {
        self.annual_deflation_bps as u128 * WAD / BPS as u128
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::with_oracle(Address::from_label("oracle"))
    }
}

impl LedgerConfig {
    pub fn with_oracle(oracle: Address) -> Self {
        Self {
            token: TokenMetadata::default(),
            supply: SupplyConfig::default(),
            rebase: RebaseConfig::new(oracle),
        }
    }

    /// `INITIAL_SUPPLY` in shares (display units at index 1.0)
    pub fn initial_supply(&self) -> Result<u128> {
        (self.supply.initial_supply_tokens as u128)
            .checked_mul(WAD)
            .ok_or(LedgerError::Overflow)
    }

    pub fn validate(&self) -> Result<()> {
        if self.token.decimals != WAD_DECIMALS {
            return Err(LedgerError::InvalidConfig(format!(
                "decimals must be {}, got {}",
                WAD_DECIMALS, self.token.decimals
            )));
        }
        if self.supply.initial_supply_tokens == 0 {
            return Err(LedgerError::InvalidConfig("initial supply must be positive".into()));
        }
        if self.rebase.cooldown_secs == 0 {
            return Err(LedgerError::InvalidConfig("cooldown must be positive".into()));
        }
        if self.rebase.seconds_per_year == 0 {
            return Err(LedgerError::InvalidConfig("seconds_per_year must be positive".into()));
        }
        if self.rebase.annual_deflation_bps > BPS {
            return Err(LedgerError::InvalidConfig(format!(
                "annual deflation {} bps exceeds {}",
                self.rebase.annual_deflation_bps, BPS
            )));
        }
        Ok(())
    }

    pub fn load(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| LedgerError::InvalidConfig(format!("{}: {}", path, e)))?;
        config.validate()?;
        info!("Config loaded from {}", path);
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let s = toml::to_string_pretty(self).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        std::fs::write(path, s)?;
        Ok(())
    }

    pub fn load_or_default(path: &str) -> Self {
        if Path::new(path).exists() {
            match Self::load(path) {
                Ok(c) => c,
                Err(e) => {
                    warn!("Error loading config: {}. Using defaults.", e);
                    Self::default()
                }
            }
        } else {
            info!("Config file not found at '{}'. Creating default.", path);
            let config = Self::default();
            if let Err(e) = config.save(path) {
                warn!("Could not write default config: {}", e);
            }
            config
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LedgerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.rebase.cooldown_secs, 3_600);
        assert_eq!(config.rebase.annual_rate_wad(), WAD / 100);
        assert_eq!(config.initial_supply().unwrap(), 100_000_000 * WAD);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let oracle = Address::from_label("oracle");
        let raw = format!("[rebase]\noracle = \"{}\"\n", oracle);
        let config: LedgerConfig = toml::from_str(&raw).unwrap();

        assert_eq!(config.rebase.oracle, oracle);
        assert_eq!(config.rebase.seconds_per_year, SECONDS_PER_YEAR);
        assert_eq!(config.token.symbol, "HFSC");
    }

    #[test]
    fn test_toml_round_trip() {
        let config = LedgerConfig::default();
        let raw = toml::to_string_pretty(&config).unwrap();
        let back: LedgerConfig = toml::from_str(&raw).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = LedgerConfig::default();
        config.rebase.cooldown_secs = 0;
        assert!(config.validate().is_err());

        let mut config = LedgerConfig::default();
        config.rebase.annual_deflation_bps = BPS + 1;
        assert!(config.validate().is_err());

        let mut config = LedgerConfig::default();
        config.token.decimals = 6;
        assert!(config.validate().is_err());

        let mut config = LedgerConfig::default();
        config.supply.initial_supply_tokens = 0;
        assert!(config.validate().is_err());
    }
}
