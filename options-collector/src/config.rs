//! Collector configuration.
//!
//! Loaded from a TOML file; every section and field has a default, so an
//! empty file (or no file) yields the stock single-symbol SPY setup.
//!
//! ```toml
//! [contract]
//! symbol = "SPY"
//!
//! [universe]
//! strike_band_pct = 30
//!
//! [schedule]
//! interval_minutes = 3
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::{SessionCalendar, DEFAULT_CLOSE, DEFAULT_OPEN};
use crate::universe::UniverseSelector;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete collector configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub contract: ContractConfig,
    pub universe: UniverseConfig,
    pub session: SessionConfig,
    pub schedule: ScheduleConfig,
    pub output: OutputConfig,
    pub gateway: GatewayConfig,
}

/// The underlying and the option chain to sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    pub symbol: String,
    pub exchange: String,
    pub currency: String,
    pub trading_class: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            symbol: "SPY".to_string(),
            exchange: "SMART".to_string(),
            currency: "USD".to_string(),
            trading_class: "SPY".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    /// Strike band half-width, percent of the reference price.
    pub strike_band_pct: u32,
    pub near_expirations: usize,
    pub far_expirations: usize,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        let selector = UniverseSelector::default();
        Self {
            strike_band_pct: selector.strike_band_pct,
            near_expirations: selector.near_expirations,
            far_expirations: selector.far_expirations,
        }
    }
}

impl UniverseConfig {
    pub fn selector(&self) -> UniverseSelector {
        UniverseSelector {
            strike_band_pct: self.strike_band_pct,
            near_expirations: self.near_expirations,
            far_expirations: self.far_expirations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// IANA timezone of the exchange.
    pub timezone: String,
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timezone: "America/New_York".to_string(),
            open: DEFAULT_OPEN,
            close: DEFAULT_CLOSE,
        }
    }
}

impl SessionConfig {
    pub fn calendar(&self) -> Result<SessionCalendar, ConfigError> {
        let tz: Tz = self
            .timezone
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("unknown timezone {}: {}", self.timezone, e)))?;
        Ok(SessionCalendar::new(tz, self.open, self.close))
    }
}

/// Longest accepted cycle interval: one day.
pub const MAX_INTERVAL_MINUTES: u64 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_minutes: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { interval_minutes: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Cumulative, append-only collection log.
    pub log_path: PathBuf,
    /// Snapshot of the most recent cycle.
    pub latest_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("options_spy_historical.csv"),
            latest_path: PathBuf::from("options_spy_latest.csv"),
        }
    }
}

/// Broker gateway bridge connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Broker API host the bridge should connect to.
    pub host: String,
    pub port: u16,
    pub client_id: i32,
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            host: "127.0.0.1".to_string(),
            port: 7497,
            client_id: 1,
            timeout_secs: 30,
        }
    }
}

impl CollectorConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml(&content)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contract.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("contract.symbol is empty".to_string()));
        }
        if !(1..=99).contains(&self.universe.strike_band_pct) {
            return Err(ConfigError::Invalid(format!(
                "universe.strike_band_pct must be in 1..=99, got {}",
                self.universe.strike_band_pct
            )));
        }
        if self.universe.near_expirations == 0 && self.universe.far_expirations == 0 {
            return Err(ConfigError::Invalid(
                "universe selects no expirations".to_string(),
            ));
        }
        if !(1..=MAX_INTERVAL_MINUTES).contains(&self.schedule.interval_minutes) {
            return Err(ConfigError::Invalid(format!(
                "schedule.interval_minutes must be in 1..={}, got {}",
                MAX_INTERVAL_MINUTES, self.schedule.interval_minutes
            )));
        }
        if self.session.open >= self.session.close {
            return Err(ConfigError::Invalid(format!(
                "session.open {} is not before session.close {}",
                self.session.open, self.session.close
            )));
        }
        self.session.calendar()?;
        Ok(())
    }
}
