// ⚙️ Configuration - TOML file, then environment overrides
//
// Loaded from an optional TOML file, then overridden by environment
// variables, then turned into a validated `Roster` and rate table.

use crate::error::{RosterError, SettlementError};
use crate::model::{Category, CurrencyCode, ParticipantId};
use crate::rates::{ConversionRateTable, DEFAULT_FALLBACK_RATE, DEFAULT_REFERENCE_CURRENCY};
use crate::roster::{Roster, DEFAULT_CATEGORIES, DEFAULT_CURRENCIES, DEFAULT_PARTICIPANTS};
use crate::settlement::SettlementEngine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Base URL of the hosted expense service
pub const DEFAULT_API_URL: &str = "https://split-server-t63h.onrender.com";

pub const ENV_API_URL: &str = "TRIP_SPLIT_API_URL";
pub const ENV_REFERENCE_CURRENCY: &str = "TRIP_SPLIT_REFERENCE_CURRENCY";
pub const ENV_DEFAULT_RATE: &str = "TRIP_SPLIT_DEFAULT_RATE";
pub const ENV_LOG: &str = "TRIP_SPLIT_LOG";
pub const ENV_BIND_ADDR: &str = "TRIP_SPLIT_BIND_ADDR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Rate(#[from] SettlementError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Expense service base URL
    pub api_url: String,

    /// tracing filter directive ("info", "trip_split=debug", ...)
    pub log_level: String,

    /// Address for `split-server`
    pub bind_addr: String,

    pub reference_currency: String,

    /// Factor for currencies missing from `rates`
    pub default_rate: f64,

    /// Units of currency per 1 reference unit
    pub rates: BTreeMap<String, f64>,

    pub participants: Vec<String>,

    pub categories: Vec<String>,

    pub currencies: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut rates = BTreeMap::new();
        rates.insert("MYR".to_string(), DEFAULT_FALLBACK_RATE);

        AppConfig {
            api_url: DEFAULT_API_URL.to_string(),
            log_level: "info".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            reference_currency: DEFAULT_REFERENCE_CURRENCY.to_string(),
            default_rate: DEFAULT_FALLBACK_RATE,
            rates,
            participants: DEFAULT_PARTICIPANTS.iter().map(|s| s.to_string()).collect(),
            categories: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            currencies: DEFAULT_CURRENCIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `path` (if any), then process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(currency) = lookup(ENV_REFERENCE_CURRENCY) {
            self.reference_currency = currency;
        }
        if let Some(raw) = lookup(ENV_DEFAULT_RATE) {
            self.default_rate = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_DEFAULT_RATE.to_string(),
                message: format!("'{}' is not a number", raw),
            })?;
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.log_level = level;
        }
        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            self.bind_addr = addr;
        }
        Ok(())
    }

    pub fn roster(&self) -> Result<Roster, ConfigError> {
        Ok(Roster::new(
            self.participants.iter().map(ParticipantId::new).collect(),
            self.categories.iter().map(Category::new).collect(),
            self.currencies.iter().map(CurrencyCode::new).collect(),
        )?)
    }

    pub fn rate_table(&self) -> Result<ConversionRateTable, ConfigError> {
        if self.reference_currency.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "reference_currency".to_string(),
                message: "cannot be blank".to_string(),
            });
        }

        let mut table = ConversionRateTable::new(self.reference_currency.as_str(), self.default_rate)?;
        for (currency, rate) in &self.rates {
            table.insert(currency.as_str(), *rate)?;
        }
        Ok(table)
    }

    pub fn engine(&self) -> Result<SettlementEngine, ConfigError> {
        Ok(SettlementEngine::new(self.roster()?, self.rate_table()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_build_engine() {
        let config = AppConfig::default();
        let engine = config.engine().unwrap();

        assert_eq!(engine.roster().len(), 2);
        assert_eq!(engine.rates().reference().as_str(), "SGD");
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            reference_currency = "MYR"
            default_rate = 0.29

            [rates]
            SGD = 0.29
            KRW = 290.0
            "#,
        )
        .unwrap();

        assert_eq!(config.participants, vec!["DS", "KT"]);
        let table = config.rate_table().unwrap();
        assert_eq!(table.reference().as_str(), "MYR");
        assert_eq!(table.rate_for(&CurrencyCode::new("KRW")), 290.0);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_URL, "http://localhost:8080"),
            (ENV_DEFAULT_RATE, "4.0"),
            (ENV_LOG, "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.default_rate, 4.0);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
    }

    #[test]
    fn test_bad_env_rate() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(|key| (key == ENV_DEFAULT_RATE).then(|| "lots".to_string()))
            .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_invalid_roster_and_rates() {
        let config = AppConfig::from_toml(r#"participants = ["solo"]"#).unwrap();
        assert!(matches!(config.roster(), Err(ConfigError::Roster(RosterError::TooFewParticipants(1)))));

        let config = AppConfig::from_toml("[rates]\nKRW = 0.0").unwrap();
        assert!(matches!(config.rate_table(), Err(ConfigError::Rate(_))));

        assert!(matches!(AppConfig::from_toml("participants = 3"), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trip-split.toml");
        fs::write(&path, "participants = [\"A\", \"B\", \"C\"]\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.roster().unwrap().len(), 3);

        assert!(matches!(
            AppConfig::from_file(&dir.path().join("nope.toml")),
            Err(ConfigError::FileError(_))
        ));
    }
}
