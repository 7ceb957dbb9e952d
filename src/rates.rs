// 💱 Conversion Rates - normalise every amount to one reference currency
//
// A rate is "units of that currency per 1 reference unit", so
// reference_amount = amount / rate. Missing rates use the default factor.

use crate::error::SettlementError;
use crate::model::CurrencyCode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Reference currency of the original deployment
pub const DEFAULT_REFERENCE_CURRENCY: &str = "SGD";

/// Factor applied to any currency without its own entry
pub const DEFAULT_FALLBACK_RATE: f64 = 3.45;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRateTable {
    reference: CurrencyCode,

    default_rate: f64,

    #[serde(default)]
    rates: BTreeMap<CurrencyCode, f64>,
}

fn check_rate(currency: &CurrencyCode, rate: f64) -> Result<(), SettlementError> {
    if rate.is_finite() && rate > 0.0 {
        Ok(())
    } else {
        Err(SettlementError::InvalidRate {
            currency: currency.to_string(),
            rate,
        })
    }
}

impl ConversionRateTable {
    /// Empty table: only the reference currency converts at 1
    pub fn new(
        reference: impl Into<CurrencyCode>,
        default_rate: f64,
    ) -> Result<Self, SettlementError> {
        let reference = reference.into();
        check_rate(&CurrencyCode::new("*"), default_rate)?;

        Ok(ConversionRateTable {
            reference,
            default_rate,
            rates: BTreeMap::new(),
        })
    }

    /// SGD reference, MYR at 3.45, everything else at 3.45
    pub fn with_defaults() -> Self {
        let mut rates = BTreeMap::new();
        rates.insert(CurrencyCode::new("MYR"), DEFAULT_FALLBACK_RATE);

        ConversionRateTable {
            reference: CurrencyCode::new(DEFAULT_REFERENCE_CURRENCY),
            default_rate: DEFAULT_FALLBACK_RATE,
            rates,
        }
    }

    /// Builder pattern: add one rate
    pub fn with_rate(
        mut self,
        currency: impl Into<CurrencyCode>,
        rate: f64,
    ) -> Result<Self, SettlementError> {
        self.insert(currency, rate)?;
        Ok(self)
    }

    /// Add or replace one rate. Entries for the reference currency are ignored.
    pub fn insert(&mut self, currency: impl Into<CurrencyCode>, rate: f64) -> Result<(), SettlementError> {
        let currency = currency.into();
        check_rate(&currency, rate)?;

        if currency != self.reference {
            self.rates.insert(currency, rate);
        }
        Ok(())
    }

    /// Load a table from JSON:
    /// `{"reference": "SGD", "default_rate": 3.45, "rates": {"MYR": 3.45}}`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read rates file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let table: ConversionRateTable =
            serde_json::from_str(content).context("Failed to parse rates JSON")?;
        table.validate()?;
        Ok(table)
    }

    /// Re-check every factor (deserialisation bypasses `insert`)
    pub fn validate(&self) -> Result<(), SettlementError> {
        check_rate(&CurrencyCode::new("*"), self.default_rate)?;
        for (currency, rate) in &self.rates {
            check_rate(currency, *rate)?;
        }
        Ok(())
    }

    pub fn reference(&self) -> &CurrencyCode {
        &self.reference
    }

    pub fn default_rate(&self) -> f64 {
        self.default_rate
    }

    pub fn has_rate(&self, currency: &CurrencyCode) -> bool {
        *currency == self.reference || self.rates.contains_key(currency)
    }

    /// Factor for `currency`: 1 for the reference, else the entry or the default
    pub fn rate_for(&self, currency: &CurrencyCode) -> f64 {
        if *currency == self.reference {
            return 1.0;
        }
        match self.rates.get(currency) {
            Some(rate) => *rate,
            None => {
                debug!(currency = %currency, fallback = self.default_rate, "no conversion rate, using default");
                self.default_rate
            }
        }
    }

    /// Amount in reference units. Reference-currency amounts pass through untouched.
    pub fn to_reference(&self, amount: f64, currency: &CurrencyCode) -> f64 {
        if *currency == self.reference {
            amount
        } else {
            amount / self.rate_for(currency)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, f64)> {
        self.rates.iter().map(|(currency, rate)| (currency, *rate))
    }
}

impl Default for ConversionRateTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}
