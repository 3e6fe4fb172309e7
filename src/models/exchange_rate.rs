//! Exchange rate model
//!
//! A rate reads as `1 base_currency = rate currency`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub base_currency: String,
    pub currency: String,
    pub rate: f64,
    pub updated_at: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn new(base_currency: impl Into<String>, currency: impl Into<String>, rate: f64) -> Self {
        Self {
            base_currency: base_currency.into(),
            currency: currency.into(),
            rate,
            updated_at: Utc::now(),
        }
    }

    /// Storage key for the pair
    pub fn key(&self) -> (String, String) {
        (self.base_currency.clone(), self.currency.clone())
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1 {} = {} {}", self.base_currency, self.rate, self.currency)
    }
}
