//! Exchange rate store
//!
//! Rates are fetched or entered locally and are not part of cloud sync, so
//! this store keeps a plain list instead of a syncable `Table`.

use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::WalletResult;
use crate::models::ExchangeRate;

use super::file_io::{read_json, write_json_atomic};
use super::table::{read_lock, write_lock};

#[derive(Debug, Default, Serialize, Deserialize)]
struct ExchangeRateData {
    #[serde(default)]
    exchange_rates: Vec<ExchangeRate>,
}

pub struct ExchangeRateRepository {
    path: PathBuf,
    rates: RwLock<Vec<ExchangeRate>>,
}

impl ExchangeRateRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            rates: RwLock::new(Vec::new()),
        }
    }

    pub fn load(&self) -> WalletResult<()> {
        let data: ExchangeRateData = read_json(&self.path)?;
        *write_lock(&self.rates)? = data.exchange_rates;
        Ok(())
    }

    pub fn save(&self) -> WalletResult<()> {
        let mut exchange_rates = read_lock(&self.rates)?.clone();
        exchange_rates.sort_by_key(|r| r.key());
        write_json_atomic(&self.path, &ExchangeRateData { exchange_rates })
    }

    /// Rate for `1 base = ? currency`
    pub fn get(&self, base_currency: &str, currency: &str) -> WalletResult<Option<ExchangeRate>> {
        Ok(read_lock(&self.rates)?
            .iter()
            .find(|r| r.base_currency == base_currency && r.currency == currency)
            .cloned())
    }

    /// Insert or replace the rate for a currency pair
    pub fn upsert(&self, rate: ExchangeRate) -> WalletResult<Option<ExchangeRate>> {
        let mut rates = write_lock(&self.rates)?;
        let previous = rates
            .iter()
            .position(|r| r.key() == rate.key())
            .map(|index| rates.remove(index));
        rates.push(rate);
        Ok(previous)
    }

    pub fn remove(&self, base_currency: &str, currency: &str) -> WalletResult<Option<ExchangeRate>> {
        let mut rates = write_lock(&self.rates)?;
        Ok(rates
            .iter()
            .position(|r| r.base_currency == base_currency && r.currency == currency)
            .map(|index| rates.remove(index)))
    }

    pub fn get_all(&self) -> WalletResult<Vec<ExchangeRate>> {
        let mut rates = read_lock(&self.rates)?.clone();
        rates.sort_by_key(|r| r.key());
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_upsert_replaces_pair() {
        let temp_dir = TempDir::new().unwrap();
        let repo = ExchangeRateRepository::new(temp_dir.path().join("exchange_rates.json"));
        repo.load().unwrap();

        assert!(repo.upsert(ExchangeRate::new("USD", "EUR", 0.9)).unwrap().is_none());
        let previous = repo.upsert(ExchangeRate::new("USD", "EUR", 0.92)).unwrap();
        assert_eq!(previous.unwrap().rate, 0.9);
        assert_eq!(repo.get_all().unwrap().len(), 1);
        assert_eq!(repo.get("USD", "EUR").unwrap().unwrap().rate, 0.92);
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("exchange_rates.json");
        let repo = ExchangeRateRepository::new(path.clone());
        repo.upsert(ExchangeRate::new("EUR", "BGN", 1.95583)).unwrap();
        repo.save().unwrap();

        let reloaded = ExchangeRateRepository::new(path);
        reloaded.load().unwrap();
        assert!(reloaded.get("EUR", "BGN").unwrap().is_some());
        assert!(reloaded.remove("EUR", "BGN").unwrap().is_some());
        assert!(reloaded.get("EUR", "BGN").unwrap().is_none());
    }
}
