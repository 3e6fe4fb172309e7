//! Exchange service
//!
//! Converts amounts between currencies using locally stored rates. A rate is
//! looked up directly, then inverted, then chained through the base
//! currency. When none of these exist the conversion fails instead of
//! silently treating the amount as already converted.

use crate::audit::EntityType;
use crate::error::{WalletError, WalletResult};
use crate::models::{currency, AccountId, ExchangeRate, Money};
use crate::storage::Repository;
use crate::storage::Storage;

pub struct ExchangeService<'a> {
    storage: &'a Storage,
}

impl<'a> ExchangeService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Store `1 base = rate currency` for the current base currency
    pub fn set_rate(&self, currency_code: &str, rate: f64) -> WalletResult<ExchangeRate> {
        let currency_code = currency::normalize(currency_code)?;
        let base = self.storage.settings.base_currency()?;

        if currency_code == base {
            return Err(WalletError::Validation(format!(
                "{} is the base currency; its rate is always 1",
                base
            )));
        }
        if !rate.is_finite() || rate <= 0.0 {
            return Err(WalletError::Validation(format!(
                "Exchange rate must be a positive number, got {}",
                rate
            )));
        }

        let new_rate = ExchangeRate::new(base, currency_code, rate);
        let previous = self.storage.exchange_rates.upsert(new_rate.clone())?;
        self.storage.exchange_rates.save()?;

        let label = Some(new_rate.to_string());
        let id = format!("{}/{}", new_rate.base_currency, new_rate.currency);
        match previous {
            Some(before) => {
                self.storage
                    .log_update(EntityType::ExchangeRate, id, label, &before, &new_rate)?
            }
            None => self
                .storage
                .log_create(EntityType::ExchangeRate, id, label, &new_rate)?,
        }

        tracing::debug!(rate = %new_rate, "exchange rate set");
        Ok(new_rate)
    }

    /// Remove the rate for a currency against the current base
    pub fn remove_rate(&self, currency_code: &str) -> WalletResult<ExchangeRate> {
        let currency_code = currency::normalize(currency_code)?;
        let base = self.storage.settings.base_currency()?;
        let removed = self
            .storage
            .exchange_rates
            .remove(&base, &currency_code)?
            .ok_or_else(|| WalletError::NotFound {
                entity_type: "Exchange rate",
                identifier: format!("{}/{}", base, currency_code),
            })?;
        self.storage.exchange_rates.save()?;
        self.storage.log_delete(
            EntityType::ExchangeRate,
            format!("{}/{}", base, currency_code),
            None,
            &removed,
        )?;
        Ok(removed)
    }

    pub fn list_rates(&self) -> WalletResult<Vec<ExchangeRate>> {
        self.storage.exchange_rates.get_all()
    }

    /// Multiplier turning an amount in `from` into `to`, if known
    pub fn rate(&self, from: &str, to: &str) -> WalletResult<Option<f64>> {
        if from == to {
            return Ok(Some(1.0));
        }
        if let Some(rate) = self.pair_rate(from, to)? {
            return Ok(Some(rate));
        }

        let base = self.storage.settings.base_currency()?;
        if from == base || to == base {
            return Ok(None);
        }
        let to_base = self.pair_rate(from, &base)?;
        let from_base = self.pair_rate(&base, to)?;
        Ok(to_base.zip(from_base).map(|(a, b)| a * b))
    }

    /// Direct or inverse rate for a single pair
    fn pair_rate(&self, from: &str, to: &str) -> WalletResult<Option<f64>> {
        if let Some(direct) = self.storage.exchange_rates.get(from, to)? {
            return Ok(Some(direct.rate));
        }
        Ok(self
            .storage
            .exchange_rates
            .get(to, from)?
            .filter(|inverse| inverse.rate > 0.0)
            .map(|inverse| 1.0 / inverse.rate))
    }

    /// Convert an amount between currencies
    pub fn convert_amount(&self, amount: Money, from: &str, to: &str) -> WalletResult<Money> {
        if from == to || amount.is_zero() {
            return Ok(amount);
        }
        match self.rate(from, to)? {
            Some(rate) => Ok(amount.convert(rate)),
            None => Err(WalletError::MissingExchangeRate {
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }

    /// Convert an amount into the base currency
    pub fn amount_base_currency(&self, amount: Money, currency_code: &str) -> WalletResult<Money> {
        let base = self.storage.settings.base_currency()?;
        self.convert_amount(amount, currency_code, &base)
    }

    /// Convert an amount held in an account into the base currency
    pub fn account_amount_base(&self, amount: Money, account_id: AccountId) -> WalletResult<Money> {
        let base = self.storage.settings.base_currency()?;
        let account_currency = self
            .storage
            .accounts
            .get(account_id)?
            .and_then(|a| a.currency)
            .unwrap_or_else(|| base.clone());
        self.convert_amount(amount, &account_currency, &base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::create_test_storage;

    #[test]
    fn test_identity_conversion() {
        let (_temp, storage) = create_test_storage();
        let exchange = ExchangeService::new(&storage);
        let amount = Money::from_cents(1234);
        assert_eq!(exchange.convert_amount(amount, "EUR", "EUR").unwrap(), amount);
    }

    #[test]
    fn test_direct_and_inverse_rates() {
        let (_temp, storage) = create_test_storage();
        let exchange = ExchangeService::new(&storage);
        exchange.set_rate("eur", 0.5).unwrap();

        // 1 USD = 0.5 EUR
        assert_eq!(
            exchange
                .convert_amount(Money::from_cents(1000), "USD", "EUR")
                .unwrap()
                .cents(),
            500
        );
        assert_eq!(
            exchange
                .convert_amount(Money::from_cents(1000), "EUR", "USD")
                .unwrap()
                .cents(),
            2000
        );
        assert_eq!(
            exchange
                .amount_base_currency(Money::from_cents(250), "EUR")
                .unwrap()
                .cents(),
            500
        );
    }

    #[test]
    fn test_cross_rate_through_base() {
        let (_temp, storage) = create_test_storage();
        let exchange = ExchangeService::new(&storage);
        exchange.set_rate("EUR", 0.5).unwrap();
        exchange.set_rate("BGN", 1.0).unwrap();

        // 10 EUR -> 20 USD -> 20 BGN
        let converted = exchange
            .convert_amount(Money::from_cents(1000), "EUR", "BGN")
            .unwrap();
        assert_eq!(converted.cents(), 2000);
    }

    #[test]
    fn test_missing_rate_is_error() {
        let (_temp, storage) = create_test_storage();
        let exchange = ExchangeService::new(&storage);
        let err = exchange
            .convert_amount(Money::from_cents(100), "USD", "JPY")
            .unwrap_err();
        assert!(matches!(err, WalletError::MissingExchangeRate { .. }));
    }

    #[test]
    fn test_set_rate_validation() {
        let (_temp, storage) = create_test_storage();
        let exchange = ExchangeService::new(&storage);
        assert!(exchange.set_rate("EUR", 0.0).is_err());
        assert!(exchange.set_rate("EUR", f64::NAN).is_err());
        assert!(exchange.set_rate("USD", 1.0).is_err());
        assert!(exchange.set_rate("EURO-", 1.0).is_err());
    }

    #[test]
    fn test_remove_rate() {
        let (_temp, storage) = create_test_storage();
        let exchange = ExchangeService::new(&storage);
        exchange.set_rate("EUR", 0.9).unwrap();
        exchange.remove_rate("EUR").unwrap();
        assert!(exchange.list_rates().unwrap().is_empty());
        assert!(exchange.remove_rate("EUR").unwrap_err().is_not_found());
    }
}
