//! Wallet-wide balance
//!
//! Aggregates every account into the base currency and projects the balance
//! after the planned payments of a period.

use crate::error::WalletResult;
use crate::models::{DateRange, Money};
use crate::services::account::AccountService;
use crate::services::planned::PlannedService;
use crate::storage::Storage;

/// Balance now and after the period's planned payments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceOverview {
    pub current: Money,
    /// Net of upcoming planned income and expenses in the period
    pub planned: Money,
    pub after_planned: Money,
}

pub struct WalletService<'a> {
    storage: &'a Storage,
}

impl<'a> WalletService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Total balance in the base currency
    ///
    /// With `filter_excluded`, accounts flagged as not included in the
    /// balance are left out.
    pub fn calculate_balance(&self, filter_excluded: bool) -> WalletResult<Money> {
        let accounts = AccountService::new(self.storage);
        let mut total = Money::zero();
        for account in accounts.list()? {
            if filter_excluded && !account.include_in_balance {
                continue;
            }
            total += accounts.balance_base_currency(&account)?;
        }
        Ok(total)
    }

    pub fn balance_overview(&self, range: DateRange) -> WalletResult<BalanceOverview> {
        let current = self.calculate_balance(true)?;
        let planned = PlannedService::new(self.storage).upcoming(range)?.net();
        Ok(BalanceOverview {
            current,
            planned,
            after_planned: current + planned,
        })
    }
}
