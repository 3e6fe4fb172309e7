//! Per-item statistics
//!
//! Detail figures for a single account or category over a period: balance,
//! income, expenses, history and the planned payments still ahead.

use crate::error::{WalletError, WalletResult};
use crate::models::{AccountId, CategoryId, DateRange, Money, Transaction};
use crate::services::account::AccountService;
use crate::services::category::CategoryService;
use crate::services::planned::{PlannedPayments, PlannedService};
use crate::storage::Storage;

/// What the statistics are computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsTarget {
    Account(AccountId),
    /// `None` selects uncategorized transactions
    Category(Option<CategoryId>),
}

#[derive(Debug, Clone)]
pub struct ItemStatistics {
    pub name: String,
    /// Currency of `balance`, `income` and `expenses`
    pub currency: String,
    /// All-time balance for accounts, period balance for categories
    pub balance: Money,
    /// Balance in the base currency when `currency` differs from it
    pub balance_base: Option<Money>,
    pub income: Money,
    pub expenses: Money,
    /// Paid transactions in the period, newest first
    pub history: Vec<Transaction>,
    pub upcoming: PlannedPayments,
    pub overdue: PlannedPayments,
}

pub struct StatisticsService<'a> {
    storage: &'a Storage,
}

impl<'a> StatisticsService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn compute(&self, target: StatisticsTarget, range: DateRange) -> WalletResult<ItemStatistics> {
        let base = self.storage.settings.base_currency()?;
        let planned = PlannedService::new(self.storage);
        let upcoming = planned.upcoming(range)?;
        let overdue = planned.overdue(range)?;

        match target {
            StatisticsTarget::Account(id) => {
                let accounts = AccountService::new(self.storage);
                let account = accounts
                    .get(id)?
                    .ok_or_else(|| WalletError::account_not_found(id.to_string()))?;
                let currency = account.currency_or(&base).to_string();
                let balance = accounts.balance(id)?;
                let balance_base = if currency == base {
                    None
                } else {
                    Some(accounts.balance_base_currency(&account)?)
                };

                let history = self
                    .storage
                    .transactions
                    .get_by_account(id)?
                    .into_iter()
                    .filter(|t| t.date_time.map(|d| range.contains(d)).unwrap_or(false))
                    .collect();

                Ok(ItemStatistics {
                    name: account.name,
                    currency,
                    balance,
                    balance_base,
                    income: accounts.income(id, range)?,
                    expenses: accounts.expenses(id, range)?,
                    history,
                    upcoming: planned.summarize(keep(upcoming, |t| t.account_id == id))?,
                    overdue: planned.summarize(keep(overdue, |t| t.account_id == id))?,
                })
            }
            StatisticsTarget::Category(category_id) => {
                let categories = CategoryService::new(self.storage);
                let name = match category_id {
                    Some(id) => {
                        categories
                            .get(id)?
                            .ok_or_else(|| WalletError::category_not_found(id.to_string()))?
                            .name
                    }
                    None => "Unspecified".to_string(),
                };

                let income = categories.income(category_id, range)?;
                let expenses = categories.expenses(category_id, range)?;
                let history = self
                    .storage
                    .transactions
                    .get_all()?
                    .into_iter()
                    .filter(|t| !t.is_transfer() && t.smart_category_id() == category_id)
                    .filter(|t| t.date_time.map(|d| range.contains(d)).unwrap_or(false))
                    .collect();
                let in_category = |t: &Transaction| t.smart_category_id() == category_id;

                Ok(ItemStatistics {
                    name,
                    currency: base,
                    balance: income - expenses,
                    balance_base: None,
                    income,
                    expenses,
                    history,
                    upcoming: planned.summarize(keep(upcoming, in_category))?,
                    overdue: planned.summarize(keep(overdue, in_category))?,
                })
            }
        }
    }
}

fn keep(payments: PlannedPayments, predicate: impl Fn(&Transaction) -> bool) -> Vec<Transaction> {
    payments.items.into_iter().filter(|t| predicate(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, Category, TransactionType};
    use crate::storage::test_support::create_test_storage;
    use crate::storage::Repository;
    use chrono::{Duration, Utc};

    #[test]
    fn test_account_statistics() {
        let (_temp, storage) = create_test_storage();
        let cash = Account::new("Cash");
        let other = Account::new("Other");
        storage.accounts.upsert(cash.clone()).unwrap();
        storage.accounts.upsert(other.clone()).unwrap();

        let now = Utc::now().naive_utc();
        let txns = [
            Transaction::new(TransactionType::Income, cash.id, Money::from_cents(5_000), now - Duration::days(2)),
            Transaction::new(TransactionType::Expense, cash.id, Money::from_cents(1_500), now - Duration::days(1)),
            Transaction::new(TransactionType::Expense, cash.id, Money::from_cents(100), now - Duration::days(60)),
            Transaction::planned(TransactionType::Expense, cash.id, Money::from_cents(700), now + Duration::days(2)),
            Transaction::planned(TransactionType::Income, cash.id, Money::from_cents(300), now - Duration::days(3)),
            Transaction::planned(TransactionType::Expense, other.id, Money::from_cents(999), now + Duration::days(2)),
        ];
        for txn in txns {
            storage.transactions.upsert(txn).unwrap();
        }

        let range = DateRange::new(now - Duration::days(30), now + Duration::days(30));
        let stats = StatisticsService::new(&storage)
            .compute(StatisticsTarget::Account(cash.id), range)
            .unwrap();

        assert_eq!(stats.name, "Cash");
        assert_eq!(stats.balance.cents(), 3_400);
        assert!(stats.balance_base.is_none());
        assert_eq!(stats.income.cents(), 5_000);
        assert_eq!(stats.expenses.cents(), 1_500);
        assert_eq!(stats.history.len(), 2);
        assert_eq!(stats.upcoming.items.len(), 1);
        assert_eq!(stats.upcoming.expenses.cents(), 700);
        assert_eq!(stats.overdue.income.cents(), 300);
    }

    #[test]
    fn test_category_statistics() {
        let (_temp, storage) = create_test_storage();
        let cash = Account::new("Cash");
        let food = Category::new("Food");
        storage.accounts.upsert(cash.clone()).unwrap();
        storage.categories.upsert(food.clone()).unwrap();

        let now = Utc::now().naive_utc();
        let mut lunch =
            Transaction::new(TransactionType::Expense, cash.id, Money::from_cents(1_200), now - Duration::days(1));
        lunch.category_id = Some(food.id);
        let plain =
            Transaction::new(TransactionType::Expense, cash.id, Money::from_cents(300), now - Duration::days(1));
        storage.transactions.upsert(lunch).unwrap();
        storage.transactions.upsert(plain).unwrap();

        let range = DateRange::new(now - Duration::days(7), now + Duration::days(7));
        let service = StatisticsService::new(&storage);

        let stats = service.compute(StatisticsTarget::Category(Some(food.id)), range).unwrap();
        assert_eq!(stats.expenses.cents(), 1_200);
        assert_eq!(stats.balance.cents(), -1_200);
        assert_eq!(stats.currency, "USD");
        assert_eq!(stats.history.len(), 1);

        let unspecified = service.compute(StatisticsTarget::Category(None), range).unwrap();
        assert_eq!(unspecified.name, "Unspecified");
        assert_eq!(unspecified.expenses.cents(), 300);
    }

    #[test]
    fn test_unknown_target() {
        let (_temp, storage) = create_test_storage();
        let err = StatisticsService::new(&storage)
            .compute(StatisticsTarget::Account(AccountId::new()), DateRange::all_time())
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
