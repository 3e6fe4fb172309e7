//! Account service
//!
//! Provides business logic for account management including CRUD operations,
//! balance calculation, and balance adjustments.

use chrono::{NaiveDateTime, Utc};

use crate::audit::EntityType;
use crate::error::{WalletError, WalletResult};
use crate::events::WalletEvent;
use crate::models::{
    currency, Account, AccountId, DateRange, Money, Transaction, TransactionType,
};
use crate::services::exchange::ExchangeService;
use crate::services::paywall::{PaywallReason, PaywallService};
use crate::storage::{Repository, Storage};

/// Title given to transactions that correct an account balance
pub const BALANCE_ADJUSTMENT_TITLE: &str = "Adjust balance";

/// Input for creating an account
#[derive(Debug, Clone, Default)]
pub struct CreateAccountData {
    pub name: String,
    /// `None` keeps the account in the base currency
    pub currency: Option<String>,
    pub color: Option<u32>,
    pub icon: Option<String>,
    /// Opening balance, recorded as an adjustment transaction
    pub initial_balance: Option<Money>,
    pub include_in_balance: bool,
}

/// Field changes for an existing account; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct AccountEdit {
    pub name: Option<String>,
    pub currency: Option<String>,
    pub color: Option<u32>,
    pub icon: Option<String>,
    pub include_in_balance: Option<bool>,
}

/// An account with its computed figures
#[derive(Debug, Clone)]
pub struct AccountData {
    pub account: Account,
    /// Balance in the account's own currency
    pub balance: Money,
    /// Balance in the base currency, when the account uses another currency
    /// and a rate is known
    pub balance_base: Option<Money>,
    pub income: Money,
    pub expenses: Money,
}

/// Service for account management
pub struct AccountService<'a> {
    storage: &'a Storage,
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

impl<'a> AccountService<'a> {
    /// Create a new account service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new account
    pub fn create(&self, data: CreateAccountData) -> WalletResult<Account> {
        PaywallService::new(self.storage).protect_add(PaywallReason::Accounts)?;

        let name = data.name.trim();
        if self.storage.accounts.name_exists(name, None)? {
            return Err(WalletError::Duplicate {
                entity_type: "Account",
                identifier: name.to_string(),
            });
        }

        let mut account = Account::new(name);
        account.currency = currency::normalize_opt(data.currency.as_deref())?;
        account.icon = data.icon.filter(|i| !i.trim().is_empty());
        account.include_in_balance = data.include_in_balance;
        account.order_num = self.storage.accounts.max_order_num()? + 1.0;
        if let Some(color) = data.color {
            account.color = color;
        }

        account
            .validate()
            .map_err(|e| WalletError::Validation(e.to_string()))?;

        self.storage.accounts.upsert(account.clone())?;
        self.storage.accounts.save()?;

        self.storage.log_create(
            EntityType::Account,
            account.id.to_string(),
            Some(account.name.clone()),
            &account,
        )?;

        if let Some(initial) = data.initial_balance {
            self.adjust_balance(&account, initial)?;
        }

        tracing::debug!(account = %account.name, "account created");
        self.storage.notify(WalletEvent::AccountsUpdated);
        Ok(account)
    }

    /// Get an active account by id
    pub fn get(&self, id: AccountId) -> WalletResult<Option<Account>> {
        Ok(self.storage.accounts.get(id)?.filter(|a| !a.is_deleted))
    }

    /// Find an account by name or id
    pub fn find(&self, identifier: &str) -> WalletResult<Option<Account>> {
        self.storage.accounts.find(identifier)
    }

    /// Find an account or fail with a not-found error
    pub fn require(&self, identifier: &str) -> WalletResult<Account> {
        self.find(identifier)?
            .ok_or_else(|| WalletError::account_not_found(identifier))
    }

    /// Active accounts in display order
    pub fn list(&self) -> WalletResult<Vec<Account>> {
        self.storage.accounts.get_all()
    }

    /// Update an account, optionally correcting its balance
    ///
    /// When `new_balance` differs from the computed balance, an income or
    /// expense transaction for the difference is recorded.
    pub fn edit(
        &self,
        id: AccountId,
        edit: AccountEdit,
        new_balance: Option<Money>,
    ) -> WalletResult<Account> {
        let before = self
            .get(id)?
            .ok_or_else(|| WalletError::account_not_found(id.to_string()))?;
        let mut account = before.clone();

        if let Some(name) = edit.name {
            let name = name.trim();
            if self.storage.accounts.name_exists(name, Some(id))? {
                return Err(WalletError::Duplicate {
                    entity_type: "Account",
                    identifier: name.to_string(),
                });
            }
            account.name = name.to_string();
        }
        if let Some(code) = edit.currency {
            account.currency = currency::normalize_opt(Some(&code))?;
        }
        if let Some(color) = edit.color {
            account.color = color;
        }
        if let Some(icon) = edit.icon {
            account.icon = Some(icon).filter(|i| !i.trim().is_empty());
        }
        if let Some(include) = edit.include_in_balance {
            account.include_in_balance = include;
        }

        account
            .validate()
            .map_err(|e| WalletError::Validation(e.to_string()))?;
        account.touch();

        self.storage.accounts.upsert(account.clone())?;
        self.storage.accounts.save()?;
        self.storage.log_update(
            EntityType::Account,
            account.id.to_string(),
            Some(account.name.clone()),
            &before,
            &account,
        )?;

        if let Some(target) = new_balance {
            self.adjust_balance(&account, target)?;
        }

        tracing::debug!(account = %account.name, "account updated");
        self.storage.notify(WalletEvent::AccountsUpdated);
        Ok(account)
    }

    /// Record the transaction that brings an account to `target`
    ///
    /// Returns `None` when the balance already matches.
    pub fn adjust_balance(&self, account: &Account, target: Money) -> WalletResult<Option<Transaction>> {
        let diff = target - self.balance(account.id)?;
        if diff.is_zero() {
            return Ok(None);
        }

        let transaction_type = if diff.is_positive() {
            TransactionType::Income
        } else {
            TransactionType::Expense
        };
        let mut txn = Transaction::new(transaction_type, account.id, diff.abs(), now());
        txn.title = Some(BALANCE_ADJUSTMENT_TITLE.to_string());

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;
        self.storage.log_create(
            EntityType::Transaction,
            txn.id.to_string(),
            txn.title.clone(),
            &txn,
        )?;

        tracing::debug!(account = %account.name, %diff, "balance adjusted");
        self.storage.notify(WalletEvent::TransactionsUpdated);
        Ok(Some(txn))
    }

    /// Set the display order; `ids` lists accounts first to last
    pub fn reorder(&self, ids: &[AccountId]) -> WalletResult<()> {
        for (index, id) in ids.iter().enumerate() {
            let mut account = self
                .get(*id)?
                .ok_or_else(|| WalletError::account_not_found(id.to_string()))?;
            account.order_num = index as f64;
            account.touch();
            self.storage.accounts.upsert(account)?;
        }
        self.storage.accounts.save()?;
        self.storage.notify(WalletEvent::AccountsUpdated);
        Ok(())
    }

    /// Soft-delete an account together with the transactions it is the source of
    ///
    /// Transfers into the account become expenses of their source account.
    pub fn delete(&self, id: AccountId) -> WalletResult<Account> {
        let mut account = self
            .get(id)?
            .ok_or_else(|| WalletError::account_not_found(id.to_string()))?;

        let mut removed = 0;
        for mut txn in self.storage.transactions.get_by_account(id)? {
            if txn.account_id == id {
                txn.mark_deleted();
                removed += 1;
            } else {
                // Incoming transfer: the money still left the source account
                txn.transaction_type = TransactionType::Expense;
                txn.to_account_id = None;
                txn.to_amount = None;
                txn.touch();
            }
            self.storage.transactions.upsert(txn)?;
        }
        self.storage.transactions.save()?;

        account.mark_deleted();
        self.storage.accounts.upsert(account.clone())?;
        self.storage.accounts.save()?;

        if self.storage.settings.get()?.last_selected_account_id == Some(id) {
            self.storage.settings.update(|s| {
                s.last_selected_account_id = None;
                Ok(())
            })?;
        }

        self.storage.log_delete(
            EntityType::Account,
            account.id.to_string(),
            Some(account.name.clone()),
            &account,
        )?;

        tracing::debug!(account = %account.name, transactions = removed, "account deleted");
        self.storage.notify(WalletEvent::AccountsUpdated);
        self.storage.notify(WalletEvent::TransactionsUpdated);
        Ok(account)
    }

    /// Balance in the account's currency
    ///
    /// Planned payments do not count until they are paid.
    pub fn balance(&self, id: AccountId) -> WalletResult<Money> {
        Ok(self
            .storage
            .transactions
            .get_by_account(id)?
            .iter()
            .filter(|t| !t.is_planned())
            .map(|t| t.balance_effect(id))
            .sum())
    }

    /// Balance converted into the base currency
    pub fn balance_base_currency(&self, account: &Account) -> WalletResult<Money> {
        let base = self.storage.settings.base_currency()?;
        let balance = self.balance(account.id)?;
        ExchangeService::new(self.storage).convert_amount(
            balance,
            account.currency_or(&base),
            &base,
        )
    }

    fn sum_paid(&self, id: AccountId, range: DateRange, kind: TransactionType) -> WalletResult<Money> {
        Ok(self
            .storage
            .transactions
            .get_by_account(id)?
            .iter()
            .filter(|t| t.account_id == id && t.transaction_type == kind)
            .filter(|t| t.date_time.map(|d| range.contains(d)).unwrap_or(false))
            .map(|t| t.amount)
            .sum())
    }

    /// Income received by the account within the range; transfers excluded
    pub fn income(&self, id: AccountId, range: DateRange) -> WalletResult<Money> {
        self.sum_paid(id, range, TransactionType::Income)
    }

    /// Expenses paid from the account within the range; transfers excluded
    pub fn expenses(&self, id: AccountId, range: DateRange) -> WalletResult<Money> {
        self.sum_paid(id, range, TransactionType::Expense)
    }

    /// Every active account with its balance and period totals
    pub fn list_with_data(&self, range: DateRange) -> WalletResult<Vec<AccountData>> {
        let base = self.storage.settings.base_currency()?;
        let exchange = ExchangeService::new(self.storage);

        self.list()?
            .into_iter()
            .map(|account| {
                let balance = self.balance(account.id)?;
                let account_currency = account.currency_or(&base);
                let balance_base = if account_currency == base {
                    None
                } else {
                    match exchange.convert_amount(balance, account_currency, &base) {
                        Ok(converted) => Some(converted),
                        Err(WalletError::MissingExchangeRate { from, to }) => {
                            tracing::warn!(%from, %to, account = %account.name, "no exchange rate");
                            None
                        }
                        Err(e) => return Err(e),
                    }
                };
                Ok(AccountData {
                    income: self.income(account.id, range)?,
                    expenses: self.expenses(account.id, range)?,
                    account,
                    balance,
                    balance_base,
                })
            })
            .collect()
    }
}
