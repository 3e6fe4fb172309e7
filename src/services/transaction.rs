//! Transaction service
//!
//! Turns edit drafts into stored transactions. `save` is the single entry
//! point for both new and edited transactions: it validates, applies the
//! paywall quota check, resolves defaults, converts transfer amounts and
//! finally kicks off a best-effort auto-sync.

use chrono::{NaiveDateTime, Utc};

use crate::audit::EntityType;
use crate::error::{WalletError, WalletResult};
use crate::events::WalletEvent;
use crate::models::{
    Account, AccountId, CategoryId, DateRange, Money, Transaction, TransactionId, TransactionType,
};
use crate::services::exchange::ExchangeService;
use crate::services::paywall::PaywallService;
use crate::services::sync::SyncService;
use crate::storage::{Repository, Storage};

/// Edit state for a new or existing transaction
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    /// Set when editing an existing transaction
    pub id: Option<TransactionId>,
    pub transaction_type: TransactionType,
    pub amount: Money,
    /// `None` picks the default account
    pub account_id: Option<AccountId>,
    pub to_account_id: Option<AccountId>,
    /// Received amount for transfers; computed from rates when absent
    pub to_amount: Option<Money>,
    pub category_id: Option<CategoryId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date_time: Option<NaiveDateTime>,
    pub due_date: Option<NaiveDateTime>,
}

impl TransactionDraft {
    pub fn new(transaction_type: TransactionType, amount: Money) -> Self {
        Self {
            id: None,
            transaction_type,
            amount,
            account_id: None,
            to_account_id: None,
            to_amount: None,
            category_id: None,
            title: None,
            description: None,
            date_time: None,
            due_date: None,
        }
    }

    /// Check the draft before anything is stored
    pub fn validate(&self) -> WalletResult<()> {
        if !self.amount.is_positive() {
            return Err(WalletError::Validation(format!(
                "Amount must be greater than zero, got {}",
                self.amount
            )));
        }

        if self.transaction_type == TransactionType::Transfer {
            match self.to_account_id {
                None => {
                    return Err(WalletError::Validation(
                        "Transfer requires a destination account".into(),
                    ))
                }
                Some(to) if Some(to) == self.account_id => {
                    return Err(WalletError::Validation(
                        "Cannot transfer to the same account".into(),
                    ))
                }
                _ => {}
            }
            if let Some(to_amount) = self.to_amount {
                if !to_amount.is_positive() {
                    return Err(WalletError::Validation(format!(
                        "Received amount must be greater than zero, got {}",
                        to_amount
                    )));
                }
            }
        }

        Ok(())
    }
}

impl From<&Transaction> for TransactionDraft {
    fn from(txn: &Transaction) -> Self {
        Self {
            id: Some(txn.id),
            transaction_type: txn.transaction_type,
            amount: txn.amount,
            account_id: Some(txn.account_id),
            to_account_id: txn.to_account_id,
            to_amount: txn.to_amount,
            category_id: txn.category_id,
            title: txn.title.clone(),
            description: txn.description.clone(),
            date_time: txn.date_time,
            due_date: txn.due_date,
        }
    }
}

/// Filter options for listing transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub account_id: Option<AccountId>,
    pub category_id: Option<CategoryId>,
    pub transaction_type: Option<TransactionType>,
    pub range: DateRange,
    /// Include unpaid planned payments
    pub include_planned: bool,
    /// Case-insensitive match against title and description
    pub search: Option<String>,
    pub limit: Option<usize>,
}

impl TransactionFilter {
    fn matches(&self, txn: &Transaction) -> bool {
        if !self.include_planned && txn.is_planned() {
            return false;
        }
        if let Some(account_id) = self.account_id {
            if !txn.involves_account(account_id) {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if txn.smart_category_id() != Some(category_id) {
                return false;
            }
        }
        if let Some(kind) = self.transaction_type {
            if txn.transaction_type != kind {
                return false;
            }
        }
        if !txn.effective_date().map(|d| self.range.contains(d)).unwrap_or(false) {
            return false;
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let hit = |field: &Option<String>| {
                field
                    .as_deref()
                    .map(|v| v.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            };
            if !hit(&txn.title) && !hit(&txn.description) {
                return false;
            }
        }
        true
    }
}

fn clean(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
}

impl<'a> TransactionService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Pick the account for a new transaction
    ///
    /// An explicit name or id wins, then the last selected account (if it
    /// still exists), then the first account in display order.
    pub fn default_account(&self, explicit: Option<&str>) -> WalletResult<Account> {
        if let Some(identifier) = explicit {
            return self
                .storage
                .accounts
                .find(identifier)?
                .ok_or_else(|| WalletError::account_not_found(identifier));
        }

        if let Some(last) = self.storage.settings.get()?.last_selected_account_id {
            if let Some(account) = self.storage.accounts.get(last)?.filter(|a| !a.is_deleted) {
                return Ok(account);
            }
        }

        self.storage
            .accounts
            .get_all()?
            .into_iter()
            .next()
            .ok_or_else(|| {
                WalletError::Validation("No accounts yet. Create one with 'wallet account create'".into())
            })
    }

    fn require_account(&self, id: AccountId) -> WalletResult<Account> {
        self.storage
            .accounts
            .get(id)?
            .filter(|a| !a.is_deleted)
            .ok_or_else(|| WalletError::account_not_found(id.to_string()))
    }

    /// Store a draft as a new or updated transaction
    pub fn save(&self, draft: TransactionDraft) -> WalletResult<Transaction> {
        draft.validate()?;
        PaywallService::new(self.storage).protect_quota_exceeded()?;

        let account = match draft.account_id {
            Some(id) => self.require_account(id)?,
            None => self.default_account(None)?,
        };
        if draft.transaction_type == TransactionType::Transfer && draft.to_account_id == Some(account.id) {
            return Err(WalletError::Validation("Cannot transfer to the same account".into()));
        }

        let is_transfer = draft.transaction_type == TransactionType::Transfer;
        let (to_account_id, to_amount) = match (is_transfer, draft.to_account_id) {
            (true, Some(to_id)) => {
                let to_account = self.require_account(to_id)?;
                let to_amount = match draft.to_amount {
                    Some(amount) => amount,
                    None => {
                        let base = self.storage.settings.base_currency()?;
                        ExchangeService::new(self.storage).convert_amount(
                            draft.amount,
                            account.currency_or(&base),
                            to_account.currency_or(&base),
                        )?
                    }
                };
                (Some(to_id), Some(to_amount))
            }
            _ => (None, None),
        };

        let category_id = if is_transfer { None } else { draft.category_id };
        if let Some(category_id) = category_id {
            if self.storage.categories.get(category_id)?.filter(|c| !c.is_deleted).is_none() {
                return Err(WalletError::category_not_found(category_id.to_string()));
            }
        }

        let date_time = match (draft.date_time, draft.due_date) {
            (None, None) => Some(Utc::now().naive_utc()),
            (date_time, _) => date_time,
        };

        let existing = match draft.id {
            Some(id) => Some(
                self.get(id)?
                    .ok_or_else(|| WalletError::transaction_not_found(id.to_string()))?,
            ),
            None => None,
        };

        let mut txn = match &existing {
            Some(before) => before.clone(),
            None => Transaction::new(
                draft.transaction_type,
                account.id,
                draft.amount,
                Utc::now().naive_utc(),
            ),
        };
        txn.transaction_type = draft.transaction_type;
        txn.amount = draft.amount;
        txn.account_id = account.id;
        txn.to_account_id = to_account_id;
        txn.to_amount = to_amount;
        txn.category_id = category_id;
        txn.title = clean(draft.title);
        txn.description = clean(draft.description);
        txn.date_time = date_time;
        txn.due_date = if date_time.is_some() { None } else { draft.due_date };
        txn.touch();

        txn.validate()
            .map_err(|e| WalletError::Validation(e.to_string()))?;

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;

        match &existing {
            Some(before) => self.storage.log_update(
                EntityType::Transaction,
                txn.id.to_string(),
                txn.title.clone(),
                before,
                &txn,
            )?,
            None => self.storage.log_create(
                EntityType::Transaction,
                txn.id.to_string(),
                txn.title.clone(),
                &txn,
            )?,
        }

        self.storage.settings.update(|s| {
            s.last_selected_account_id = Some(account.id);
            Ok(())
        })?;

        tracing::debug!(id = %txn.id, kind = %txn.transaction_type, amount = %txn.amount, "transaction saved");
        self.storage.notify(WalletEvent::TransactionsUpdated);
        self.auto_sync();
        Ok(txn)
    }

    /// Soft-delete a transaction; sync removes it from the remote later
    pub fn delete(&self, id: TransactionId) -> WalletResult<Transaction> {
        let mut txn = self
            .get(id)?
            .ok_or_else(|| WalletError::transaction_not_found(id.to_string()))?;

        txn.mark_deleted();
        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;
        self.storage.log_delete(
            EntityType::Transaction,
            txn.id.to_string(),
            txn.title.clone(),
            &txn,
        )?;

        tracing::debug!(id = %txn.id, "transaction deleted");
        self.storage.notify(WalletEvent::TransactionsUpdated);
        self.auto_sync();
        Ok(txn)
    }

    /// Get an active transaction by id
    pub fn get(&self, id: TransactionId) -> WalletResult<Option<Transaction>> {
        Ok(self.storage.transactions.get(id)?.filter(|t| !t.is_deleted))
    }

    /// Find an active transaction by full or short id
    pub fn find(&self, identifier: &str) -> WalletResult<Option<Transaction>> {
        self.storage.transactions.find(identifier)
    }

    /// Transactions matching a filter, newest first
    pub fn list(&self, filter: &TransactionFilter) -> WalletResult<Vec<Transaction>> {
        let candidates = match (filter.account_id, filter.category_id) {
            (Some(account_id), _) => self.storage.transactions.get_by_account(account_id)?,
            (None, Some(category_id)) => self.storage.transactions.get_by_category(category_id)?,
            (None, None) => self.storage.transactions.get_all()?,
        };

        let matching = candidates.into_iter().filter(|t| filter.matches(t));
        Ok(match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    fn auto_sync(&self) {
        match SyncService::new(self.storage) {
            Ok(sync) => sync.sync_if_enabled(),
            Err(e) => tracing::warn!(error = %e, "auto-sync skipped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::storage::test_support::create_test_storage;
    use chrono::NaiveDate;

    fn at(month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, month, day)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn setup() -> (tempfile::TempDir, Storage, Account, Account) {
        let (temp, storage) = create_test_storage();
        let cash = Account::new("Cash");
        let mut bank = Account::with_currency("Bank", "EUR");
        bank.order_num = 1.0;
        storage.accounts.upsert(cash.clone()).unwrap();
        storage.accounts.upsert(bank.clone()).unwrap();
        (temp, storage, cash, bank)
    }

    fn expense(account: &Account, cents: i64) -> TransactionDraft {
        let mut draft = TransactionDraft::new(TransactionType::Expense, Money::from_cents(cents));
        draft.account_id = Some(account.id);
        draft
    }

    #[test]
    fn test_zero_amount_rejected() {
        let (_temp, storage, cash, _) = setup();
        let service = TransactionService::new(&storage);
        let err = service.save(expense(&cash, 0)).unwrap_err();
        assert!(err.is_validation());
        assert!(storage.transactions.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_transfer_validation() {
        let (_temp, storage, cash, _) = setup();
        let service = TransactionService::new(&storage);

        let mut draft = TransactionDraft::new(TransactionType::Transfer, Money::from_cents(100));
        draft.account_id = Some(cash.id);
        assert!(service.save(draft.clone()).unwrap_err().is_validation());

        draft.to_account_id = Some(cash.id);
        assert!(service.save(draft).unwrap_err().is_validation());
    }

    #[test]
    fn test_save_trims_and_defaults_date() {
        let (_temp, storage, cash, _) = setup();
        let service = TransactionService::new(&storage);

        let mut draft = expense(&cash, 1_250);
        draft.title = Some("  Coffee  ".into());
        draft.description = Some("   ".into());
        let txn = service.save(draft).unwrap();

        assert_eq!(txn.title.as_deref(), Some("Coffee"));
        assert!(txn.description.is_none());
        assert!(txn.date_time.is_some());
        assert!(!txn.is_synced);
        assert_eq!(
            storage.settings.get().unwrap().last_selected_account_id,
            Some(cash.id)
        );
    }

    #[test]
    fn test_transfer_converts_and_drops_category() {
        let (_temp, storage, cash, bank) = setup();
        ExchangeService::new(&storage).set_rate("EUR", 0.5).unwrap();
        let category = Category::new("Misc");
        storage.categories.upsert(category.clone()).unwrap();
        let service = TransactionService::new(&storage);

        let mut draft = TransactionDraft::new(TransactionType::Transfer, Money::from_cents(1_000));
        draft.account_id = Some(cash.id);
        draft.to_account_id = Some(bank.id);
        draft.category_id = Some(category.id);
        let txn = service.save(draft).unwrap();

        assert_eq!(txn.to_amount.map(|m| m.cents()), Some(500));
        assert!(txn.category_id.is_none());
    }

    #[test]
    fn test_transfer_without_rate_fails() {
        let (_temp, storage, cash, bank) = setup();
        let service = TransactionService::new(&storage);
        let mut draft = TransactionDraft::new(TransactionType::Transfer, Money::from_cents(1_000));
        draft.account_id = Some(cash.id);
        draft.to_account_id = Some(bank.id);

        let err = service.save(draft.clone()).unwrap_err();
        assert!(matches!(err, WalletError::MissingExchangeRate { .. }));

        draft.to_amount = Some(Money::from_cents(920));
        assert_eq!(service.save(draft).unwrap().received_amount().cents(), 920);
    }

    #[test]
    fn test_planned_draft_keeps_due_date() {
        let (_temp, storage, cash, _) = setup();
        let service = TransactionService::new(&storage);
        let mut draft = expense(&cash, 900);
        draft.due_date = Some(at(12, 1));
        let txn = service.save(draft).unwrap();
        assert!(txn.is_planned());
    }

    #[test]
    fn test_edit_existing() {
        let (_temp, storage, cash, bank) = setup();
        let service = TransactionService::new(&storage);
        let original = service.save(expense(&cash, 500)).unwrap();

        let mut draft = TransactionDraft::from(&original);
        draft.amount = Money::from_cents(700);
        draft.account_id = Some(bank.id);
        let edited = service.save(draft).unwrap();

        assert_eq!(edited.id, original.id);
        assert_eq!(edited.created_at, original.created_at);
        assert_eq!(storage.transactions.get_all().unwrap().len(), 1);
        assert_eq!(storage.transactions.get_by_account(bank.id).unwrap().len(), 1);
        assert!(storage.transactions.get_by_account(cash.id).unwrap().is_empty());
    }

    #[test]
    fn test_default_account_resolution() {
        let (_temp, storage, cash, bank) = setup();
        let service = TransactionService::new(&storage);

        assert_eq!(service.default_account(None).unwrap().id, cash.id);
        assert_eq!(service.default_account(Some("bank")).unwrap().id, bank.id);
        assert!(service.default_account(Some("nope")).unwrap_err().is_not_found());

        service.save(expense(&bank, 100)).unwrap();
        assert_eq!(service.default_account(None).unwrap().id, bank.id);
    }

    #[test]
    fn test_default_account_requires_accounts() {
        let (_temp, storage) = create_test_storage();
        let service = TransactionService::new(&storage);
        assert!(service.default_account(None).is_err());
    }

    #[test]
    fn test_delete_is_soft() {
        let (_temp, storage, cash, _) = setup();
        let service = TransactionService::new(&storage);
        let txn = service.save(expense(&cash, 100)).unwrap();

        service.delete(txn.id).unwrap();
        assert!(service.get(txn.id).unwrap().is_none());
        assert!(storage.transactions.get(txn.id).unwrap().unwrap().is_deleted);
        assert!(service.delete(txn.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_filters() {
        let (_temp, storage, cash, bank) = setup();
        let service = TransactionService::new(&storage);

        let mut coffee = expense(&cash, 300);
        coffee.title = Some("Coffee".into());
        coffee.date_time = Some(at(3, 1));
        service.save(coffee).unwrap();

        let mut salary = TransactionDraft::new(TransactionType::Income, Money::from_cents(100_000));
        salary.account_id = Some(bank.id);
        salary.date_time = Some(at(3, 5));
        service.save(salary).unwrap();

        let mut rent = expense(&cash, 50_000);
        rent.due_date = Some(at(4, 1));
        service.save(rent).unwrap();

        let all = service.list(&TransactionFilter::default()).unwrap();
        assert_eq!(all.len(), 2);

        let with_planned = service
            .list(&TransactionFilter {
                include_planned: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(with_planned.len(), 3);

        let cash_only = service
            .list(&TransactionFilter {
                account_id: Some(cash.id),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(cash_only.len(), 1);

        let searched = service
            .list(&TransactionFilter {
                search: Some("coff".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(searched[0].title.as_deref(), Some("Coffee"));

        let income = service
            .list(&TransactionFilter {
                transaction_type: Some(TransactionType::Income),
                limit: Some(5),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(income.len(), 1);
    }

    #[test]
    fn test_quota_exceeded_blocks_save() {
        let (_temp, storage, cash, _) = setup();
        for name in ["A", "B", "C"] {
            storage.accounts.upsert(Account::new(name)).unwrap();
        }
        let service = TransactionService::new(&storage);
        assert!(service.save(expense(&cash, 100)).unwrap_err().is_paywall());
    }
}
