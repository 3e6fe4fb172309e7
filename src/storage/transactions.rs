//! Transaction repository for JSON storage
//!
//! Keeps secondary indexes by account (both sides of a transfer) and by
//! category so per-account balances don't scan the whole ledger.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::WalletResult;
use crate::models::{AccountId, CategoryId, PlannedRuleId, Transaction, TransactionId};

use super::repository::Repository;
use super::table::{read_lock, write_lock, Table};

/// Repository for transaction persistence with indexing
pub struct TransactionRepository {
    table: Table<Transaction>,
    /// Index: account_id -> transaction_ids
    by_account: RwLock<HashMap<AccountId, Vec<TransactionId>>>,
    /// Index: category_id -> transaction_ids
    by_category: RwLock<HashMap<CategoryId, Vec<TransactionId>>>,
}

fn newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| {
        b.effective_date()
            .cmp(&a.effective_date())
            .then(b.created_at.cmp(&a.created_at))
    });
}

impl Repository for TransactionRepository {
    type Item = Transaction;

    fn table(&self) -> &Table<Transaction> {
        &self.table
    }

    fn load(&self) -> WalletResult<()> {
        let transactions = self.table.load()?;

        let mut by_account = write_lock(&self.by_account)?;
        let mut by_category = write_lock(&self.by_category)?;
        by_account.clear();
        by_category.clear();

        for txn in &transactions {
            index(&mut by_account, &mut by_category, txn);
        }
        Ok(())
    }

    fn upsert(&self, txn: Transaction) -> WalletResult<()> {
        let mut by_account = write_lock(&self.by_account)?;
        let mut by_category = write_lock(&self.by_category)?;

        if let Some(old) = self.table.insert(txn.clone())? {
            unindex(&mut by_account, &mut by_category, &old);
        }
        index(&mut by_account, &mut by_category, &txn);
        Ok(())
    }

    fn purge(&self, id: TransactionId) -> WalletResult<bool> {
        let mut by_account = write_lock(&self.by_account)?;
        let mut by_category = write_lock(&self.by_category)?;

        match self.table.remove(id)? {
            Some(old) => {
                unindex(&mut by_account, &mut by_category, &old);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn index(
    by_account: &mut HashMap<AccountId, Vec<TransactionId>>,
    by_category: &mut HashMap<CategoryId, Vec<TransactionId>>,
    txn: &Transaction,
) {
    by_account.entry(txn.account_id).or_default().push(txn.id);
    if let Some(to) = txn.to_account_id {
        if to != txn.account_id {
            by_account.entry(to).or_default().push(txn.id);
        }
    }
    if let Some(category_id) = txn.category_id {
        by_category.entry(category_id).or_default().push(txn.id);
    }
}

fn unindex(
    by_account: &mut HashMap<AccountId, Vec<TransactionId>>,
    by_category: &mut HashMap<CategoryId, Vec<TransactionId>>,
    txn: &Transaction,
) {
    for account_id in [Some(txn.account_id), txn.to_account_id].into_iter().flatten() {
        if let Some(ids) = by_account.get_mut(&account_id) {
            ids.retain(|&id| id != txn.id);
        }
    }
    if let Some(category_id) = txn.category_id {
        if let Some(ids) = by_category.get_mut(&category_id) {
            ids.retain(|&id| id != txn.id);
        }
    }
}

impl TransactionRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            table: Table::new(path),
            by_account: RwLock::new(HashMap::new()),
            by_category: RwLock::new(HashMap::new()),
        }
    }

    /// All active transactions, newest first
    pub fn get_all(&self) -> WalletResult<Vec<Transaction>> {
        let mut transactions = self.table.active()?;
        newest_first(&mut transactions);
        Ok(transactions)
    }

    fn resolve(&self, ids: Option<&Vec<TransactionId>>) -> WalletResult<Vec<Transaction>> {
        let mut transactions = Vec::new();
        for id in ids.map(|v| v.as_slice()).unwrap_or(&[]) {
            if let Some(txn) = self.table.get(*id)? {
                if !txn.is_deleted {
                    transactions.push(txn);
                }
            }
        }
        newest_first(&mut transactions);
        Ok(transactions)
    }

    /// Active transactions touching an account on either side
    pub fn get_by_account(&self, account_id: AccountId) -> WalletResult<Vec<Transaction>> {
        let by_account = read_lock(&self.by_account)?;
        self.resolve(by_account.get(&account_id))
    }

    /// Active transactions in a category
    pub fn get_by_category(&self, category_id: CategoryId) -> WalletResult<Vec<Transaction>> {
        let by_category = read_lock(&self.by_category)?;
        self.resolve(by_category.get(&category_id))
    }

    /// Active transactions generated by a planned payment rule
    pub fn get_by_rule(&self, rule_id: PlannedRuleId) -> WalletResult<Vec<Transaction>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|t| t.recurring_rule_id == Some(rule_id))
            .collect())
    }

    /// Find an active transaction by import ID
    pub fn find_by_import_id(&self, import_id: &str) -> WalletResult<Option<Transaction>> {
        Ok(self
            .table
            .active()?
            .into_iter()
            .find(|t| t.import_id.as_deref() == Some(import_id)))
    }

    /// Find an active transaction by full or short id
    pub fn find(&self, identifier: &str) -> WalletResult<Option<Transaction>> {
        Ok(self
            .table
            .active()?
            .into_iter()
            .find(|t| t.id.matches(identifier)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, TransactionType};
    use chrono::{NaiveDate, NaiveDateTime};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, TransactionRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = TransactionRepository::new(temp_dir.path().join("transactions.json"));
        repo.load().unwrap();
        (temp_dir, repo)
    }

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, d)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn expense(account_id: AccountId, cents: i64, d: u32) -> Transaction {
        Transaction::new(TransactionType::Expense, account_id, Money::from_cents(cents), day(d))
    }

    #[test]
    fn test_get_by_account_includes_transfer_destination() {
        let (_temp, repo) = create_test_repo();
        let a = AccountId::new();
        let b = AccountId::new();

        repo.upsert(expense(a, 100, 1)).unwrap();
        repo.upsert(Transaction::transfer(
            a,
            b,
            Money::from_cents(500),
            Money::from_cents(500),
            day(2),
        ))
        .unwrap();

        assert_eq!(repo.get_by_account(a).unwrap().len(), 2);
        assert_eq!(repo.get_by_account(b).unwrap().len(), 1);
    }

    #[test]
    fn test_reindex_on_update() {
        let (_temp, repo) = create_test_repo();
        let a = AccountId::new();
        let b = AccountId::new();
        let food = CategoryId::new();

        let mut txn = expense(a, 100, 1);
        txn.category_id = Some(food);
        repo.upsert(txn.clone()).unwrap();
        assert_eq!(repo.get_by_category(food).unwrap().len(), 1);

        txn.account_id = b;
        txn.category_id = None;
        repo.upsert(txn).unwrap();

        assert!(repo.get_by_account(a).unwrap().is_empty());
        assert_eq!(repo.get_by_account(b).unwrap().len(), 1);
        assert!(repo.get_by_category(food).unwrap().is_empty());
    }

    #[test]
    fn test_soft_deleted_excluded_and_purge() {
        let (_temp, repo) = create_test_repo();
        let a = AccountId::new();
        let mut txn = expense(a, 100, 1);
        txn.mark_deleted();
        let id = txn.id;
        repo.upsert(txn).unwrap();

        assert!(repo.get_all().unwrap().is_empty());
        assert!(repo.get_by_account(a).unwrap().is_empty());
        assert_eq!(repo.get_unsynced().unwrap().len(), 1);

        assert!(repo.purge(id).unwrap());
        assert!(repo.get(id).unwrap().is_none());
    }

    #[test]
    fn test_newest_first_and_reload_rebuilds_indexes() {
        let (temp, repo) = create_test_repo();
        let a = AccountId::new();
        repo.upsert(expense(a, 100, 1)).unwrap();
        repo.upsert(expense(a, 200, 5)).unwrap();
        repo.save().unwrap();

        let reloaded = TransactionRepository::new(temp.path().join("transactions.json"));
        reloaded.load().unwrap();
        let txns = reloaded.get_by_account(a).unwrap();
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].amount.cents(), 200);
    }

    #[test]
    fn test_find_by_import_id() {
        let (_temp, repo) = create_test_repo();
        let mut txn = expense(AccountId::new(), 100, 1);
        txn.import_id = Some("imp-1".to_string());
        repo.upsert(txn).unwrap();

        assert!(repo.find_by_import_id("imp-1").unwrap().is_some());
        assert!(repo.find_by_import_id("imp-2").unwrap().is_none());
    }
}
