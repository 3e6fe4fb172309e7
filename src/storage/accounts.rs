//! Account repository for JSON storage
//!
//! Manages loading and saving accounts to accounts.json

use std::path::PathBuf;

use crate::error::WalletResult;
use crate::models::{Account, AccountId};

use super::repository::Repository;
use super::table::Table;

/// Repository for account persistence
pub struct AccountRepository {
    table: Table<Account>,
}

impl Repository for AccountRepository {
    type Item = Account;

    fn table(&self) -> &Table<Account> {
        &self.table
    }
}

impl AccountRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            table: Table::new(path),
        }
    }

    /// Active accounts in display order
    pub fn get_all(&self) -> WalletResult<Vec<Account>> {
        let mut accounts = self.table.active()?;
        accounts.sort_by(|a, b| {
            a.order_num
                .total_cmp(&b.order_num)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(accounts)
    }

    /// Get an active account by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> WalletResult<Option<Account>> {
        let name_lower = name.trim().to_lowercase();
        Ok(self
            .table
            .active()?
            .into_iter()
            .find(|a| a.name.to_lowercase() == name_lower))
    }

    /// Check if an account name is already taken by an active account
    pub fn name_exists(&self, name: &str, exclude_id: Option<AccountId>) -> WalletResult<bool> {
        Ok(self
            .get_by_name(name)?
            .map(|a| Some(a.id) != exclude_id)
            .unwrap_or(false))
    }

    /// Find an active account by name or id
    pub fn find(&self, identifier: &str) -> WalletResult<Option<Account>> {
        if let Some(account) = self.get_by_name(identifier)? {
            return Ok(Some(account));
        }
        Ok(self
            .table
            .active()?
            .into_iter()
            .find(|a| a.id.matches(identifier)))
    }

    /// Whether an account exists and is not deleted
    pub fn exists(&self, id: AccountId) -> WalletResult<bool> {
        Ok(self.get(id)?.map(|a| !a.is_deleted).unwrap_or(false))
    }

    /// Highest `order_num` in use, or -1 when there are no accounts
    pub fn max_order_num(&self) -> WalletResult<f64> {
        Ok(self
            .table
            .active()?
            .iter()
            .map(|a| a.order_num)
            .fold(-1.0, f64::max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, AccountRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = AccountRepository::new(temp_dir.path().join("accounts.json"));
        repo.load().unwrap();
        (temp_dir, repo)
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let account = Account::with_currency("Revolut", "EUR");
        let id = account.id;
        repo.upsert(account).unwrap();
        repo.save().unwrap();

        let reloaded = AccountRepository::new(temp_dir.path().join("accounts.json"));
        reloaded.load().unwrap();
        let account = reloaded.get(id).unwrap().unwrap();
        assert_eq!(account.currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_get_all_sorted_and_active() {
        let (_temp_dir, repo) = create_test_repo();
        let mut bank = Account::new("Bank");
        bank.order_num = 1.0;
        let mut cash = Account::new("Cash");
        cash.order_num = 0.0;
        let mut gone = Account::new("Gone");
        gone.mark_deleted();

        repo.upsert(bank).unwrap();
        repo.upsert(cash).unwrap();
        repo.upsert(gone).unwrap();

        let names: Vec<_> = repo.get_all().unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["Cash", "Bank"]);
        assert_eq!(repo.count().unwrap(), 2);
        assert_eq!(repo.max_order_num().unwrap(), 1.0);
    }

    #[test]
    fn test_find_by_name_or_id() {
        let (_temp_dir, repo) = create_test_repo();
        let account = Account::new("My Card");
        let id = account.id;
        repo.upsert(account).unwrap();

        assert!(repo.find("my card").unwrap().is_some());
        assert!(repo.find(&id.to_string()).unwrap().is_some());
        assert!(repo.find("other").unwrap().is_none());
    }

    #[test]
    fn test_name_exists() {
        let (_temp_dir, repo) = create_test_repo();
        let account = Account::new("Cash");
        let id = account.id;
        repo.upsert(account).unwrap();

        assert!(repo.name_exists("CASH", None).unwrap());
        assert!(!repo.name_exists("cash", Some(id)).unwrap());
        assert!(!repo.name_exists("bank", None).unwrap());
    }

    #[test]
    fn test_empty_max_order() {
        let (_temp_dir, repo) = create_test_repo();
        assert_eq!(repo.max_order_num().unwrap(), -1.0);
    }
}
