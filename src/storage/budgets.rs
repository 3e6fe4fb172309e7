//! Budget repository for JSON storage

use std::path::PathBuf;

use crate::error::WalletResult;
use crate::models::Budget;

use super::repository::Repository;
use super::table::Table;

pub struct BudgetRepository {
    table: Table<Budget>,
}

impl Repository for BudgetRepository {
    type Item = Budget;

    fn table(&self) -> &Table<Budget> {
        &self.table
    }
}

impl BudgetRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            table: Table::new(path),
        }
    }

    /// Active budgets in display order
    pub fn get_all(&self) -> WalletResult<Vec<Budget>> {
        let mut budgets = self.table.active()?;
        budgets.sort_by(|a, b| {
            a.order_num
                .total_cmp(&b.order_num)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(budgets)
    }

    /// Find an active budget by name (case-insensitive) or id
    pub fn find(&self, identifier: &str) -> WalletResult<Option<Budget>> {
        let lower = identifier.trim().to_lowercase();
        let budgets = self.table.active()?;
        if let Some(budget) = budgets.iter().find(|b| b.name.to_lowercase() == lower) {
            return Ok(Some(budget.clone()));
        }
        Ok(budgets.into_iter().find(|b| b.id.matches(identifier)))
    }

    pub fn max_order_num(&self) -> WalletResult<f64> {
        Ok(self
            .table
            .active()?
            .iter()
            .map(|b| b.order_num)
            .fold(-1.0, f64::max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use tempfile::TempDir;

    #[test]
    fn test_find_and_order() {
        let temp_dir = TempDir::new().unwrap();
        let repo = BudgetRepository::new(temp_dir.path().join("budgets.json"));
        repo.load().unwrap();

        let mut travel = Budget::new("Travel", Money::from_cents(10000));
        travel.order_num = 1.0;
        repo.upsert(travel).unwrap();
        repo.upsert(Budget::new("Food", Money::from_cents(30000))).unwrap();

        let names: Vec<_> = repo.get_all().unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["Food", "Travel"]);
        assert!(repo.find("travel").unwrap().is_some());
        assert_eq!(repo.max_order_num().unwrap(), 1.0);
    }
}
