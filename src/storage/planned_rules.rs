//! Planned payment rule repository for JSON storage

use std::path::PathBuf;

use crate::error::WalletResult;
use crate::models::PlannedPaymentRule;

use super::repository::Repository;
use super::table::Table;

pub struct PlannedRuleRepository {
    table: Table<PlannedPaymentRule>,
}

impl Repository for PlannedRuleRepository {
    type Item = PlannedPaymentRule;

    fn table(&self) -> &Table<PlannedPaymentRule> {
        &self.table
    }
}

impl PlannedRuleRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            table: Table::new(path),
        }
    }

    /// Active rules ordered by start date
    pub fn get_all(&self) -> WalletResult<Vec<PlannedPaymentRule>> {
        let mut rules = self.table.active()?;
        rules.sort_by(|a, b| a.start_date.cmp(&b.start_date));
        Ok(rules)
    }

    /// Find an active rule by id
    pub fn find(&self, identifier: &str) -> WalletResult<Option<PlannedPaymentRule>> {
        Ok(self
            .table
            .active()?
            .into_iter()
            .find(|r| r.id.matches(identifier)))
    }
}
