//! Budget model
//!
//! A budget caps monthly spending over a set of categories and accounts.
//! Empty id lists mean "all".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, BudgetId, CategoryId};
use super::money::Money;

/// A monthly spending budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,

    pub name: String,

    /// Monthly limit in the base currency
    pub amount: Money,

    /// Categories counted against the budget; empty means all
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,

    /// Accounts counted against the budget; empty means all
    #[serde(default)]
    pub account_ids: Vec<AccountId>,

    #[serde(default)]
    pub order_num: f64,

    #[serde(default)]
    pub is_synced: bool,

    #[serde(default)]
    pub is_deleted: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Create a new budget over all categories and accounts
    pub fn new(name: impl Into<String>, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            name: name.into(),
            amount,
            category_ids: Vec::new(),
            account_ids: Vec::new(),
            order_num: 0.0,
            is_synced: false,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether spending in this category counts against the budget
    pub fn covers_category(&self, category_id: Option<CategoryId>) -> bool {
        if self.category_ids.is_empty() {
            return true;
        }
        category_id
            .map(|id| self.category_ids.contains(&id))
            .unwrap_or(false)
    }

    /// Whether spending from this account counts against the budget
    pub fn covers_account(&self, account_id: AccountId) -> bool {
        self.account_ids.is_empty() || self.account_ids.contains(&account_id)
    }

    pub fn touch(&mut self) {
        self.is_synced = false;
        self.updated_at = Utc::now();
    }

    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
        self.touch();
    }

    /// Validate the budget
    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        if self.name.trim().is_empty() {
            return Err(BudgetValidationError::EmptyName);
        }
        if !self.amount.is_positive() {
            return Err(BudgetValidationError::NonPositiveAmount);
        }
        Ok(())
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BudgetValidationError {
    EmptyName,
    NonPositiveAmount,
}

impl fmt::Display for BudgetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Budget name cannot be empty"),
            Self::NonPositiveAmount => write!(f, "Budget amount must be greater than zero"),
        }
    }
}

impl std::error::Error for BudgetValidationError {}
