//! Category service
//!
//! Provides business logic for category management and per-category income
//! and expense totals in the base currency.

use crate::audit::EntityType;
use crate::error::{WalletError, WalletResult};
use crate::events::WalletEvent;
use crate::models::{Category, CategoryId, DateRange, Money, Transaction, TransactionType};
use crate::services::exchange::ExchangeService;
use crate::services::paywall::{PaywallReason, PaywallService};
use crate::storage::{Repository, Storage};

/// Field changes for an existing category; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct CategoryEdit {
    pub name: Option<String>,
    pub color: Option<u32>,
    pub icon: Option<String>,
}

/// A category with its totals over a period, in the base currency
#[derive(Debug, Clone)]
pub struct CategoryData {
    pub category: Category,
    pub income: Money,
    pub expenses: Money,
    /// income - expenses
    pub balance: Money,
}

/// Service for category management
pub struct CategoryService<'a> {
    storage: &'a Storage,
}

impl<'a> CategoryService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new category
    pub fn create(&self, name: &str, color: Option<u32>, icon: Option<String>) -> WalletResult<Category> {
        PaywallService::new(self.storage).protect_add(PaywallReason::Categories)?;

        let name = name.trim();
        if self.storage.categories.name_exists(name, None)? {
            return Err(WalletError::Duplicate {
                entity_type: "Category",
                identifier: name.to_string(),
            });
        }

        let mut category =
            Category::with_order(name, self.storage.categories.max_order_num()? + 1.0);
        if let Some(color) = color {
            category.color = color;
        }
        category.icon = icon.filter(|i| !i.trim().is_empty());
        category
            .validate()
            .map_err(|e| WalletError::Validation(e.to_string()))?;

        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;
        self.storage.log_create(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &category,
        )?;

        tracing::debug!(category = %category.name, "category created");
        self.storage.notify(WalletEvent::CategoriesUpdated);
        Ok(category)
    }

    pub fn get(&self, id: CategoryId) -> WalletResult<Option<Category>> {
        Ok(self.storage.categories.get(id)?.filter(|c| !c.is_deleted))
    }

    /// Find a category by name or id
    pub fn find(&self, identifier: &str) -> WalletResult<Option<Category>> {
        self.storage.categories.find(identifier)
    }

    pub fn require(&self, identifier: &str) -> WalletResult<Category> {
        self.find(identifier)?
            .ok_or_else(|| WalletError::category_not_found(identifier))
    }

    pub fn list(&self) -> WalletResult<Vec<Category>> {
        self.storage.categories.get_all()
    }

    /// Update a category
    pub fn edit(&self, id: CategoryId, edit: CategoryEdit) -> WalletResult<Category> {
        let before = self
            .get(id)?
            .ok_or_else(|| WalletError::category_not_found(id.to_string()))?;
        let mut category = before.clone();

        if let Some(name) = edit.name {
            let name = name.trim();
            if self.storage.categories.name_exists(name, Some(id))? {
                return Err(WalletError::Duplicate {
                    entity_type: "Category",
                    identifier: name.to_string(),
                });
            }
            category.name = name.to_string();
        }
        if let Some(color) = edit.color {
            category.color = color;
        }
        if let Some(icon) = edit.icon {
            category.icon = Some(icon).filter(|i| !i.trim().is_empty());
        }

        category
            .validate()
            .map_err(|e| WalletError::Validation(e.to_string()))?;
        category.touch();

        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;
        self.storage.log_update(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &before,
            &category,
        )?;

        self.storage.notify(WalletEvent::CategoriesUpdated);
        Ok(category)
    }

    /// Set the display order; `ids` lists categories first to last
    pub fn reorder(&self, ids: &[CategoryId]) -> WalletResult<()> {
        for (index, id) in ids.iter().enumerate() {
            let mut category = self
                .get(*id)?
                .ok_or_else(|| WalletError::category_not_found(id.to_string()))?;
            category.order_num = index as f64;
            category.touch();
            self.storage.categories.upsert(category)?;
        }
        self.storage.categories.save()?;
        self.storage.notify(WalletEvent::CategoriesUpdated);
        Ok(())
    }

    /// Soft-delete a category
    ///
    /// Transactions, planned payment rules and budgets that referenced it
    /// keep existing without the category.
    pub fn delete(&self, id: CategoryId) -> WalletResult<Category> {
        let mut category = self
            .get(id)?
            .ok_or_else(|| WalletError::category_not_found(id.to_string()))?;

        let transactions = self.storage.transactions.get_by_category(id)?;
        let cleared = transactions.len();
        for mut txn in transactions {
            txn.category_id = None;
            txn.touch();
            self.storage.transactions.upsert(txn)?;
        }
        self.storage.transactions.save()?;

        for mut rule in self.storage.planned_rules.get_all()? {
            if rule.category_id == Some(id) {
                rule.category_id = None;
                rule.touch();
                self.storage.planned_rules.upsert(rule)?;
            }
        }
        self.storage.planned_rules.save()?;

        for mut budget in self.storage.budgets.get_all()? {
            if budget.category_ids.contains(&id) {
                budget.category_ids.retain(|c| *c != id);
                budget.touch();
                self.storage.budgets.upsert(budget)?;
            }
        }
        self.storage.budgets.save()?;

        category.mark_deleted();
        self.storage.categories.upsert(category.clone())?;
        self.storage.categories.save()?;
        self.storage.log_delete(
            EntityType::Category,
            category.id.to_string(),
            Some(category.name.clone()),
            &category,
        )?;

        tracing::debug!(category = %category.name, transactions = cleared, "category deleted");
        self.storage.notify(WalletEvent::CategoriesUpdated);
        self.storage.notify(WalletEvent::TransactionsUpdated);
        Ok(category)
    }

    /// Paid transactions in a category; `None` selects uncategorized ones
    fn paid_in(&self, category_id: Option<CategoryId>, range: DateRange) -> WalletResult<Vec<Transaction>> {
        let candidates = match category_id {
            Some(id) => self.storage.transactions.get_by_category(id)?,
            None => self.storage.transactions.get_all()?,
        };
        Ok(candidates
            .into_iter()
            .filter(|t| !t.is_transfer() && t.smart_category_id() == category_id)
            .filter(|t| t.date_time.map(|d| range.contains(d)).unwrap_or(false))
            .collect())
    }

    fn sum_base(&self, transactions: &[Transaction], kind: TransactionType) -> WalletResult<Money> {
        let exchange = ExchangeService::new(self.storage);
        let mut total = Money::zero();
        for txn in transactions.iter().filter(|t| t.transaction_type == kind) {
            total += exchange.account_amount_base(txn.amount, txn.account_id)?;
        }
        Ok(total)
    }

    /// Income in the category within the range, in the base currency
    pub fn income(&self, category_id: Option<CategoryId>, range: DateRange) -> WalletResult<Money> {
        let txns = self.paid_in(category_id, range)?;
        self.sum_base(&txns, TransactionType::Income)
    }

    /// Expenses in the category within the range, in the base currency
    pub fn expenses(&self, category_id: Option<CategoryId>, range: DateRange) -> WalletResult<Money> {
        let txns = self.paid_in(category_id, range)?;
        self.sum_base(&txns, TransactionType::Expense)
    }

    /// Income minus expenses within the range
    pub fn balance(&self, category_id: Option<CategoryId>, range: DateRange) -> WalletResult<Money> {
        let txns = self.paid_in(category_id, range)?;
        Ok(self.sum_base(&txns, TransactionType::Income)?
            - self.sum_base(&txns, TransactionType::Expense)?)
    }

    /// Every active category with its totals
    pub fn list_with_data(&self, range: DateRange) -> WalletResult<Vec<CategoryData>> {
        self.list()?
            .into_iter()
            .map(|category| {
                let txns = self.paid_in(Some(category.id), range)?;
                let income = self.sum_base(&txns, TransactionType::Income)?;
                let expenses = self.sum_base(&txns, TransactionType::Expense)?;
                Ok(CategoryData {
                    category,
                    income,
                    expenses,
                    balance: income - expenses,
                })
            })
            .collect()
    }
}
