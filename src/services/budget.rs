//! Budget service
//!
//! Provides business logic for spending budgets and their progress over a
//! period. Budgets are expressed in the base currency.

use crate::audit::EntityType;
use crate::error::{WalletError, WalletResult};
use crate::events::WalletEvent;
use crate::models::{AccountId, Budget, BudgetId, CategoryId, DateRange, Money};
use crate::services::exchange::ExchangeService;
use crate::services::paywall::{PaywallReason, PaywallService};
use crate::storage::{Repository, Storage};

/// Service for budget management
pub struct BudgetService<'a> {
    storage: &'a Storage,
}

/// Field changes for an existing budget; `None` leaves a field alone
#[derive(Debug, Clone, Default)]
pub struct BudgetEdit {
    pub name: Option<String>,
    pub amount: Option<Money>,
    pub category_ids: Option<Vec<CategoryId>>,
    pub account_ids: Option<Vec<AccountId>>,
}

/// Spending against a budget for a period
#[derive(Debug, Clone)]
pub struct BudgetProgress {
    pub budget: Budget,
    /// Expenses in scope, in the base currency
    pub spent: Money,
    /// Negative once the budget is overspent
    pub remaining: Money,
    /// spent / amount
    pub ratio: f64,
}

impl BudgetProgress {
    pub fn is_overspent(&self) -> bool {
        self.remaining.is_negative()
    }
}

impl<'a> BudgetService<'a> {
    /// Create a new budget service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn check_scope(&self, category_ids: &[CategoryId], account_ids: &[AccountId]) -> WalletResult<()> {
        for id in category_ids {
            if self.storage.categories.get(*id)?.filter(|c| !c.is_deleted).is_none() {
                return Err(WalletError::category_not_found(id.to_string()));
            }
        }
        for id in account_ids {
            if !self.storage.accounts.exists(*id)? {
                return Err(WalletError::account_not_found(id.to_string()));
            }
        }
        Ok(())
    }

    /// Create a budget over the given categories and accounts (empty = all)
    pub fn create(
        &self,
        name: &str,
        amount: Money,
        category_ids: Vec<CategoryId>,
        account_ids: Vec<AccountId>,
    ) -> WalletResult<Budget> {
        PaywallService::new(self.storage).protect_add(PaywallReason::Budgets)?;
        self.check_scope(&category_ids, &account_ids)?;

        let mut budget = Budget::new(name.trim(), amount);
        budget.category_ids = category_ids;
        budget.account_ids = account_ids;
        budget.order_num = self.storage.budgets.max_order_num()? + 1.0;
        budget
            .validate()
            .map_err(|e| WalletError::Validation(e.to_string()))?;

        self.storage.budgets.upsert(budget.clone())?;
        self.storage.budgets.save()?;
        self.storage.log_create(
            EntityType::Budget,
            budget.id.to_string(),
            Some(budget.name.clone()),
            &budget,
        )?;

        tracing::debug!(budget = %budget.name, amount = %budget.amount, "budget created");
        self.storage.notify(WalletEvent::BudgetsUpdated);
        Ok(budget)
    }

    pub fn get(&self, id: BudgetId) -> WalletResult<Option<Budget>> {
        Ok(self.storage.budgets.get(id)?.filter(|b| !b.is_deleted))
    }

    pub fn find(&self, identifier: &str) -> WalletResult<Option<Budget>> {
        self.storage.budgets.find(identifier)
    }

    pub fn list(&self) -> WalletResult<Vec<Budget>> {
        self.storage.budgets.get_all()
    }

    pub fn edit(&self, id: BudgetId, edit: BudgetEdit) -> WalletResult<Budget> {
        let before = self
            .get(id)?
            .ok_or_else(|| WalletError::budget_not_found(id.to_string()))?;
        let mut budget = before.clone();

        if let Some(name) = edit.name {
            budget.name = name.trim().to_string();
        }
        if let Some(amount) = edit.amount {
            budget.amount = amount;
        }
        if let Some(category_ids) = edit.category_ids {
            budget.category_ids = category_ids;
        }
        if let Some(account_ids) = edit.account_ids {
            budget.account_ids = account_ids;
        }
        self.check_scope(&budget.category_ids, &budget.account_ids)?;
        budget
            .validate()
            .map_err(|e| WalletError::Validation(e.to_string()))?;
        budget.touch();

        self.storage.budgets.upsert(budget.clone())?;
        self.storage.budgets.save()?;
        self.storage.log_update(
            EntityType::Budget,
            budget.id.to_string(),
            Some(budget.name.clone()),
            &before,
            &budget,
        )?;

        self.storage.notify(WalletEvent::BudgetsUpdated);
        Ok(budget)
    }

    pub fn delete(&self, id: BudgetId) -> WalletResult<Budget> {
        let mut budget = self
            .get(id)?
            .ok_or_else(|| WalletError::budget_not_found(id.to_string()))?;

        budget.mark_deleted();
        self.storage.budgets.upsert(budget.clone())?;
        self.storage.budgets.save()?;
        self.storage.log_delete(
            EntityType::Budget,
            budget.id.to_string(),
            Some(budget.name.clone()),
            &budget,
        )?;

        self.storage.notify(WalletEvent::BudgetsUpdated);
        Ok(budget)
    }

    /// Set the display order; `ids` lists budgets first to last
    pub fn reorder(&self, ids: &[BudgetId]) -> WalletResult<()> {
        for (index, id) in ids.iter().enumerate() {
            let mut budget = self
                .get(*id)?
                .ok_or_else(|| WalletError::budget_not_found(id.to_string()))?;
            budget.order_num = index as f64;
            budget.touch();
            self.storage.budgets.upsert(budget)?;
        }
        self.storage.budgets.save()?;
        self.storage.notify(WalletEvent::BudgetsUpdated);
        Ok(())
    }

    /// Spending in the base currency counted against one budget
    pub fn spent(&self, budget: &Budget, range: DateRange) -> WalletResult<Money> {
        let exchange = ExchangeService::new(self.storage);
        let mut spent = Money::zero();
        for txn in self.storage.transactions.get_all()? {
            let in_range = txn.date_time.map(|d| range.contains(d)).unwrap_or(false);
            if txn.is_expense()
                && in_range
                && budget.covers_category(txn.smart_category_id())
                && budget.covers_account(txn.account_id)
            {
                spent += exchange.account_amount_base(txn.amount, txn.account_id)?;
            }
        }
        Ok(spent)
    }

    /// Progress of every budget over the range
    pub fn progress(&self, range: DateRange) -> WalletResult<Vec<BudgetProgress>> {
        self.list()?
            .into_iter()
            .map(|budget| {
                let spent = self.spent(&budget, range)?;
                let ratio = if budget.amount.is_zero() {
                    0.0
                } else {
                    spent.to_f64() / budget.amount.to_f64()
                };
                Ok(BudgetProgress {
                    remaining: budget.amount - spent,
                    budget,
                    spent,
                    ratio,
                })
            })
            .collect()
    }
}
