//! Budget CLI commands
//!
//! Implements CLI commands for spending budgets and their progress.

use clap::Subcommand;

use crate::cli::{parse_amount, resolve_range};
use crate::display::budget::format_budget_progress;
use crate::error::{WalletError, WalletResult};
use crate::models::{AccountId, Budget, CategoryId};
use crate::services::budget::BudgetEdit;
use crate::services::{AccountService, BudgetService, CategoryService};
use crate::storage::Storage;

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Create a budget
    Create {
        /// Budget name
        name: String,
        /// Amount per period in the base currency
        amount: String,
        /// Limit to a category (repeatable); all categories when omitted
        #[arg(short, long = "category")]
        categories: Vec<String>,
        /// Limit to an account (repeatable); all accounts when omitted
        #[arg(short, long = "account")]
        accounts: Vec<String>,
    },
    /// Show spending against each budget
    List {
        /// Period (YYYY-MM, "all", or FROM..TO); defaults to this month
        #[arg(short, long)]
        period: Option<String>,
    },
    /// Edit a budget
    Edit {
        /// Budget name or ID
        budget: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        /// Replace the category scope (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<String>,
        /// Replace the account scope (repeatable)
        #[arg(short, long = "account")]
        accounts: Vec<String>,
        /// Count every category and account again
        #[arg(long, conflicts_with_all = ["categories", "accounts"])]
        all: bool,
    },
    /// Set the display order (first to last)
    Reorder {
        #[arg(required = true)]
        budgets: Vec<String>,
    },
    /// Delete a budget
    Delete {
        /// Budget name or ID
        budget: String,
    },
}

fn require_budget(service: &BudgetService, identifier: &str) -> WalletResult<Budget> {
    service
        .find(identifier)?
        .ok_or_else(|| WalletError::budget_not_found(identifier))
}

fn resolve_categories(storage: &Storage, names: &[String]) -> WalletResult<Vec<CategoryId>> {
    let service = CategoryService::new(storage);
    names.iter().map(|n| service.require(n).map(|c| c.id)).collect()
}

fn resolve_accounts(storage: &Storage, names: &[String]) -> WalletResult<Vec<AccountId>> {
    let service = AccountService::new(storage);
    names.iter().map(|n| service.require(n).map(|a| a.id)).collect()
}

/// Handle a budget command
pub fn handle_budget_command(storage: &Storage, cmd: BudgetCommands) -> WalletResult<()> {
    let service = BudgetService::new(storage);

    match cmd {
        BudgetCommands::Create {
            name,
            amount,
            categories,
            accounts,
        } => {
            let budget = service.create(
                &name,
                parse_amount(&amount)?,
                resolve_categories(storage, &categories)?,
                resolve_accounts(storage, &accounts)?,
            )?;
            println!("Created budget: {}", budget.name);
            println!("  Amount: {} {}", budget.amount.format_grouped(), storage.settings.base_currency()?);
            println!("  ID:     {}", budget.id);
        }

        BudgetCommands::List { period } => {
            let range = resolve_range(storage, period.as_deref())?;
            let progress = service.progress(range)?;
            print!(
                "{}",
                format_budget_progress(&progress, &storage.settings.base_currency()?)
            );
        }

        BudgetCommands::Edit {
            budget,
            name,
            amount,
            categories,
            accounts,
            all,
        } => {
            let existing = require_budget(&service, &budget)?;
            let mut edit = BudgetEdit {
                name,
                amount: amount.as_deref().map(parse_amount).transpose()?,
                ..BudgetEdit::default()
            };
            if all {
                edit.category_ids = Some(Vec::new());
                edit.account_ids = Some(Vec::new());
            }
            if !categories.is_empty() {
                edit.category_ids = Some(resolve_categories(storage, &categories)?);
            }
            if !accounts.is_empty() {
                edit.account_ids = Some(resolve_accounts(storage, &accounts)?);
            }

            let updated = service.edit(existing.id, edit)?;
            println!("Updated budget: {}", updated.name);
        }

        BudgetCommands::Reorder { budgets } => {
            let ids = budgets
                .iter()
                .map(|b| require_budget(&service, b).map(|found| found.id))
                .collect::<WalletResult<Vec<_>>>()?;
            service.reorder(&ids)?;
            println!("Reordered {} budgets", ids.len());
        }

        BudgetCommands::Delete { budget } => {
            let existing = require_budget(&service, &budget)?;
            let deleted = service.delete(existing.id)?;
            println!("Deleted budget: {}", deleted.name);
        }
    }

    Ok(())
}
