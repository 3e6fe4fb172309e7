//! Transaction CLI commands
//!
//! Implements CLI commands for adding, listing and editing income, expenses
//! and transfers.

use clap::Subcommand;

use crate::cli::{now, parse_amount, parse_date_time, resolve_range};
use crate::display::transaction::{
    format_transaction_details, format_transaction_list, NameLookup,
};
use crate::error::{WalletError, WalletResult};
use crate::models::{Transaction, TransactionType};
use crate::services::transaction::{TransactionDraft, TransactionFilter};
use crate::services::{AccountService, CategoryService, TransactionService};
use crate::storage::Storage;

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Add an income, expense or transfer
    Add {
        /// income, expense or transfer
        #[arg(value_name = "TYPE")]
        transaction_type: String,
        /// Amount (e.g., "42.50")
        amount: String,
        /// Source account name or ID; defaults to the last used account
        #[arg(short, long)]
        account: Option<String>,
        /// Destination account for transfers
        #[arg(long)]
        to: Option<String>,
        /// Amount received by the destination account (transfers)
        #[arg(long)]
        to_amount: Option<String>,
        /// Category name or ID
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// Payment date (YYYY-MM-DD, "YYYY-MM-DD HH:MM", today, yesterday)
        #[arg(long)]
        date: Option<String>,
        /// Due date; makes this an unpaid planned payment
        #[arg(long, conflicts_with = "date")]
        due: Option<String>,
    },
    /// List transactions, newest first
    List {
        /// Account name or ID
        #[arg(short, long)]
        account: Option<String>,
        /// Category name or ID
        #[arg(short, long)]
        category: Option<String>,
        /// income, expense or transfer
        #[arg(short = 't', long = "type")]
        transaction_type: Option<String>,
        /// Period (YYYY-MM, "all", or FROM..TO); defaults to this month
        #[arg(short, long)]
        period: Option<String>,
        /// Include unpaid planned payments
        #[arg(long)]
        planned: bool,
        /// Search title and description
        #[arg(short, long)]
        search: Option<String>,
        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show transaction details
    Show {
        /// Transaction ID (or prefix)
        id: String,
    },
    /// Edit a transaction
    Edit {
        /// Transaction ID (or prefix)
        id: String,
        #[arg(long = "type")]
        transaction_type: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(short, long)]
        account: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        to_amount: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// Clear the category
        #[arg(long, conflicts_with = "category")]
        no_category: bool,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete a transaction
    Delete {
        /// Transaction ID (or prefix)
        id: String,
    },
}

fn parse_type(input: &str) -> WalletResult<TransactionType> {
    TransactionType::parse(input).ok_or_else(|| {
        WalletError::Validation(format!(
            "Invalid transaction type '{}'. Use income, expense or transfer",
            input
        ))
    })
}

fn require_transaction(service: &TransactionService, id: &str) -> WalletResult<Transaction> {
    service
        .find(id)?
        .ok_or_else(|| WalletError::transaction_not_found(id))
}

/// Handle a transaction command
pub fn handle_transaction_command(storage: &Storage, cmd: TransactionCommands) -> WalletResult<()> {
    let service = TransactionService::new(storage);
    let accounts = AccountService::new(storage);
    let categories = CategoryService::new(storage);

    match cmd {
        TransactionCommands::Add {
            transaction_type,
            amount,
            account,
            to,
            to_amount,
            category,
            title,
            description,
            date,
            due,
        } => {
            let mut draft = TransactionDraft::new(parse_type(&transaction_type)?, parse_amount(&amount)?);
            draft.account_id = Some(service.default_account(account.as_deref())?.id);
            draft.to_account_id = to.as_deref().map(|t| accounts.require(t)).transpose()?.map(|a| a.id);
            draft.to_amount = to_amount.as_deref().map(parse_amount).transpose()?;
            draft.category_id = category
                .as_deref()
                .map(|c| categories.require(c))
                .transpose()?
                .map(|c| c.id);
            draft.title = title;
            draft.description = description;
            draft.date_time = date.as_deref().map(parse_date_time).transpose()?;
            draft.due_date = due.as_deref().map(parse_date_time).transpose()?;

            let txn = service.save(draft)?;
            let names = NameLookup::load(storage)?;
            if txn.is_planned() {
                println!("Planned {}", txn.transaction_type.as_str().to_lowercase());
            } else {
                println!("Added {}", txn.transaction_type.as_str().to_lowercase());
            }
            print!("{}", format_transaction_details(&txn, &names, now()));
        }

        TransactionCommands::List {
            account,
            category,
            transaction_type,
            period,
            planned,
            search,
            limit,
        } => {
            let filter = TransactionFilter {
                account_id: account.as_deref().map(|a| accounts.require(a)).transpose()?.map(|a| a.id),
                category_id: category
                    .as_deref()
                    .map(|c| categories.require(c))
                    .transpose()?
                    .map(|c| c.id),
                transaction_type: transaction_type.as_deref().map(parse_type).transpose()?,
                range: resolve_range(storage, period.as_deref())?,
                include_planned: planned,
                search,
                limit,
            };
            let transactions = service.list(&filter)?;
            let names = NameLookup::load(storage)?;
            print!("{}", format_transaction_list(&transactions, &names, now()));
        }

        TransactionCommands::Show { id } => {
            let txn = require_transaction(&service, &id)?;
            let names = NameLookup::load(storage)?;
            print!("{}", format_transaction_details(&txn, &names, now()));
        }

        TransactionCommands::Edit {
            id,
            transaction_type,
            amount,
            account,
            to,
            to_amount,
            category,
            no_category,
            title,
            description,
            date,
        } => {
            let txn = require_transaction(&service, &id)?;
            let mut draft = TransactionDraft::from(&txn);

            if let Some(kind) = transaction_type.as_deref() {
                draft.transaction_type = parse_type(kind)?;
            }
            if let Some(amount) = amount.as_deref() {
                draft.amount = parse_amount(amount)?;
                // Recompute the received amount unless one is given
                draft.to_amount = None;
            }
            if let Some(account) = account.as_deref() {
                draft.account_id = Some(accounts.require(account)?.id);
                draft.to_amount = None;
            }
            if let Some(to) = to.as_deref() {
                draft.to_account_id = Some(accounts.require(to)?.id);
                draft.to_amount = None;
            }
            if let Some(to_amount) = to_amount.as_deref() {
                draft.to_amount = Some(parse_amount(to_amount)?);
            }
            if no_category {
                draft.category_id = None;
            } else if let Some(category) = category.as_deref() {
                draft.category_id = Some(categories.require(category)?.id);
            }
            if title.is_some() {
                draft.title = title;
            }
            if description.is_some() {
                draft.description = description;
            }
            if let Some(date) = date.as_deref() {
                draft.date_time = Some(parse_date_time(date)?);
            }

            let updated = service.save(draft)?;
            let names = NameLookup::load(storage)?;
            println!("Updated transaction");
            print!("{}", format_transaction_details(&updated, &names, now()));
        }

        TransactionCommands::Delete { id } => {
            let txn = require_transaction(&service, &id)?;
            let deleted = service.delete(txn.id)?;
            println!("Deleted transaction {} ({})", deleted.id.short(), deleted.amount);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type() {
        assert_eq!(parse_type("expense").unwrap(), TransactionType::Expense);
        assert_eq!(parse_type("IN").unwrap(), TransactionType::Income);
        assert!(parse_type("refund").unwrap_err().is_validation());
    }
}
