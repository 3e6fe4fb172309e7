//! Planned payment CLI commands

use clap::Subcommand;

use crate::cli::{now, parse_amount, parse_date_time, resolve_range};
use crate::display::format::{format_money, format_nicely};
use crate::display::transaction::{format_planned_payments, format_transaction_details, NameLookup};
use crate::error::{WalletError, WalletResult};
use crate::models::{IntervalType, PlannedPaymentRule, Transaction, TransactionType};
use crate::services::{CategoryService, PlannedService, TransactionService};
use crate::storage::Storage;

/// Planned payment subcommands
#[derive(Subcommand)]
pub enum PlannedCommands {
    /// Add a one-time or repeating planned payment
    Add {
        /// income or expense
        #[arg(value_name = "TYPE")]
        transaction_type: String,
        /// Amount (e.g., "850.00")
        amount: String,
        /// Account name or ID; defaults to the last used account
        #[arg(short, long)]
        account: Option<String>,
        /// Category name or ID
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// First due date (YYYY-MM-DD)
        #[arg(short, long)]
        start: String,
        /// Repeat every N units; omit for a one-time payment
        #[arg(short, long)]
        every: Option<u32>,
        /// Interval unit: day, week, month or year
        #[arg(short, long, default_value = "month")]
        unit: String,
    },
    /// List planned payment rules
    Rules,
    /// Change a rule; unpaid occurrences are regenerated
    Edit {
        /// Rule ID (or prefix)
        rule: String,
        #[arg(long)]
        amount: Option<String>,
        #[arg(short, long)]
        account: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        start: Option<String>,
        /// Repeat every N units
        #[arg(short, long)]
        every: Option<u32>,
        #[arg(short, long)]
        unit: Option<String>,
        /// Turn the rule into a one-time payment
        #[arg(long, conflicts_with_all = ["every", "unit"])]
        once: bool,
    },
    /// Delete a rule and its unpaid occurrences
    Delete {
        /// Rule ID (or prefix)
        rule: String,
    },
    /// Show upcoming and overdue payments
    List {
        /// Period (YYYY-MM, "all", or FROM..TO); defaults to this month
        #[arg(short, long)]
        period: Option<String>,
    },
    /// Pay a planned transaction now
    Pay {
        /// Transaction ID (or prefix)
        id: String,
    },
    /// Skip a planned transaction without paying it
    Skip {
        /// Transaction ID (or prefix)
        id: String,
    },
}

fn parse_unit(input: &str) -> WalletResult<IntervalType> {
    IntervalType::parse(input).ok_or_else(|| {
        WalletError::Validation(format!(
            "Invalid interval '{}'. Use day, week, month or year",
            input
        ))
    })
}

fn parse_planned_type(input: &str) -> WalletResult<TransactionType> {
    match TransactionType::parse(input) {
        Some(kind @ (TransactionType::Income | TransactionType::Expense)) => Ok(kind),
        _ => Err(WalletError::Validation(format!(
            "Invalid planned payment type '{}'. Use income or expense",
            input
        ))),
    }
}

fn require_rule(service: &PlannedService, identifier: &str) -> WalletResult<PlannedPaymentRule> {
    service
        .find_rule(identifier)?
        .ok_or_else(|| WalletError::rule_not_found(identifier))
}

fn require_planned(storage: &Storage, identifier: &str) -> WalletResult<Transaction> {
    TransactionService::new(storage)
        .find(identifier)?
        .ok_or_else(|| WalletError::transaction_not_found(identifier))
}

fn format_rule(rule: &PlannedPaymentRule, names: &NameLookup) -> String {
    format!(
        "{}  {:<20} {:>14}  {:<16} {:<14} from {}\n",
        rule.id.short(),
        rule.title.as_deref().unwrap_or("-"),
        format!(
            "{}{}",
            if rule.transaction_type == TransactionType::Income { "+" } else { "-" },
            format_money(rule.amount, names.currency(rule.account_id))
        ),
        rule.schedule(),
        names.account(rule.account_id),
        format_nicely(rule.start_date),
    )
}

/// Handle a planned payment command
pub fn handle_planned_command(storage: &Storage, cmd: PlannedCommands) -> WalletResult<()> {
    let service = PlannedService::new(storage);
    let categories = CategoryService::new(storage);

    match cmd {
        PlannedCommands::Add {
            transaction_type,
            amount,
            account,
            category,
            title,
            description,
            start,
            every,
            unit,
        } => {
            let kind = parse_planned_type(&transaction_type)?;
            let amount = parse_amount(&amount)?;
            let account = TransactionService::new(storage).default_account(account.as_deref())?;
            let start = parse_date_time(&start)?;

            let mut rule = match every {
                Some(n) => PlannedPaymentRule::recurring(kind, account.id, amount, start, n, parse_unit(&unit)?),
                None => PlannedPaymentRule::one_time(kind, account.id, amount, start),
            };
            rule.category_id = category
                .as_deref()
                .map(|c| categories.require(c))
                .transpose()?
                .map(|c| c.id);
            rule.title = title;
            rule.description = description;

            let rule = service.create_rule(rule)?;
            println!("Created planned payment: {}", rule);
            println!("  Rule ID: {}", rule.id);
        }

        PlannedCommands::Rules => {
            let rules = service.list_rules()?;
            if rules.is_empty() {
                println!("No planned payments. Add one with 'wallet planned add'.");
            } else {
                let names = NameLookup::load(storage)?;
                for rule in &rules {
                    print!("{}", format_rule(rule, &names));
                }
            }
        }

        PlannedCommands::Edit {
            rule,
            amount,
            account,
            category,
            title,
            description,
            start,
            every,
            unit,
            once,
        } => {
            let existing = require_rule(&service, &rule)?;
            let mut changes = existing.clone();

            if let Some(amount) = amount.as_deref() {
                changes.amount = parse_amount(amount)?;
            }
            if let Some(account) = account.as_deref() {
                changes.account_id = TransactionService::new(storage).default_account(Some(account))?.id;
            }
            if let Some(category) = category.as_deref() {
                changes.category_id = Some(categories.require(category)?.id);
            }
            if title.is_some() {
                changes.title = title;
            }
            if description.is_some() {
                changes.description = description;
            }
            if let Some(start) = start.as_deref() {
                changes.start_date = parse_date_time(start)?;
            }
            if once {
                changes.one_time = true;
                changes.interval_n = None;
                changes.interval_type = None;
            } else if every.is_some() || unit.is_some() {
                changes.one_time = false;
                changes.interval_n = every.or(existing.interval_n).or(Some(1));
                changes.interval_type = match unit.as_deref() {
                    Some(unit) => Some(parse_unit(unit)?),
                    None => existing.interval_type.or(Some(IntervalType::Month)),
                };
            }

            let updated = service.edit_rule(existing.id, changes)?;
            println!("Updated planned payment: {}", updated);
        }

        PlannedCommands::Delete { rule } => {
            let existing = require_rule(&service, &rule)?;
            let deleted = service.delete_rule(existing.id)?;
            println!("Deleted planned payment: {}", deleted);
        }

        PlannedCommands::List { period } => {
            let range = resolve_range(storage, period.as_deref())?;
            let names = NameLookup::load(storage)?;
            let at = now();
            print!("{}", format_planned_payments("Upcoming", &service.upcoming(range)?, &names, at));
            print!("{}", format_planned_payments("Overdue", &service.overdue(range)?, &names, at));
        }

        PlannedCommands::Pay { id } => {
            let planned = require_planned(storage, &id)?;
            let was_planned = planned.is_planned();
            let txn = service.pay_or_get(planned.id)?;
            if was_planned {
                println!("Paid");
            } else {
                println!("Already paid");
            }
            print!("{}", format_transaction_details(&txn, &NameLookup::load(storage)?, now()));
        }

        PlannedCommands::Skip { id } => {
            let planned = require_planned(storage, &id)?;
            let skipped = service.skip(planned.id)?;
            println!("Skipped planned payment {}", skipped.id.short());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_planned_type() {
        assert_eq!(parse_planned_type("expense").unwrap(), TransactionType::Expense);
        assert!(parse_planned_type("transfer").is_err());
    }

    #[test]
    fn test_parse_unit() {
        assert_eq!(parse_unit("weeks").unwrap(), IntervalType::Week);
        assert!(parse_unit("fortnight").is_err());
    }
}
