//! Account CLI commands
//!
//! Implements CLI commands for account management.

use clap::Subcommand;

use crate::cli::{parse_amount, parse_color, resolve_range};
use crate::display::account::{format_account_details, format_account_list};
use crate::display::format::format_money;
use crate::error::{WalletError, WalletResult};
use crate::services::account::{AccountEdit, CreateAccountData};
use crate::services::{AccountService, WalletService};
use crate::storage::Storage;

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account name
        name: String,
        /// Currency code; defaults to the base currency
        #[arg(short, long)]
        currency: Option<String>,
        /// Display color (#RRGGBB)
        #[arg(long)]
        color: Option<String>,
        /// Icon name
        #[arg(long)]
        icon: Option<String>,
        /// Opening balance (e.g., "1000.00")
        #[arg(short, long)]
        balance: Option<String>,
        /// Leave the account out of the total balance
        #[arg(long)]
        exclude: bool,
    },
    /// List accounts with balances
    List {
        /// Period for income and expenses (YYYY-MM, "all", or FROM..TO)
        #[arg(short, long)]
        period: Option<String>,
    },
    /// Show account details
    Show {
        /// Account name or ID
        account: String,
        #[arg(short, long)]
        period: Option<String>,
    },
    /// Edit an account
    Edit {
        /// Account name or ID
        account: String,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New currency code
        #[arg(short, long)]
        currency: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
        /// Whether the account counts toward the total balance
        #[arg(long)]
        include_in_balance: Option<bool>,
        /// Correct the balance to this amount with an adjustment transaction
        #[arg(short, long, allow_hyphen_values = true)]
        balance: Option<String>,
    },
    /// Set the display order (first to last)
    Reorder {
        /// Account names or IDs
        #[arg(required = true)]
        accounts: Vec<String>,
    },
    /// Delete an account and its transactions
    Delete {
        /// Account name or ID
        account: String,
    },
}

/// Handle an account command
pub fn handle_account_command(storage: &Storage, cmd: AccountCommands) -> WalletResult<()> {
    let service = AccountService::new(storage);
    let base_currency = storage.settings.base_currency()?;

    match cmd {
        AccountCommands::Create {
            name,
            currency,
            color,
            icon,
            balance,
            exclude,
        } => {
            let data = CreateAccountData {
                name,
                currency,
                color: color.as_deref().map(parse_color).transpose()?,
                icon,
                initial_balance: balance.as_deref().map(parse_amount).transpose()?,
                include_in_balance: !exclude,
            };
            let account = service.create(data)?;
            let currency = account.currency_or(&base_currency).to_string();

            println!("Created account: {}", account.name);
            println!("  Currency: {}", currency);
            println!(
                "  Balance:  {}",
                format_money(service.balance(account.id)?, &currency)
            );
            println!("  ID:       {}", account.id);
        }

        AccountCommands::List { period } => {
            let range = resolve_range(storage, period.as_deref())?;
            let accounts = service.list_with_data(range)?;
            let total = match WalletService::new(storage).calculate_balance(true) {
                Ok(total) => Some(total),
                Err(WalletError::MissingExchangeRate { from, to }) => {
                    eprintln!("Total unavailable: no exchange rate {} -> {}", from, to);
                    None
                }
                Err(e) => return Err(e),
            };
            print!("{}", format_account_list(&accounts, &base_currency, total));
        }

        AccountCommands::Show { account, period } => {
            let found = service.require(&account)?;
            let range = resolve_range(storage, period.as_deref())?;
            let data = service
                .list_with_data(range)?
                .into_iter()
                .find(|d| d.account.id == found.id)
                .ok_or_else(|| WalletError::account_not_found(&account))?;
            print!("{}", format_account_details(&data, &base_currency));
        }

        AccountCommands::Edit {
            account,
            name,
            currency,
            color,
            icon,
            include_in_balance,
            balance,
        } => {
            let found = service.require(&account)?;
            let edit = AccountEdit {
                name,
                currency,
                color: color.as_deref().map(parse_color).transpose()?,
                icon,
                include_in_balance,
            };
            let new_balance = balance.as_deref().map(parse_amount).transpose()?;

            let updated = service.edit(found.id, edit, new_balance)?;
            println!("Updated account: {}", updated.name);
            if new_balance.is_some() {
                println!(
                    "  Balance: {}",
                    format_money(service.balance(updated.id)?, updated.currency_or(&base_currency))
                );
            }
        }

        AccountCommands::Reorder { accounts } => {
            let ids = accounts
                .iter()
                .map(|a| service.require(a).map(|found| found.id))
                .collect::<WalletResult<Vec<_>>>()?;
            service.reorder(&ids)?;
            println!("Reordered {} accounts", ids.len());
        }

        AccountCommands::Delete { account } => {
            let found = service.require(&account)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted account: {}", deleted.name);
        }
    }

    Ok(())
}
