//! Exchange rate CLI commands

use clap::Subcommand;

use crate::cli::parse_amount;
use crate::display::format::format_money;
use crate::error::{WalletError, WalletResult};
use crate::models::currency;
use crate::services::ExchangeService;
use crate::storage::Storage;

/// Exchange rate subcommands
#[derive(Subcommand)]
pub enum RateCommands {
    /// Set the rate as "1 <base> = RATE <currency>"
    Set {
        /// Currency code (e.g., EUR)
        currency: String,
        /// Units of the currency per one unit of the base currency
        rate: f64,
    },
    /// List stored rates
    List,
    /// Remove the rate for a currency
    Remove {
        currency: String,
    },
    /// Convert an amount between two currencies
    Convert {
        amount: String,
        from: String,
        to: String,
    },
}

/// Handle an exchange rate command
pub fn handle_rate_command(storage: &Storage, cmd: RateCommands) -> WalletResult<()> {
    let service = ExchangeService::new(storage);

    match cmd {
        RateCommands::Set { currency, rate } => {
            let stored = service.set_rate(&currency, rate)?;
            println!("Set rate: {}", stored);
        }

        RateCommands::List => {
            let rates = service.list_rates()?;
            if rates.is_empty() {
                println!(
                    "No exchange rates. Set one with 'wallet rate set <CURRENCY> <RATE>'."
                );
            }
            for rate in rates {
                println!("{:<28} updated {}", rate.to_string(), rate.updated_at.format("%Y-%m-%d"));
            }
        }

        RateCommands::Remove { currency } => {
            let removed = service.remove_rate(&currency)?;
            println!("Removed rate: {}", removed);
        }

        RateCommands::Convert { amount, from, to } => {
            let amount = parse_amount(&amount)?;
            let from = currency::normalize(&from)?;
            let to = currency::normalize(&to)?;
            let converted = service.convert_amount(amount, &from, &to).map_err(|e| match e {
                WalletError::MissingExchangeRate { .. } => WalletError::Validation(format!(
                    "No exchange rate between {} and {}. Set one with 'wallet rate set'",
                    from, to
                )),
                other => other,
            })?;
            println!("{} = {}", format_money(amount, &from), format_money(converted, &to));
        }
    }

    Ok(())
}
