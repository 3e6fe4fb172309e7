//! Balance overview and per-item statistics commands

use clap::Subcommand;

use crate::cli::{now, resolve_range};
use crate::display::account::format_balance_overview;
use crate::display::statistics::format_item_statistics;
use crate::display::transaction::{NameLookup, UNSPECIFIED_CATEGORY};
use crate::error::WalletResult;
use crate::services::{AccountService, CategoryService, StatisticsService, StatisticsTarget, WalletService};
use crate::storage::Storage;

/// Statistics subcommands
#[derive(Subcommand)]
pub enum StatsCommands {
    /// Balance, income, expenses and history of one account
    Account {
        /// Account name or ID
        account: String,
        #[arg(short, long)]
        period: Option<String>,
    },
    /// Income, expenses and history of one category
    Category {
        /// Category name or ID; "unspecified" for uncategorized
        category: String,
        #[arg(short, long)]
        period: Option<String>,
    },
}

/// Print the total balance and its projection after planned payments
pub fn handle_balance_command(storage: &Storage, period: Option<&str>) -> WalletResult<()> {
    let range = resolve_range(storage, period)?;
    let overview = WalletService::new(storage).balance_overview(range)?;
    print!(
        "{}",
        format_balance_overview(&overview, &storage.settings.base_currency()?)
    );
    Ok(())
}

/// Handle a statistics command
pub fn handle_stats_command(storage: &Storage, cmd: StatsCommands) -> WalletResult<()> {
    let (target, period) = match cmd {
        StatsCommands::Account { account, period } => {
            let found = AccountService::new(storage).require(&account)?;
            (StatisticsTarget::Account(found.id), period)
        }
        StatsCommands::Category { category, period } => {
            let id = if category.eq_ignore_ascii_case(UNSPECIFIED_CATEGORY) {
                None
            } else {
                Some(CategoryService::new(storage).require(&category)?.id)
            };
            (StatisticsTarget::Category(id), period)
        }
    };

    let range = resolve_range(storage, period.as_deref())?;
    let stats = StatisticsService::new(storage).compute(target, range)?;
    let names = NameLookup::load(storage)?;
    print!("{}", format_item_statistics(&stats, &names, now()));
    Ok(())
}
