//! Settings and premium CLI commands

use clap::Subcommand;

use crate::audit::EntityType;
use crate::config::Settings;
use crate::error::WalletResult;
use crate::events::WalletEvent;
use crate::services::PaywallService;
use crate::storage::Storage;

/// Settings subcommands
#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show current settings
    Show,
    /// Set the base currency used for totals and budgets
    Currency {
        /// Currency code (e.g., USD)
        code: String,
    },
    /// Set the day of month budgeting periods start on (1-31)
    StartDay {
        day: u32,
    },
}

/// Premium subcommands
#[derive(Subcommand)]
pub enum PremiumCommands {
    /// Show premium status and free-tier usage
    Status,
    /// Unlock unlimited accounts, categories and budgets
    Activate,
    /// Return to the free tier
    Deactivate,
}

fn update_settings<F>(storage: &Storage, f: F) -> WalletResult<Settings>
where
    F: FnOnce(&mut Settings) -> WalletResult<()>,
{
    let before = storage.settings.get()?;
    let after = storage.settings.update(f)?;
    storage.log_update(EntityType::Settings, "settings", None, &before, &after)?;
    storage.notify(WalletEvent::SettingsUpdated);
    Ok(after)
}

/// Handle a settings command
pub fn handle_settings_command(storage: &Storage, cmd: SettingsCommands) -> WalletResult<()> {
    match cmd {
        SettingsCommands::Show => {
            let settings = storage.settings.get()?;
            println!("Base currency:     {}", settings.base_currency);
            println!("Month starts on:   day {}", settings.start_date_of_month);
            println!("Date format:       {}", settings.date_format);
            println!("Premium:           {}", if settings.premium { "yes" } else { "no" });
            match &settings.user {
                Some(user) => println!("Signed in as:      {}", user),
                None => println!("Signed in as:      -"),
            }
            println!("Data directory:    {}", storage.paths().base_dir().display());
        }

        SettingsCommands::Currency { code } => {
            let settings = update_settings(storage, |s| s.set_base_currency(&code))?;
            tracing::info!(currency = %settings.base_currency, "base currency changed");
            println!("Base currency set to {}", settings.base_currency);
        }

        SettingsCommands::StartDay { day } => {
            let settings = update_settings(storage, |s| s.set_start_date_of_month(day))?;
            println!("Months now start on day {}", settings.start_date_of_month);
        }
    }

    Ok(())
}

/// Handle a premium command
pub fn handle_premium_command(storage: &Storage, cmd: PremiumCommands) -> WalletResult<()> {
    let service = PaywallService::new(storage);

    match cmd {
        PremiumCommands::Status => {
            let status = service.status()?;
            if status.premium {
                println!("Premium: active");
            } else {
                println!("Premium: not active");
            }
            if !status.enabled {
                println!("Free-tier limits are disabled");
            }
            for quota in &status.quotas {
                println!("  {:<12} {} / {}", quota.reason, quota.used, quota.limit);
            }
        }
        PremiumCommands::Activate => {
            service.activate_premium()?;
            println!("Premium activated");
        }
        PremiumCommands::Deactivate => {
            service.deactivate_premium()?;
            println!("Premium deactivated");
        }
    }

    Ok(())
}
