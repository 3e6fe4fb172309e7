//! Sign-in and sync CLI commands

use std::path::PathBuf;

use clap::Subcommand;

use crate::error::WalletResult;
use crate::services::sync::OpResult;
use crate::services::SyncService;
use crate::storage::Storage;

/// Sync subcommands
#[derive(Subcommand)]
pub enum SyncCommands {
    /// Sign in; all local data is queued for upload
    Login {
        email: String,
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Sign out; local data is kept
    Logout,
    /// Configure the sync remote
    Config {
        /// Directory that acts as the remote store
        #[arg(short, long)]
        remote: Option<PathBuf>,
        /// Sync automatically after each saved transaction
        #[arg(long)]
        auto: Option<bool>,
    },
    /// Sync now
    Run,
    /// Show sign-in state, pending changes and the last sync
    Status,
}

/// Handle a sync command
pub fn handle_sync_command(storage: &Storage, cmd: SyncCommands) -> WalletResult<()> {
    let service = SyncService::new(storage)?;

    match cmd {
        SyncCommands::Login { email, name } => {
            let user = service.login(&email, name.as_deref())?;
            println!("Signed in as {}", user);
            println!("{} items waiting to sync", service.pending_count()?);
        }

        SyncCommands::Logout => {
            service.logout()?;
            println!("Signed out");
        }

        SyncCommands::Config { remote, auto } => {
            service.configure(remote.as_deref(), auto)?;
            let settings = storage.settings.get()?;
            match &settings.sync.remote_dir {
                Some(dir) => println!("Remote:    {}", dir.display()),
                None => println!("Remote:    not configured"),
            }
            println!("Auto-sync: {}", if settings.sync.auto_sync { "on" } else { "off" });
        }

        SyncCommands::Run => match service.sync()? {
            OpResult::Success(report) => println!("Sync complete: {}", report),
            OpResult::Failure(message) => {
                eprintln!("Sync incomplete: {}", message);
                eprintln!("Run 'wallet sync run' again to retry");
            }
        },

        SyncCommands::Status => {
            let settings = storage.settings.get()?;
            match &settings.user {
                Some(user) => println!("Signed in as: {}", user),
                None => println!("Not signed in"),
            }
            println!("Pending:      {}", service.pending_count()?);
            match &settings.sync.last_sync {
                Some(last) => println!(
                    "Last sync:    {} ({}: {})",
                    last.at.format("%Y-%m-%d %H:%M UTC"),
                    if last.success { "ok" } else { "failed" },
                    last.message
                ),
                None => println!("Last sync:    never"),
            }
        }
    }

    Ok(())
}
