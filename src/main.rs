use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use wallet_cli::cli::{
    handle_account_command, handle_balance_command, handle_budget_command,
    handle_category_command, handle_export_command, handle_import_command,
    handle_planned_command, handle_premium_command, handle_rate_command,
    handle_settings_command, handle_stats_command, handle_sync_command,
    handle_transaction_command, print_import_formats, AccountCommands, BudgetCommands,
    CategoryCommands, ExportFormat, PlannedCommands, PremiumCommands, RateCommands,
    SettingsCommands, StatsCommands, SyncCommands, TransactionCommands,
};
use wallet_cli::config::WalletPaths;
use wallet_cli::storage::{initialize_storage, Storage};

#[derive(Parser)]
#[command(
    name = "wallet",
    version,
    about = "Local-first multi-currency personal finance ledger",
    long_about = "wallet keeps accounts, categories, transactions, planned payments \
                  and budgets in local JSON files, converts between currencies with \
                  your own exchange rates and syncs to a remote directory when you \
                  sign in."
)]
struct Cli {
    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value_t = LevelFilter::WARN)]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the wallet with default categories and a Cash account
    Init {
        /// Base currency for the new wallet
        #[arg(short, long)]
        currency: Option<String>,
    },

    /// Show data paths and the main settings
    Config,

    /// Show recent changes from the audit log
    History {
        /// Number of entries to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Income, expenses and transfers
    #[command(subcommand, alias = "txn")]
    Transaction(TransactionCommands),

    /// Planned payments and their rules
    #[command(subcommand)]
    Planned(PlannedCommands),

    /// Budget management commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Total balance and the balance after planned payments
    Balance {
        /// Period for planned payments (YYYY-MM, "all", or FROM..TO)
        #[arg(short, long)]
        period: Option<String>,
    },

    /// Statistics for one account or category
    #[command(subcommand)]
    Stats(StatsCommands),

    /// Exchange rates
    #[command(subcommand)]
    Rate(RateCommands),

    /// Import transactions from a CSV export of another app
    Import {
        /// CSV file to import
        #[arg(required_unless_present = "formats")]
        file: Option<String>,
        /// Source app (ivy, money-manager, budgetbakers, spendee, 1money)
        #[arg(short, long, default_value = "ivy")]
        format: String,
        /// List supported formats
        #[arg(long)]
        formats: bool,
    },

    /// Export transactions (CSV) or the whole wallet (JSON, YAML)
    Export {
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Settings commands
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Premium status and free-tier limits
    #[command(subcommand)]
    Premium(PremiumCommands),

    /// Sign-in and cloud sync
    #[command(subcommand)]
    Sync(SyncCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    let paths = WalletPaths::new()?;
    let storage = Storage::open(paths.clone())?;

    if let Some(Commands::Init { currency }) = &cli.command {
        if storage.is_initialized() {
            println!("Wallet already initialized at: {}", paths.base_dir().display());
            return Ok(());
        }
        if let Some(code) = currency {
            storage.settings.update(|s| s.set_base_currency(code))?;
        }
        initialize_storage(&storage)?;
        println!("Initialized wallet at: {}", paths.base_dir().display());
        println!("  Base currency: {}", storage.settings.base_currency()?);
        println!("  Created the Cash account and the default categories");
        println!();
        println!("Run 'wallet category list' to see all categories.");
        return Ok(());
    }

    // First run: seed the same defaults as `wallet init`
    if cli.command.is_some() && !storage.is_initialized() {
        initialize_storage(&storage)?;
    }

    match cli.command {
        Some(Commands::Init { .. }) => {}
        Some(Commands::Config) => {
            let settings = storage.settings.get()?;
            println!("wallet-cli configuration");
            println!("========================");
            println!("Data directory:  {}", paths.data_dir().display());
            println!("Settings file:   {}", paths.settings_file().display());
            println!("Audit log:       {}", paths.audit_log().display());
            println!();
            println!("Base currency:   {}", settings.base_currency);
            println!("Month starts on: day {}", settings.start_date_of_month);
        }
        Some(Commands::History { limit }) => {
            let entries = storage.audit().read_recent(limit)?;
            if entries.is_empty() {
                println!("No changes recorded yet.");
            }
            for entry in entries.iter().rev() {
                println!("{}", entry.format_human_readable());
            }
        }
        Some(Commands::Account(cmd)) => handle_account_command(&storage, cmd)?,
        Some(Commands::Category(cmd)) => handle_category_command(&storage, cmd)?,
        Some(Commands::Transaction(cmd)) => handle_transaction_command(&storage, cmd)?,
        Some(Commands::Planned(cmd)) => handle_planned_command(&storage, cmd)?,
        Some(Commands::Budget(cmd)) => handle_budget_command(&storage, cmd)?,
        Some(Commands::Balance { period }) => handle_balance_command(&storage, period.as_deref())?,
        Some(Commands::Stats(cmd)) => handle_stats_command(&storage, cmd)?,
        Some(Commands::Rate(cmd)) => handle_rate_command(&storage, cmd)?,
        Some(Commands::Import {
            file,
            format,
            formats,
        }) => match file {
            Some(file) if !formats => handle_import_command(&storage, &file, &format)?,
            _ => print_import_formats(),
        },
        Some(Commands::Export {
            format,
            output,
            pretty,
        }) => handle_export_command(&storage, format, output.as_deref(), pretty)?,
        Some(Commands::Settings(cmd)) => handle_settings_command(&storage, cmd)?,
        Some(Commands::Premium(cmd)) => handle_premium_command(&storage, cmd)?,
        Some(Commands::Sync(cmd)) => handle_sync_command(&storage, cmd)?,
        None => {
            println!("wallet - local-first personal finance ledger");
            println!();
            println!("Run 'wallet --help' for usage information.");
            println!("Run 'wallet init' to create a new wallet.");
        }
    }

    Ok(())
}

/// Initializes the tracing subscriber; RUST_LOG wins over `--log-level`
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!(
            "{}={},{}={}",
            env!("CARGO_CRATE_NAME"),
            level,
            "wallet_cli",
            level
        )),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
