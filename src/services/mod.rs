//! Service layer for wallet-cli
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, currency conversion, the paywall and sync.

pub mod account;
pub mod budget;
pub mod category;
pub mod exchange;
pub mod import;
pub mod paywall;
pub mod planned;
pub mod statistics;
pub mod sync;
pub mod transaction;
pub mod wallet;

pub use account::AccountService;
pub use budget::BudgetService;
pub use category::CategoryService;
pub use exchange::ExchangeService;
pub use import::{ImportService, ImportType};
pub use paywall::{PaywallReason, PaywallService};
pub use planned::PlannedService;
pub use statistics::{StatisticsService, StatisticsTarget};
pub use sync::SyncService;
pub use transaction::TransactionService;
pub use wallet::WalletService;
