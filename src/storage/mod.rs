//! Storage layer for wallet-cli
//!
//! Provides JSON file storage with atomic writes, one repository per
//! entity, the shared settings store, the audit log and the event bus.

pub mod accounts;
pub mod budgets;
pub mod categories;
pub mod exchange_rates;
pub mod file_io;
pub mod init;
pub mod planned_rules;
pub mod repository;
pub mod settings;
pub mod table;
pub mod transactions;

pub use accounts::AccountRepository;
pub use budgets::BudgetRepository;
pub use categories::CategoryRepository;
pub use exchange_rates::ExchangeRateRepository;
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use planned_rules::PlannedRuleRepository;
pub use repository::Repository;
pub use settings::SettingsStore;
pub use table::{Record, Table};
pub use transactions::TransactionRepository;

use serde::Serialize;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::WalletPaths;
use crate::error::WalletResult;
use crate::events::{EventBus, WalletEvent};

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: WalletPaths,
    pub settings: SettingsStore,
    pub accounts: AccountRepository,
    pub categories: CategoryRepository,
    pub transactions: TransactionRepository,
    pub budgets: BudgetRepository,
    pub planned_rules: PlannedRuleRepository,
    pub exchange_rates: ExchangeRateRepository,
    pub events: EventBus,
    audit: AuditLogger,
}

impl Storage {
    /// Create a new Storage instance (nothing is loaded yet)
    pub fn new(paths: WalletPaths) -> WalletResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            settings: SettingsStore::load(paths.clone())?,
            accounts: AccountRepository::new(paths.accounts_file()),
            categories: CategoryRepository::new(paths.categories_file()),
            transactions: TransactionRepository::new(paths.transactions_file()),
            budgets: BudgetRepository::new(paths.budgets_file()),
            planned_rules: PlannedRuleRepository::new(paths.planned_rules_file()),
            exchange_rates: ExchangeRateRepository::new(paths.exchange_rates_file()),
            events: EventBus::new(),
            audit: AuditLogger::new(paths.audit_log()),
            paths,
        })
    }

    /// Open storage and load every repository
    pub fn open(paths: WalletPaths) -> WalletResult<Self> {
        let storage = Self::new(paths)?;
        storage.load_all()?;
        Ok(storage)
    }

    pub fn paths(&self) -> &WalletPaths {
        &self.paths
    }

    /// Load all data from disk
    pub fn load_all(&self) -> WalletResult<()> {
        self.accounts.load()?;
        self.categories.load()?;
        self.transactions.load()?;
        self.budgets.load()?;
        self.planned_rules.load()?;
        self.exchange_rates.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> WalletResult<()> {
        self.accounts.save()?;
        self.categories.save()?;
        self.transactions.save()?;
        self.budgets.save()?;
        self.planned_rules.save()?;
        self.exchange_rates.save()?;
        Ok(())
    }

    /// Check if storage has been initialized
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Notify subscribers that something changed
    pub fn notify(&self, event: WalletEvent) {
        self.events.post(event);
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> WalletResult<()> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> WalletResult<()> {
        self.audit.log(&AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
        ))
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> WalletResult<()> {
        self.audit
            .log(&AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// Fresh, loaded storage in a temp dir
    pub fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = WalletPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        (temp_dir, storage)
    }
}
