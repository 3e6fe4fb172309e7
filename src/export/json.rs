//! JSON Export functionality
//!
//! Exports the complete wallet to JSON format with schema versioning.

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{WalletError, WalletResult};
use crate::models::{Account, Budget, Category, ExchangeRate, PlannedPaymentRule, Transaction};
use crate::storage::Storage;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full wallet export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    /// Currency every total is reported in
    pub base_currency: String,

    pub accounts: Vec<Account>,
    pub categories: Vec<Category>,
    pub transactions: Vec<Transaction>,
    pub planned_rules: Vec<PlannedPaymentRule>,
    pub budgets: Vec<Budget>,
    pub exchange_rates: Vec<ExchangeRate>,

    /// Export metadata
    pub metadata: ExportMetadata,
}

/// Export metadata for reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub account_count: usize,
    pub category_count: usize,
    pub transaction_count: usize,

    /// Planned transactions among `transaction_count`
    pub planned_count: usize,

    /// Earliest transaction date
    pub earliest_transaction: Option<String>,

    /// Latest transaction date
    pub latest_transaction: Option<String>,
}

impl FullExport {
    /// Create a new full export from storage
    pub fn from_storage(storage: &Storage) -> WalletResult<Self> {
        let accounts = storage.accounts.get_all()?;
        let categories = storage.categories.get_all()?;
        let transactions = storage.transactions.get_all()?;
        let planned_rules = storage.planned_rules.get_all()?;
        let budgets = storage.budgets.get_all()?;
        let exchange_rates = storage.exchange_rates.get_all()?;

        let dates = || transactions.iter().filter_map(|t| t.effective_date());
        let metadata = ExportMetadata {
            account_count: accounts.len(),
            category_count: categories.len(),
            transaction_count: transactions.len(),
            planned_count: transactions.iter().filter(|t| t.is_planned()).count(),
            earliest_transaction: dates().min().map(|d| d.to_string()),
            latest_transaction: dates().max().map(|d| d.to_string()),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            base_currency: storage.settings.base_currency()?,
            accounts,
            categories,
            transactions,
            planned_rules,
            budgets,
            exchange_rates,
            metadata,
        })
    }

    /// Check the schema version and that every reference resolves
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let account_ids: HashSet<_> = self.accounts.iter().map(|a| a.id).collect();
        let category_ids: HashSet<_> = self.categories.iter().map(|c| c.id).collect();

        for txn in &self.transactions {
            let accounts = std::iter::once(txn.account_id).chain(txn.to_account_id);
            for account_id in accounts {
                if !account_ids.contains(&account_id) {
                    return Err(format!(
                        "Transaction {} references unknown account {}",
                        txn.id, account_id
                    ));
                }
            }
            if let Some(category_id) = txn.category_id {
                if !category_ids.contains(&category_id) {
                    return Err(format!(
                        "Transaction {} references unknown category {}",
                        txn.id, category_id
                    ));
                }
            }
        }

        for rule in &self.planned_rules {
            if !account_ids.contains(&rule.account_id) {
                return Err(format!(
                    "Planned rule {} references unknown account {}",
                    rule.id, rule.account_id
                ));
            }
        }

        for budget in &self.budgets {
            if let Some(missing) = budget.category_ids.iter().find(|id| !category_ids.contains(id)) {
                return Err(format!(
                    "Budget {} references unknown category {}",
                    budget.name, missing
                ));
            }
        }

        Ok(())
    }
}

/// Export the full wallet to JSON
pub fn export_full_json<W: Write>(storage: &Storage, writer: W, pretty: bool) -> WalletResult<()> {
    let export = FullExport::from_storage(storage)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| WalletError::Export(e.to_string()))?;

    tracing::info!(
        transactions = export.metadata.transaction_count,
        "exported wallet to JSON"
    );
    Ok(())
}

/// Read back a JSON export
pub fn read_full_json(json_str: &str) -> WalletResult<FullExport> {
    let export: FullExport =
        serde_json::from_str(json_str).map_err(|e| WalletError::Import(e.to_string()))?;
    export.validate().map_err(WalletError::Import)?;
    Ok(export)
}
