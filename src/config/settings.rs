//! User settings for wallet-cli
//!
//! Manages user preferences including the base currency, the day a month
//! starts on, paywall limits, the signed-in user and sync preferences.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::paths::WalletPaths;
use crate::error::WalletError;
use crate::models::{currency, AccountId, User};

/// Free-tier limits enforced by the paywall
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaywallSettings {
    /// Whether the paywall is enforced at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_free_accounts")]
    pub free_accounts: usize,

    #[serde(default = "default_free_categories")]
    pub free_categories: usize,

    #[serde(default = "default_free_budgets")]
    pub free_budgets: usize,
}

impl Default for PaywallSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            free_accounts: default_free_accounts(),
            free_categories: default_free_categories(),
            free_budgets: default_free_budgets(),
        }
    }
}

/// Outcome of the most recent sync run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastSync {
    pub at: DateTime<Utc>,
    pub success: bool,
    pub message: String,
}

/// Cloud sync preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Directory acting as the remote store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_dir: Option<PathBuf>,

    /// Sync after every save
    #[serde(default)]
    pub auto_sync: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<LastSync>,
}

/// User settings for wallet-cli
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// ISO code all aggregate balances are reported in
    #[serde(default = "default_currency")]
    pub base_currency: String,

    /// Day of month (1-31) a budgeting month starts on
    #[serde(default = "default_start_date_of_month")]
    pub start_date_of_month: u32,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Premium unlocks everything the paywall guards
    #[serde(default)]
    pub premium: bool,

    #[serde(default)]
    pub paywall: PaywallSettings,

    /// Account preselected for new transactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_selected_account_id: Option<AccountId>,

    /// Authenticated identity used for cloud sync
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,

    #[serde(default)]
    pub sync: SyncSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_start_date_of_month() -> u32 {
    1
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_true() -> bool {
    true
}

fn default_free_accounts() -> usize {
    3
}

fn default_free_categories() -> usize {
    12
}

fn default_free_budgets() -> usize {
    2
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            base_currency: default_currency(),
            start_date_of_month: default_start_date_of_month(),
            date_format: default_date_format(),
            premium: false,
            paywall: PaywallSettings::default(),
            last_selected_account_id: None,
            user: None,
            sync: SyncSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &WalletPaths) -> Result<Self, WalletError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| WalletError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                WalletError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &WalletPaths) -> Result<(), WalletError> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| WalletError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| WalletError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    /// Change the base currency, normalizing the code
    pub fn set_base_currency(&mut self, code: &str) -> Result<(), WalletError> {
        self.base_currency = currency::normalize(code)?;
        Ok(())
    }

    /// Change the day budgeting months start on
    pub fn set_start_date_of_month(&mut self, day: u32) -> Result<(), WalletError> {
        if !(1..=31).contains(&day) {
            return Err(WalletError::Validation(format!(
                "Start day of month must be between 1 and 31, got {}",
                day
            )));
        }
        self.start_date_of_month = day;
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.base_currency, "USD");
        assert_eq!(settings.start_date_of_month, 1);
        assert!(!settings.premium);
        assert!(settings.paywall.enabled);
        assert_eq!(settings.paywall.free_accounts, 3);
        assert_eq!(settings.paywall.free_categories, 12);
        assert_eq!(settings.paywall.free_budgets, 2);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = WalletPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.set_base_currency("bgn").unwrap();
        settings.set_start_date_of_month(25).unwrap();
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.base_currency, "BGN");
        assert_eq!(loaded.start_date_of_month, 25);
    }

    #[test]
    fn test_start_date_bounds() {
        let mut settings = Settings::default();
        assert!(settings.set_start_date_of_month(0).is_err());
        assert!(settings.set_start_date_of_month(32).is_err());
        assert!(settings.set_start_date_of_month(31).is_ok());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"base_currency":"EUR"}"#).unwrap();
        assert_eq!(settings.base_currency, "EUR");
        assert_eq!(settings.start_date_of_month, 1);
        assert_eq!(settings.paywall.free_budgets, 2);
    }
}
