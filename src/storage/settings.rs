//! Shared, persisted settings
//!
//! Services read the base currency and premium flag and write back the last
//! selected account, the signed-in user and sync outcomes. This store keeps
//! one in-memory copy and saves `config.json` on every update.

use std::sync::RwLock;

use crate::config::{Settings, WalletPaths};
use crate::error::WalletResult;

use super::table::{read_lock, write_lock};

pub struct SettingsStore {
    paths: WalletPaths,
    settings: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(paths: WalletPaths, settings: Settings) -> Self {
        Self {
            paths,
            settings: RwLock::new(settings),
        }
    }

    /// Load settings from disk (defaults when missing)
    pub fn load(paths: WalletPaths) -> WalletResult<Self> {
        let settings = Settings::load_or_create(&paths)?;
        Ok(Self::new(paths, settings))
    }

    /// Snapshot of the current settings
    pub fn get(&self) -> WalletResult<Settings> {
        Ok(read_lock(&self.settings)?.clone())
    }

    pub fn base_currency(&self) -> WalletResult<String> {
        Ok(read_lock(&self.settings)?.base_currency.clone())
    }

    /// Mutate and persist the settings, returning the new snapshot
    pub fn update<F>(&self, f: F) -> WalletResult<Settings>
    where
        F: FnOnce(&mut Settings) -> WalletResult<()>,
    {
        let mut settings = write_lock(&self.settings)?;
        let mut updated = settings.clone();
        f(&mut updated)?;
        updated.save(&self.paths)?;
        *settings = updated.clone();
        Ok(updated)
    }

    pub fn save(&self) -> WalletResult<()> {
        read_lock(&self.settings)?.save(&self.paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_update_persists() {
        let temp_dir = TempDir::new().unwrap();
        let paths = WalletPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = SettingsStore::load(paths.clone()).unwrap();

        store.update(|s| s.set_base_currency("eur")).unwrap();
        assert_eq!(store.base_currency().unwrap(), "EUR");

        let reloaded = SettingsStore::load(paths).unwrap();
        assert_eq!(reloaded.base_currency().unwrap(), "EUR");
    }

    #[test]
    fn test_failed_update_leaves_settings_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let paths = WalletPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = SettingsStore::load(paths).unwrap();

        assert!(store.update(|s| s.set_start_date_of_month(40)).is_err());
        assert_eq!(store.get().unwrap().start_date_of_month, 1);
    }
}
