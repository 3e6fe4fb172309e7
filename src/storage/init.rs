//! Storage initialization
//!
//! Handles first-run setup and default data creation

use crate::error::WalletResult;
use crate::models::category::DEFAULT_CATEGORIES;
use crate::models::{Account, Category};

use super::repository::Repository;
use super::Storage;

/// Initialize storage for a fresh installation
///
/// Seeds the default categories and a "Cash" account in the base currency,
/// then writes `config.json`. Returns false when the wallet was already
/// initialized, in which case nothing is touched.
pub fn initialize_storage(storage: &Storage) -> WalletResult<bool> {
    if storage.is_initialized() {
        return Ok(false);
    }

    storage.paths().ensure_directories()?;

    if storage.categories.count()? == 0 {
        for (index, (name, color, icon)) in DEFAULT_CATEGORIES.iter().enumerate() {
            let mut category = Category::with_order(*name, index as f64);
            category.color = *color;
            category.icon = Some((*icon).to_string());
            storage.categories.upsert(category)?;
        }
        storage.categories.save()?;
    }

    if storage.accounts.count()? == 0 {
        let mut cash = Account::new("Cash");
        cash.icon = Some("cash".to_string());
        storage.accounts.upsert(cash)?;
        storage.accounts.save()?;
    }

    storage.settings.save()?;
    tracing::info!(
        data_dir = %storage.paths().base_dir().display(),
        "initialized wallet storage"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::create_test_storage;

    #[test]
    fn test_initialize_storage() {
        let (_temp_dir, storage) = create_test_storage();
        assert!(!storage.is_initialized());

        assert!(initialize_storage(&storage).unwrap());

        assert!(storage.is_initialized());
        assert_eq!(storage.categories.count().unwrap(), DEFAULT_CATEGORIES.len());
        let accounts = storage.accounts.get_all().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].name, "Cash");
    }

    #[test]
    fn test_initialize_twice_is_noop() {
        let (_temp_dir, storage) = create_test_storage();
        initialize_storage(&storage).unwrap();
        assert!(!initialize_storage(&storage).unwrap());
        assert_eq!(storage.accounts.count().unwrap(), 1);
    }
}
