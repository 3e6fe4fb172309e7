//! Common repository behaviour shared by every entity store

use crate::error::WalletResult;

use super::table::{Record, Table};

/// Operations every entity repository supports
///
/// Repositories only need to expose their `Table`; the rest has sensible
/// defaults. Repositories with secondary indexes override the mutating
/// methods to keep them current.
pub trait Repository {
    type Item: Record;

    fn table(&self) -> &Table<Self::Item>;

    /// Load from disk
    fn load(&self) -> WalletResult<()> {
        self.table().load().map(|_| ())
    }

    /// Save to disk
    fn save(&self) -> WalletResult<()> {
        self.table().save()
    }

    /// Get a record by id, including soft-deleted ones
    fn get(&self, id: <Self::Item as Record>::Id) -> WalletResult<Option<Self::Item>> {
        self.table().get(id)
    }

    /// Insert or update a record
    fn upsert(&self, item: Self::Item) -> WalletResult<()> {
        self.table().insert(item).map(|_| ())
    }

    /// Hard-delete a record once the remote has confirmed its removal
    fn purge(&self, id: <Self::Item as Record>::Id) -> WalletResult<bool> {
        Ok(self.table().remove(id)?.is_some())
    }

    /// Dirty records, soft-deleted ones included
    fn get_unsynced(&self) -> WalletResult<Vec<Self::Item>> {
        self.table().unsynced()
    }

    fn mark_synced(&self, id: <Self::Item as Record>::Id) -> WalletResult<bool> {
        self.table().mark_synced(id)
    }

    /// Number of records that are not soft-deleted
    fn count(&self) -> WalletResult<usize> {
        self.table().count_active()
    }
}
