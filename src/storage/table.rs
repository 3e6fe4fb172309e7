//! Generic in-memory table backed by one JSON file
//!
//! Every syncable entity lives in a `Table`: a `RwLock`-guarded map keyed by
//! id, loaded from and saved to a `{ "<kind>": [...] }` document. Entity
//! repositories wrap a table and add their own queries.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{WalletError, WalletResult};
use crate::models::{Account, Budget, Category, PlannedPaymentRule, Transaction};

use super::file_io::{read_json, write_json_atomic};

/// An entity that is persisted locally and mirrored to the sync remote
pub trait Record: Clone + Serialize + DeserializeOwned {
    type Id: Copy + Eq + Hash + Display;

    /// Collection name, used as the JSON document key and the remote folder
    const KIND: &'static str;

    fn id(&self) -> Self::Id;
    fn uuid(&self) -> Uuid;
    fn is_synced(&self) -> bool;
    fn is_deleted(&self) -> bool;
    fn set_synced(&mut self, synced: bool);
}

macro_rules! impl_record {
    ($ty:ty, $id:ty, $kind:literal) => {
        impl Record for $ty {
            type Id = $id;
            const KIND: &'static str = $kind;

            fn id(&self) -> Self::Id {
                self.id
            }

            fn uuid(&self) -> Uuid {
                *self.id.as_uuid()
            }

            fn is_synced(&self) -> bool {
                self.is_synced
            }

            fn is_deleted(&self) -> bool {
                self.is_deleted
            }

            fn set_synced(&mut self, synced: bool) {
                self.is_synced = synced;
            }
        }
    };
}

impl_record!(Account, crate::models::AccountId, "accounts");
impl_record!(Category, crate::models::CategoryId, "categories");
impl_record!(Transaction, crate::models::TransactionId, "transactions");
impl_record!(Budget, crate::models::BudgetId, "budgets");
impl_record!(PlannedPaymentRule, crate::models::PlannedRuleId, "planned_rules");

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> WalletResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|e| WalletError::Storage(format!("Failed to acquire read lock: {}", e)))
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> WalletResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|e| WalletError::Storage(format!("Failed to acquire write lock: {}", e)))
}

/// A keyed collection of records persisted to one JSON file
pub struct Table<T: Record> {
    path: PathBuf,
    rows: RwLock<HashMap<T::Id, T>>,
}

impl<T: Record> Table<T> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            rows: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the in-memory contents with the file's
    pub fn load(&self) -> WalletResult<Vec<T>> {
        let mut document: Map<String, Value> = read_json(&self.path)?;
        let records: Vec<T> = match document.remove(T::KIND) {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                WalletError::Storage(format!("Failed to parse {}: {}", self.path.display(), e))
            })?,
            None => Vec::new(),
        };

        let mut rows = write_lock(&self.rows)?;
        rows.clear();
        for record in &records {
            rows.insert(record.id(), record.clone());
        }
        Ok(records)
    }

    /// Write every record (deleted ones included) back to disk
    pub fn save(&self) -> WalletResult<()> {
        let rows = read_lock(&self.rows)?;
        let mut records: Vec<&T> = rows.values().collect();
        // Stable file order keeps diffs small
        records.sort_by_key(|r| r.uuid());

        let mut document = Map::new();
        document.insert(T::KIND.to_string(), serde_json::to_value(records)?);
        write_json_atomic(&self.path, &document)
    }

    /// Get a record by id, including soft-deleted ones
    pub fn get(&self, id: T::Id) -> WalletResult<Option<T>> {
        Ok(read_lock(&self.rows)?.get(&id).cloned())
    }

    /// Records not flagged as deleted
    pub fn active(&self) -> WalletResult<Vec<T>> {
        Ok(read_lock(&self.rows)?
            .values()
            .filter(|r| !r.is_deleted())
            .cloned()
            .collect())
    }

    /// Every record, deleted ones included
    pub fn all(&self) -> WalletResult<Vec<T>> {
        Ok(read_lock(&self.rows)?.values().cloned().collect())
    }

    /// Records with local changes not yet on the remote
    pub fn unsynced(&self) -> WalletResult<Vec<T>> {
        Ok(read_lock(&self.rows)?
            .values()
            .filter(|r| !r.is_synced())
            .cloned()
            .collect())
    }

    pub fn count_active(&self) -> WalletResult<usize> {
        Ok(read_lock(&self.rows)?
            .values()
            .filter(|r| !r.is_deleted())
            .count())
    }

    /// Insert or replace a record, returning the previous version
    pub fn insert(&self, record: T) -> WalletResult<Option<T>> {
        Ok(write_lock(&self.rows)?.insert(record.id(), record))
    }

    /// Hard-delete a record
    pub fn remove(&self, id: T::Id) -> WalletResult<Option<T>> {
        Ok(write_lock(&self.rows)?.remove(&id))
    }

    /// Flag a record as uploaded
    pub fn mark_synced(&self, id: T::Id) -> WalletResult<bool> {
        let mut rows = write_lock(&self.rows)?;
        match rows.get_mut(&id) {
            Some(record) => {
                record.set_synced(true);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}
