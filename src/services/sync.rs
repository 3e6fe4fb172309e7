//! Sync service
//!
//! Local-first synchronization. Every entity carries a dirty flag
//! (`is_synced == false` after a local change) and a soft-delete flag. A sync
//! run uploads dirty entities, propagates deletions and then purges them
//! locally, and finally pulls remote entities that have no pending local
//! changes. Entities are handled independently: one failure is recorded and
//! the run carries on, and running sync again retries whatever is still
//! dirty.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::config::LastSync;
use crate::error::{WalletError, WalletResult};
use crate::events::WalletEvent;
use crate::models::{User, UserId};
use crate::storage::file_io::{read_json_required, remove_file_if_exists, write_json_atomic};
use crate::storage::{Record, Repository, Storage};

/// Outcome of an operation that reports failure as data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpResult<T> {
    Success(T),
    Failure(String),
}

impl<T> OpResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Counters for one sync run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pushed: usize,
    pub deleted: usize,
    pub pulled: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl SyncReport {
    fn fail(&mut self, message: String) {
        tracing::warn!(%message, "sync item failed");
        self.failed += 1;
        self.errors.push(message);
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pushed, {} deleted, {} pulled, {} failed",
            self.pushed, self.deleted, self.pulled, self.failed
        )
    }
}

/// Remote store the wallet syncs against
pub trait SyncBackend {
    /// Create or replace one entity
    fn push(&self, user: UserId, kind: &str, id: Uuid, record: &Value) -> WalletResult<()>;

    /// Remove one entity; removing a missing entity succeeds
    fn delete(&self, user: UserId, kind: &str, id: Uuid) -> WalletResult<()>;

    /// Every entity of a kind
    fn fetch_all(&self, user: UserId, kind: &str) -> WalletResult<Vec<Value>>;
}

/// Directory-backed remote: `<root>/<user>/<kind>/<uuid>.json`
pub struct FileSyncBackend {
    root: PathBuf,
}

impl FileSyncBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn kind_dir(&self, user: UserId, kind: &str) -> PathBuf {
        self.root.join(user.as_uuid().to_string()).join(kind)
    }

    fn record_path(&self, user: UserId, kind: &str, id: Uuid) -> PathBuf {
        self.kind_dir(user, kind).join(format!("{}.json", id))
    }
}

impl SyncBackend for FileSyncBackend {
    fn push(&self, user: UserId, kind: &str, id: Uuid, record: &Value) -> WalletResult<()> {
        write_json_atomic(self.record_path(user, kind, id), record)
    }

    fn delete(&self, user: UserId, kind: &str, id: Uuid) -> WalletResult<()> {
        remove_file_if_exists(self.record_path(user, kind, id))
    }

    fn fetch_all(&self, user: UserId, kind: &str) -> WalletResult<Vec<Value>> {
        let dir = self.kind_dir(user, kind);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|e| {
            WalletError::Sync(format!("Failed to list {}: {}", dir.display(), e))
        })?;

        let mut records = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| WalletError::Sync(format!("Failed to list {}: {}", dir.display(), e)))?
                .path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                records.push(read_json_required(&path)?);
            }
        }
        Ok(records)
    }
}

/// Service for cloud sync and sign-in
pub struct SyncService<'a> {
    storage: &'a Storage,
    backend: Option<Box<dyn SyncBackend + 'a>>,
}

impl<'a> SyncService<'a> {
    /// Sync against the remote directory configured in settings
    pub fn new(storage: &'a Storage) -> WalletResult<Self> {
        let settings = storage.settings.get()?;
        let backend = settings
            .sync
            .remote_dir
            .map(|dir| Box::new(FileSyncBackend::new(dir)) as Box<dyn SyncBackend + 'a>);
        Ok(Self { storage, backend })
    }

    /// Sync against an explicit backend
    pub fn with_backend(storage: &'a Storage, backend: Box<dyn SyncBackend + 'a>) -> Self {
        Self {
            storage,
            backend: Some(backend),
        }
    }

    /// Sign in; every local entity is flagged for upload to the new account
    pub fn login(&self, email: &str, name: Option<&str>) -> WalletResult<User> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(WalletError::Validation(format!(
                "Invalid email address: '{}'",
                email
            )));
        }

        let user = User::new(email, name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()));
        self.storage.settings.update(|s| {
            s.user = Some(user.clone());
            Ok(())
        })?;

        mark_all_dirty(&self.storage.accounts)?;
        mark_all_dirty(&self.storage.categories)?;
        mark_all_dirty(&self.storage.transactions)?;
        mark_all_dirty(&self.storage.budgets)?;
        mark_all_dirty(&self.storage.planned_rules)?;

        tracing::info!(email = %user.email, "logged in");
        self.storage.notify(WalletEvent::SettingsUpdated);
        Ok(user)
    }

    /// Sign out; local data stays in place
    pub fn logout(&self) -> WalletResult<()> {
        self.storage.settings.update(|s| {
            s.user = None;
            Ok(())
        })?;
        tracing::info!("logged out");
        self.storage.notify(WalletEvent::SettingsUpdated);
        Ok(())
    }

    /// Configure the remote directory and auto-sync
    pub fn configure(&self, remote_dir: Option<&Path>, auto_sync: Option<bool>) -> WalletResult<()> {
        self.storage.settings.update(|s| {
            if let Some(dir) = remote_dir {
                s.sync.remote_dir = Some(dir.to_path_buf());
            }
            if let Some(auto_sync) = auto_sync {
                s.sync.auto_sync = auto_sync;
            }
            Ok(())
        })?;
        self.storage.notify(WalletEvent::SettingsUpdated);
        Ok(())
    }

    /// Number of entities waiting to be uploaded
    pub fn pending_count(&self) -> WalletResult<usize> {
        Ok(self.storage.accounts.get_unsynced()?.len()
            + self.storage.categories.get_unsynced()?.len()
            + self.storage.transactions.get_unsynced()?.len()
            + self.storage.budgets.get_unsynced()?.len()
            + self.storage.planned_rules.get_unsynced()?.len())
    }

    /// Run a full sync
    ///
    /// Errors only when sync cannot start (not logged in, no remote). Per
    /// entity problems end up in the returned `OpResult`.
    pub fn sync(&self) -> WalletResult<OpResult<SyncReport>> {
        let settings = self.storage.settings.get()?;
        let user = settings.user.ok_or(WalletError::NotLoggedIn)?;
        let backend = self
            .backend
            .as_deref()
            .ok_or_else(|| WalletError::Sync("No sync remote configured. Run 'wallet sync config --remote <dir>'".into()))?;

        tracing::info!(user = %user.email, "sync started");
        let mut report = SyncReport::default();

        sync_kind(&self.storage.accounts, backend, user.id, &mut report)?;
        sync_kind(&self.storage.categories, backend, user.id, &mut report)?;
        sync_kind(&self.storage.planned_rules, backend, user.id, &mut report)?;
        sync_kind(&self.storage.transactions, backend, user.id, &mut report)?;
        sync_kind(&self.storage.budgets, backend, user.id, &mut report)?;

        let outcome = if report.failed == 0 {
            OpResult::Success(report.clone())
        } else {
            OpResult::Failure(format!(
                "{} item(s) failed to sync: {}",
                report.failed,
                report.errors.join("; ")
            ))
        };

        let success = outcome.is_success();
        self.storage.settings.update(|s| {
            s.sync.last_sync = Some(LastSync {
                at: Utc::now(),
                success,
                message: report.to_string(),
            });
            Ok(())
        })?;

        tracing::info!(%report, success, "sync finished");
        self.storage.notify(WalletEvent::SyncFinished(success));
        if report.pulled > 0 {
            self.storage.notify(WalletEvent::AccountsUpdated);
            self.storage.notify(WalletEvent::CategoriesUpdated);
            self.storage.notify(WalletEvent::TransactionsUpdated);
            self.storage.notify(WalletEvent::BudgetsUpdated);
        }
        Ok(outcome)
    }

    /// Best-effort sync after a local change; never fails the caller
    pub fn sync_if_enabled(&self) {
        let settings = match self.storage.settings.get() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(error = %e, "auto-sync skipped");
                return;
            }
        };
        if !settings.sync.auto_sync || settings.user.is_none() || self.backend.is_none() {
            return;
        }

        match self.sync() {
            Ok(OpResult::Success(report)) => tracing::debug!(%report, "auto-sync done"),
            Ok(OpResult::Failure(message)) => tracing::warn!(%message, "auto-sync incomplete"),
            Err(e) => tracing::warn!(error = %e, "auto-sync failed"),
        }
    }
}

fn mark_all_dirty<R: Repository>(repo: &R) -> WalletResult<()> {
    for mut record in repo.table().all()? {
        record.set_synced(false);
        repo.upsert(record)?;
    }
    repo.save()
}

fn same_record<T: Record>(local: &T, remote: &T) -> bool {
    match (serde_json::to_value(local), serde_json::to_value(remote)) {
        (Ok(local), Ok(remote)) => local == remote,
        _ => false,
    }
}

/// Push, delete and pull one kind of entity
fn sync_kind<R: Repository>(
    repo: &R,
    backend: &dyn SyncBackend,
    user: UserId,
    report: &mut SyncReport,
) -> WalletResult<()> {
    let kind = <R::Item as Record>::KIND;

    for record in repo.get_unsynced()? {
        let uuid = record.uuid();
        if record.is_deleted() {
            match backend.delete(user, kind, uuid) {
                Ok(()) => {
                    repo.purge(record.id())?;
                    report.deleted += 1;
                }
                Err(e) => report.fail(format!("delete {} {}: {}", kind, uuid, e)),
            }
            continue;
        }

        let pushed = serde_json::to_value(&record)
            .map_err(WalletError::from)
            .and_then(|value| backend.push(user, kind, uuid, &value));
        match pushed {
            Ok(()) => {
                repo.mark_synced(record.id())?;
                report.pushed += 1;
            }
            Err(e) => report.fail(format!("push {} {}: {}", kind, uuid, e)),
        }
    }

    let remote = match backend.fetch_all(user, kind) {
        Ok(remote) => remote,
        Err(e) => {
            report.fail(format!("fetch {}: {}", kind, e));
            repo.save()?;
            return Ok(());
        }
    };

    for value in remote {
        let mut record: R::Item = match serde_json::from_value(value) {
            Ok(record) => record,
            Err(e) => {
                report.fail(format!("parse remote {}: {}", kind, e));
                continue;
            }
        };

        record.set_synced(true);
        // Unchanged copies, including ones pushed earlier in this run, are not pulls
        let take_remote = match repo.get(record.id())? {
            None => true,
            Some(local) => local.is_synced() && !same_record(&local, &record),
        };
        if take_remote {
            repo.upsert(record)?;
            report.pulled += 1;
        }
    }

    repo.save()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, Category};
    use crate::storage::test_support::create_test_storage;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn login(storage: &Storage) {
        SyncService::new(storage)
            .unwrap()
            .login("me@example.com", Some("Me"))
            .unwrap();
    }

    fn file_sync<'a>(storage: &'a Storage, remote: &TempDir) -> SyncService<'a> {
        SyncService::with_backend(storage, Box::new(FileSyncBackend::new(remote.path())))
    }

    /// Backend that rejects pushes for chosen ids
    struct FlakyBackend {
        inner: FileSyncBackend,
        failing: RefCell<HashSet<Uuid>>,
    }

    impl SyncBackend for FlakyBackend {
        fn push(&self, user: UserId, kind: &str, id: Uuid, record: &Value) -> WalletResult<()> {
            if self.failing.borrow().contains(&id) {
                return Err(WalletError::Sync("connection reset".into()));
            }
            self.inner.push(user, kind, id, record)
        }

        fn delete(&self, user: UserId, kind: &str, id: Uuid) -> WalletResult<()> {
            self.inner.delete(user, kind, id)
        }

        fn fetch_all(&self, user: UserId, kind: &str) -> WalletResult<Vec<Value>> {
            self.inner.fetch_all(user, kind)
        }
    }

    #[test]
    fn test_sync_requires_login() {
        let (_temp, storage) = create_test_storage();
        let remote = TempDir::new().unwrap();
        let err = file_sync(&storage, &remote).sync().unwrap_err();
        assert!(matches!(err, WalletError::NotLoggedIn));
    }

    #[test]
    fn test_sync_requires_remote() {
        let (_temp, storage) = create_test_storage();
        login(&storage);
        let err = SyncService::new(&storage).unwrap().sync().unwrap_err();
        assert!(matches!(err, WalletError::Sync(_)));
    }

    #[test]
    fn test_push_clears_dirty_flags() {
        let (_temp, storage) = create_test_storage();
        storage.accounts.upsert(Account::new("Cash")).unwrap();
        login(&storage);
        let remote = TempDir::new().unwrap();
        let sync = file_sync(&storage, &remote);

        let outcome = sync.sync().unwrap();
        match outcome {
            OpResult::Success(report) => assert_eq!(report.pushed, 1),
            OpResult::Failure(msg) => panic!("unexpected failure: {}", msg),
        }
        assert_eq!(sync.pending_count().unwrap(), 0);
        assert!(storage.settings.get().unwrap().sync.last_sync.unwrap().success);
    }

    #[test]
    fn test_unchanged_records_are_not_pulled() {
        let (_temp, storage) = create_test_storage();
        storage.accounts.upsert(Account::new("Cash")).unwrap();
        login(&storage);
        let remote = TempDir::new().unwrap();
        let sync = file_sync(&storage, &remote);

        let first = match sync.sync().unwrap() {
            OpResult::Success(report) => report,
            OpResult::Failure(msg) => panic!("unexpected failure: {}", msg),
        };
        assert_eq!(first.pushed, 1);
        assert_eq!(first.pulled, 0);

        let second = match sync.sync().unwrap() {
            OpResult::Success(report) => report,
            OpResult::Failure(msg) => panic!("unexpected failure: {}", msg),
        };
        assert_eq!(second.pushed, 0);
        assert_eq!(second.pulled, 0);
    }

    #[test]
    fn test_delete_propagates_and_purges() {
        let (_temp, storage) = create_test_storage();
        let category = Category::new("Gifts");
        let id = category.id;
        storage.categories.upsert(category).unwrap();
        login(&storage);
        let remote = TempDir::new().unwrap();
        let sync = file_sync(&storage, &remote);
        sync.sync().unwrap();

        let mut category = storage.categories.get(id).unwrap().unwrap();
        category.mark_deleted();
        storage.categories.upsert(category).unwrap();

        let outcome = sync.sync().unwrap();
        assert!(outcome.is_success());
        assert!(storage.categories.get(id).unwrap().is_none());

        let user = storage.settings.get().unwrap().user.unwrap();
        let backend = FileSyncBackend::new(remote.path());
        assert!(backend.fetch_all(user.id, "categories").unwrap().is_empty());
    }

    #[test]
    fn test_pull_brings_remote_entities() {
        let (_temp, storage) = create_test_storage();
        login(&storage);
        let user = storage.settings.get().unwrap().user.unwrap();
        let remote = TempDir::new().unwrap();

        let backend = FileSyncBackend::new(remote.path());
        let account = Account::new("From phone");
        backend
            .push(
                user.id,
                "accounts",
                *account.id.as_uuid(),
                &serde_json::to_value(&account).unwrap(),
            )
            .unwrap();

        file_sync(&storage, &remote).sync().unwrap();

        let pulled = storage.accounts.get(account.id).unwrap().unwrap();
        assert_eq!(pulled.name, "From phone");
        assert!(pulled.is_synced);
    }

    #[test]
    fn test_failed_item_does_not_stop_run_and_is_retried() {
        let (_temp, storage) = create_test_storage();
        let good = Account::new("Good");
        let bad = Account::new("Bad");
        let bad_uuid = *bad.id.as_uuid();
        storage.accounts.upsert(good.clone()).unwrap();
        storage.accounts.upsert(bad.clone()).unwrap();
        login(&storage);

        let remote = TempDir::new().unwrap();
        let flaky = FlakyBackend {
            inner: FileSyncBackend::new(remote.path()),
            failing: RefCell::new(HashSet::from([bad_uuid])),
        };
        let sync = SyncService::with_backend(&storage, Box::new(flaky));

        let outcome = sync.sync().unwrap();
        assert!(matches!(outcome, OpResult::Failure(_)));
        assert!(storage.accounts.get(good.id).unwrap().unwrap().is_synced);
        assert!(!storage.accounts.get(bad.id).unwrap().unwrap().is_synced);
        assert!(!storage.settings.get().unwrap().sync.last_sync.unwrap().success);

        // Retry against a healthy backend
        let retry = file_sync(&storage, &remote);
        assert!(retry.sync().unwrap().is_success());
        assert_eq!(retry.pending_count().unwrap(), 0);
    }

    #[test]
    fn test_sync_if_enabled_swallows_errors() {
        let (_temp, storage) = create_test_storage();
        storage
            .settings
            .update(|s| {
                s.sync.auto_sync = true;
                Ok(())
            })
            .unwrap();
        let remote = TempDir::new().unwrap();
        // Not logged in: silently skipped
        file_sync(&storage, &remote).sync_if_enabled();
        assert!(storage.settings.get().unwrap().sync.last_sync.is_none());
    }

    #[test]
    fn test_logout_keeps_data() {
        let (_temp, storage) = create_test_storage();
        storage.accounts.upsert(Account::new("Cash")).unwrap();
        login(&storage);
        let sync = SyncService::new(&storage).unwrap();
        sync.logout().unwrap();
        assert!(!storage.settings.get().unwrap().is_logged_in());
        assert_eq!(storage.accounts.count().unwrap(), 1);
        assert!(sync.login("not-an-email", None).is_err());
    }
}
