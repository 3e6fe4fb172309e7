//! Audit logging system for wallet-cli
//!
//! Records create, update and delete operations with before/after values in
//! an append-only, line-delimited JSON log (`audit.log`).
//!
//! Services never touch the logger directly; they go through the
//! `Storage::log_create` / `log_update` / `log_delete` helpers.

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
