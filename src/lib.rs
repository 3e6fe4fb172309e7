//! wallet-cli - local-first multi-currency personal finance ledger
//!
//! This library provides the core functionality behind the `wallet` binary:
//! accounts in any currency, categorized income and expenses, transfers with
//! currency conversion, planned payments, budgets, CSV import from other
//! finance apps, and directory-backed sync.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Paths and persisted settings
//! - `error`: Custom error types
//! - `models`: Core data models (accounts, transactions, categories, etc.)
//! - `storage`: JSON file storage layer
//! - `services`: Business logic layer
//! - `audit`: Audit logging system
//! - `events`: Change notifications posted after mutations
//! - `export`: CSV, JSON and YAML export
//! - `display`: Terminal formatting
//! - `cli`: Command handlers for the binary
//!
//! # Example
//!
//! ```rust,ignore
//! use wallet_cli::config::WalletPaths;
//! use wallet_cli::services::WalletService;
//! use wallet_cli::storage::Storage;
//!
//! let storage = Storage::open(WalletPaths::new()?)?;
//! let total = WalletService::new(&storage).calculate_balance(true)?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod events;
pub mod export;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{WalletError, WalletResult};
