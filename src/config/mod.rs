//! Configuration module for wallet-cli
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence (base currency, month start, sync, paywall)

pub mod paths;
pub mod settings;

pub use paths::WalletPaths;
pub use settings::{LastSync, PaywallSettings, Settings, SyncSettings};
