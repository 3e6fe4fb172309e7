//! Display formatting for terminal output
//!
//! Provides utilities for formatting data models for terminal display:
//! money with currency codes, relative dates and the entity tables.

pub mod account;
pub mod budget;
pub mod category;
pub mod format;
pub mod statistics;
pub mod transaction;

pub use account::{format_account_details, format_account_list, format_balance_overview};
pub use budget::format_budget_progress;
pub use category::{format_category_details, format_category_list};
pub use format::{format_money, format_nicely, format_relative_date, time_left};
pub use statistics::format_item_statistics;
pub use transaction::{
    format_planned_payments, format_transaction_details, format_transaction_list, NameLookup,
};
