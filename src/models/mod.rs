//! Core data models for wallet-cli
//!
//! This module contains all the data structures that represent the personal
//! finance domain: accounts, categories, transactions, budgets, planned
//! payments and exchange rates.

pub mod account;
pub mod budget;
pub mod category;
pub mod currency;
pub mod exchange_rate;
pub mod ids;
pub mod money;
pub mod period;
pub mod planned;
pub mod transaction;
pub mod user;

pub use account::Account;
pub use budget::Budget;
pub use category::Category;
pub use exchange_rate::ExchangeRate;
pub use ids::{AccountId, BudgetId, CategoryId, PlannedRuleId, TransactionId, UserId};
pub use money::Money;
pub use period::{DateRange, TimePeriod};
pub use planned::{IntervalType, PlannedPaymentRule};
pub use transaction::{Transaction, TransactionType};
pub use user::User;
