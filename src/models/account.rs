//! Account model
//!
//! Represents money containers (cash, bank accounts, cards, savings) each
//! held in its own currency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AccountId;

/// Default display color (opaque green)
pub const DEFAULT_ACCOUNT_COLOR: u32 = 0xFF12_B880;

/// A financial account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,

    /// Account name (e.g., "Cash", "Revolut")
    pub name: String,

    /// Display color as 0xAARRGGBB
    #[serde(default = "default_color")]
    pub color: u32,

    /// Currency code; `None` means the base currency
    #[serde(default)]
    pub currency: Option<String>,

    /// Icon name
    #[serde(default)]
    pub icon: Option<String>,

    /// Sort order for display
    #[serde(default)]
    pub order_num: f64,

    /// Whether the account counts toward the total balance
    #[serde(default = "default_true")]
    pub include_in_balance: bool,

    /// False while local changes are waiting to be uploaded
    #[serde(default)]
    pub is_synced: bool,

    /// Deleted locally, removal not yet propagated to the remote
    #[serde(default)]
    pub is_deleted: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last modified
    pub updated_at: DateTime<Utc>,
}

fn default_color() -> u32 {
    DEFAULT_ACCOUNT_COLOR
}

fn default_true() -> bool {
    true
}

impl Account {
    /// Create a new account in the base currency
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            name: name.into(),
            color: DEFAULT_ACCOUNT_COLOR,
            currency: None,
            icon: None,
            order_num: 0.0,
            include_in_balance: true,
            is_synced: false,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new account held in a specific currency
    pub fn with_currency(name: impl Into<String>, currency: impl Into<String>) -> Self {
        let mut account = Self::new(name);
        account.currency = Some(currency.into());
        account
    }

    /// The account's currency, falling back to the base currency
    pub fn currency_or<'a>(&'a self, base_currency: &'a str) -> &'a str {
        self.currency.as_deref().unwrap_or(base_currency)
    }

    /// Record a local change
    pub fn touch(&mut self) {
        self.is_synced = false;
        self.updated_at = Utc::now();
    }

    /// Flag the account for deletion
    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
        self.touch();
    }

    /// Validate the account
    pub fn validate(&self) -> Result<(), AccountValidationError> {
        if self.name.trim().is_empty() {
            return Err(AccountValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(AccountValidationError::NameTooLong(self.name.len()));
        }

        Ok(())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.currency {
            Some(currency) => write!(f, "{} ({})", self.name, currency),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Validation errors for accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyName,
    NameTooLong(usize),
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Account name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Account name too long ({} chars, max 100)", len)
            }
        }
    }
}

impl std::error::Error for AccountValidationError {}
