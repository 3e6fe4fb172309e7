//! Category model
//!
//! Categories are flat tags used to classify income and expenses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::CategoryId;

/// Default display color (opaque purple)
pub const DEFAULT_CATEGORY_COLOR: u32 = 0xFF5C_3DF5;

/// Categories seeded by `wallet init`: (name, color, icon)
pub const DEFAULT_CATEGORIES: &[(&str, u32, &str)] = &[
    ("Food & Drinks", 0xFFF5_7A3D, "fooddrink"),
    ("Bills & Fees", 0xFF4A_4A4A, "bills"),
    ("Transport", 0xFF3D_8AF5, "transport"),
    ("Groceries", 0xFF12_B880, "groceries"),
    ("Entertainment", 0xFFF5_3D8A, "game"),
    ("Shopping", 0xFFFF_C34B, "shopping"),
    ("Gifts", 0xFFE0_3D3D, "gift"),
    ("Health", 0xFF3D_C4F5, "health"),
    ("Investments", 0xFF1E_7A4A, "leaf"),
    ("Loans", 0xFF8A_3DF5, "loan"),
];

/// A transaction category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Unique identifier
    pub id: CategoryId,

    /// Category name
    pub name: String,

    /// Display color as 0xAARRGGBB
    #[serde(default = "default_color")]
    pub color: u32,

    /// Icon name
    #[serde(default)]
    pub icon: Option<String>,

    /// Sort order for display
    #[serde(default)]
    pub order_num: f64,

    #[serde(default)]
    pub is_synced: bool,

    #[serde(default)]
    pub is_deleted: bool,

    /// When the category was created
    pub created_at: DateTime<Utc>,

    /// When the category was last modified
    pub updated_at: DateTime<Utc>,
}

fn default_color() -> u32 {
    DEFAULT_CATEGORY_COLOR
}

impl Category {
    /// Create a new category
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: CategoryId::new(),
            name: name.into(),
            color: DEFAULT_CATEGORY_COLOR,
            icon: None,
            order_num: 0.0,
            is_synced: false,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new category with a specific sort order
    pub fn with_order(name: impl Into<String>, order_num: f64) -> Self {
        let mut category = Self::new(name);
        category.order_num = order_num;
        category
    }

    /// Record a local change
    pub fn touch(&mut self) {
        self.is_synced = false;
        self.updated_at = Utc::now();
    }

    /// Flag the category for deletion
    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
        self.touch();
    }

    /// Validate the category
    pub fn validate(&self) -> Result<(), CategoryValidationError> {
        if self.name.trim().is_empty() {
            return Err(CategoryValidationError::EmptyName);
        }

        if self.name.len() > 50 {
            return Err(CategoryValidationError::NameTooLong(self.name.len()));
        }

        Ok(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Validation errors for categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryValidationError {
    EmptyName,
    NameTooLong(usize),
}

impl fmt::Display for CategoryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Category name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Category name too long ({} chars, max 50)", len)
            }
        }
    }
}

impl std::error::Error for CategoryValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_category() {
        let category = Category::new("Groceries");
        assert_eq!(category.name, "Groceries");
        assert_eq!(category.color, DEFAULT_CATEGORY_COLOR);
        assert!(!category.is_synced);
    }

    #[test]
    fn test_validation() {
        let mut category = Category::new("Valid");
        assert!(category.validate().is_ok());

        category.name = String::new();
        assert_eq!(category.validate(), Err(CategoryValidationError::EmptyName));

        category.name = "a".repeat(51);
        assert!(matches!(
            category.validate(),
            Err(CategoryValidationError::NameTooLong(51))
        ));
    }

    #[test]
    fn test_default_categories_fit_free_plan() {
        assert!(DEFAULT_CATEGORIES.len() <= 12);
    }
}
