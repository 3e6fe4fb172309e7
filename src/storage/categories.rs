//! Category repository for JSON storage

use std::path::PathBuf;

use crate::error::WalletResult;
use crate::models::{Category, CategoryId};

use super::repository::Repository;
use super::table::Table;

pub struct CategoryRepository {
    table: Table<Category>,
}

impl Repository for CategoryRepository {
    type Item = Category;

    fn table(&self) -> &Table<Category> {
        &self.table
    }
}

impl CategoryRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            table: Table::new(path),
        }
    }

    /// Active categories in display order
    pub fn get_all(&self) -> WalletResult<Vec<Category>> {
        let mut categories = self.table.active()?;
        categories.sort_by(|a, b| {
            a.order_num
                .total_cmp(&b.order_num)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(categories)
    }

    /// Get an active category by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> WalletResult<Option<Category>> {
        let name_lower = name.trim().to_lowercase();
        Ok(self
            .table
            .active()?
            .into_iter()
            .find(|c| c.name.to_lowercase() == name_lower))
    }

    pub fn name_exists(&self, name: &str, exclude_id: Option<CategoryId>) -> WalletResult<bool> {
        Ok(self
            .get_by_name(name)?
            .map(|c| Some(c.id) != exclude_id)
            .unwrap_or(false))
    }

    /// Find an active category by name or id
    pub fn find(&self, identifier: &str) -> WalletResult<Option<Category>> {
        if let Some(category) = self.get_by_name(identifier)? {
            return Ok(Some(category));
        }
        Ok(self
            .table
            .active()?
            .into_iter()
            .find(|c| c.id.matches(identifier)))
    }

    pub fn max_order_num(&self) -> WalletResult<f64> {
        Ok(self
            .table
            .active()?
            .iter()
            .map(|c| c.order_num)
            .fold(-1.0, f64::max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, CategoryRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = CategoryRepository::new(temp_dir.path().join("categories.json"));
        repo.load().unwrap();
        (temp_dir, repo)
    }

    #[test]
    fn test_sorted_by_order_then_name() {
        let (_temp, repo) = create_test_repo();
        repo.upsert(Category::with_order("Transport", 1.0)).unwrap();
        repo.upsert(Category::with_order("Groceries", 0.0)).unwrap();
        repo.upsert(Category::with_order("Bills", 1.0)).unwrap();

        let names: Vec<_> = repo.get_all().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Groceries", "Bills", "Transport"]);
    }

    #[test]
    fn test_deleted_category_not_found_by_name() {
        let (_temp, repo) = create_test_repo();
        let mut category = Category::new("Gifts");
        category.mark_deleted();
        repo.upsert(category).unwrap();

        assert!(repo.get_by_name("gifts").unwrap().is_none());
        assert!(!repo.name_exists("Gifts", None).unwrap());
    }

    #[test]
    fn test_find_by_short_id() {
        let (_temp, repo) = create_test_repo();
        let category = Category::new("Health");
        let short = category.id.to_string();
        repo.upsert(category).unwrap();

        assert_eq!(repo.find(&short).unwrap().unwrap().name, "Health");
    }
}
