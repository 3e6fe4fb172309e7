//! Category display formatting

use crate::display::format::{format_color, format_money};
use crate::models::Category;
use crate::services::category::CategoryData;

/// Format categories with their period totals, amounts in the base currency
pub fn format_category_list(categories: &[CategoryData], base_currency: &str) -> String {
    if categories.is_empty() {
        return "No categories found.\n\nRun 'wallet init' to create default categories.\n"
            .to_string();
    }

    let name_width = categories
        .iter()
        .map(|c| c.category.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:>16}  {:>16}  {:>18}\n",
        "Name",
        "Income",
        "Expenses",
        "Balance",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:->16}  {:->16}  {:->18}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for data in categories {
        output.push_str(&format!(
            "{:<name_width$}  {:>16}  {:>16}  {:>18}\n",
            data.category.name,
            data.income.format_grouped(),
            data.expenses.format_grouped(),
            format_money(data.balance, base_currency),
            name_width = name_width,
        ));
    }

    output
}

pub fn format_category_details(category: &Category) -> String {
    let mut output = String::new();
    output.push_str(&format!("Category: {}\n", category.name));
    output.push_str(&format!("  ID:     {}\n", category.id));
    output.push_str(&format!("  Color:  {}\n", format_color(category.color)));
    if let Some(icon) = &category.icon {
        output.push_str(&format!("  Icon:   {}\n", icon));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;

    #[test]
    fn test_format_category_list() {
        let food = CategoryData {
            category: Category::new("Food"),
            income: Money::zero(),
            expenses: Money::from_cents(4_250),
            balance: Money::from_cents(-4_250),
        };
        let output = format_category_list(&[food], "EUR");

        assert!(output.starts_with("Name"));
        assert!(output.contains("Food"));
        assert!(output.contains("-42.50 EUR"));
    }

    #[test]
    fn test_empty_list_hints_init() {
        assert!(format_category_list(&[], "USD").contains("wallet init"));
    }

    #[test]
    fn test_format_category_details() {
        let mut category = Category::new("Travel");
        category.icon = Some("plane".into());
        let output = format_category_details(&category);
        assert!(output.contains("Category: Travel"));
        assert!(output.contains("Icon:   plane"));
    }
}
