//! Budget display formatting

use crate::display::format::format_money;
use crate::services::budget::BudgetProgress;

const BAR_WIDTH: usize = 20;

/// Format a percentage with precision suited to its size
pub fn format_percentage(pct: f64) -> String {
    if pct > 0.0 && pct < 0.1 {
        format!("{:.2}%", pct)
    } else if pct < 10.0 {
        format!("{:.1}%", pct)
    } else {
        format!("{:.0}%", pct)
    }
}

/// Progress bar for a 0..1 ratio; overspending fills the whole bar
pub fn format_bar(ratio: f64, width: usize) -> String {
    let filled = if ratio <= 0.0 {
        0
    } else {
        ((ratio * width as f64).round() as usize).min(width)
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Format budget progress as a table, amounts in the base currency
pub fn format_budget_progress(progress: &[BudgetProgress], base_currency: &str) -> String {
    if progress.is_empty() {
        return "No budgets found.\n".to_string();
    }

    let name_width = progress
        .iter()
        .map(|p| p.budget.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:>16}  {:>16}  {:>18}  {:<w$}  {:>6}\n",
        "Name",
        "Budget",
        "Spent",
        "Left",
        "",
        "Used",
        name_width = name_width,
        w = BAR_WIDTH,
    ));
    output.push_str(&"-".repeat(name_width + 16 + 16 + 18 + BAR_WIDTH + 6 + 10));
    output.push('\n');

    for item in progress {
        let status = if item.is_overspent() { "  OVER" } else { "" };
        output.push_str(&format!(
            "{:<name_width$}  {:>16}  {:>16}  {:>18}  {}  {:>6}{}\n",
            item.budget.name,
            item.budget.amount.format_grouped(),
            item.spent.format_grouped(),
            format_money(item.remaining, base_currency),
            format_bar(item.ratio, BAR_WIDTH),
            format_percentage(item.ratio * 100.0),
            status,
            name_width = name_width,
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Budget, Money};

    fn progress(name: &str, amount: i64, spent: i64) -> BudgetProgress {
        let budget = Budget::new(name, Money::from_cents(amount));
        BudgetProgress {
            spent: Money::from_cents(spent),
            remaining: Money::from_cents(amount - spent),
            ratio: spent as f64 / amount as f64,
            budget,
        }
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(0.05), "0.05%");
        assert_eq!(format_percentage(5.3), "5.3%");
        assert_eq!(format_percentage(75.0), "75%");
    }

    #[test]
    fn test_format_bar() {
        assert_eq!(format_bar(0.5, 4), "██░░");
        assert_eq!(format_bar(0.0, 4), "░░░░");
        assert_eq!(format_bar(1.7, 4), "████");
    }

    #[test]
    fn test_format_budget_progress() {
        let output = format_budget_progress(
            &[progress("Food", 40_000, 30_000), progress("Fun", 10_000, 15_000)],
            "USD",
        );
        assert!(output.contains("Food"));
        assert!(output.contains("100.00 USD"));
        assert!(output.contains("75%"));
        assert!(output.contains("-50.00 USD"));
        assert!(output.contains("OVER"));
    }
}
