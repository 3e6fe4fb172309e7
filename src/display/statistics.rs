//! Per-item statistics display

use chrono::NaiveDateTime;

use crate::display::format::format_money;
use crate::display::transaction::{format_planned_payments, format_transaction_list, NameLookup};
use crate::services::statistics::ItemStatistics;

/// Format the statistics screen for one account or category
pub fn format_item_statistics(stats: &ItemStatistics, names: &NameLookup, now: NaiveDateTime) -> String {
    let currency = stats.currency.as_str();

    let mut output = String::new();
    output.push_str(&format!("{}\n", stats.name));
    output.push_str(&format!("{}\n", "=".repeat(stats.name.chars().count().max(8))));
    output.push_str(&format!("Balance:   {}\n", format_money(stats.balance, currency)));
    if let Some(base) = stats.balance_base {
        output.push_str(&format!("           {}\n", format_money(base, names.base_currency())));
    }
    output.push_str(&format!("Income:    {}\n", format_money(stats.income, currency)));
    output.push_str(&format!("Expenses:  {}\n", format_money(stats.expenses, currency)));
    output.push('\n');

    output.push_str(&format_planned_payments("Upcoming", &stats.upcoming, names, now));
    output.push_str(&format_planned_payments("Overdue", &stats.overdue, names, now));
    output.push('\n');

    output.push_str(&format!("History ({})\n", stats.history.len()));
    output.push_str(&format_transaction_list(&stats.history, names, now));
    output
}
