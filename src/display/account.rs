//! Account display formatting
//!
//! Formats accounts for terminal output in table and detail views.

use crate::display::format::{format_color, format_money};
use crate::models::Money;
use crate::services::account::AccountData;
use crate::services::wallet::BalanceOverview;

/// Format accounts with balances as a table
///
/// `base_currency` labels the converted column and the total row.
pub fn format_account_list(
    accounts: &[AccountData],
    base_currency: &str,
    total: Option<Money>,
) -> String {
    if accounts.is_empty() {
        return "No accounts found.\n".to_string();
    }

    let name_width = accounts
        .iter()
        .map(|a| a.account.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(5);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:>18}  {:>18}  {:>16}  {:>16}  {}\n",
        "Name",
        "Balance",
        format!("In {}", base_currency),
        "Income",
        "Expenses",
        "Flags",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:->18}  {:->18}  {:->16}  {:->16}  {:-<8}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for data in accounts {
        let currency = data.account.currency.as_deref().unwrap_or(base_currency);
        let converted = match (&data.account.currency, data.balance_base) {
            (None, _) => String::new(),
            (Some(_), Some(amount)) => format_money(amount, base_currency),
            (Some(_), None) => "no rate".to_string(),
        };
        let flags = if data.account.include_in_balance {
            ""
        } else {
            "excluded"
        };

        output.push_str(&format!(
            "{:<name_width$}  {:>18}  {:>18}  {:>16}  {:>16}  {}\n",
            data.account.name,
            format_money(data.balance, currency),
            converted,
            data.income.format_grouped(),
            data.expenses.format_grouped(),
            flags,
            name_width = name_width,
        ));
    }

    if let Some(total) = total {
        output.push_str(&format!(
            "{:-<name_width$}  {:->18}\n",
            "",
            "",
            name_width = name_width
        ));
        output.push_str(&format!(
            "{:<name_width$}  {:>18}\n",
            "TOTAL",
            format_money(total, base_currency),
            name_width = name_width,
        ));
    }

    output
}

/// Format a single account's details
pub fn format_account_details(data: &AccountData, base_currency: &str) -> String {
    let account = &data.account;
    let currency = account.currency.as_deref().unwrap_or(base_currency);

    let mut output = String::new();
    output.push_str(&format!("Account: {}\n", account.name));
    output.push_str(&format!("  ID:          {}\n", account.id));
    output.push_str(&format!("  Currency:    {}\n", currency));
    output.push_str(&format!("  Color:       {}\n", format_color(account.color)));
    if let Some(icon) = &account.icon {
        output.push_str(&format!("  Icon:        {}\n", icon));
    }
    output.push_str(&format!(
        "  In balance:  {}\n",
        if account.include_in_balance { "Yes" } else { "No" }
    ));
    output.push('\n');
    output.push_str(&format!("  Balance:     {}\n", format_money(data.balance, currency)));
    if let Some(base) = data.balance_base.filter(|_| account.currency.is_some()) {
        output.push_str(&format!("               {}\n", format_money(base, base_currency)));
    }
    output.push_str(&format!("  Income:      {}\n", format_money(data.income, currency)));
    output.push_str(&format!("  Expenses:    {}\n", format_money(data.expenses, currency)));
    output.push('\n');
    output.push_str(&format!(
        "  Created:  {}\n",
        account.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output.push_str(&format!(
        "  Modified: {}\n",
        account.updated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    output
}

/// Format the wallet balance with its planned-payments projection
pub fn format_balance_overview(overview: &BalanceOverview, base_currency: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Balance:        {}\n",
        format_money(overview.current, base_currency)
    ));
    output.push_str(&format!(
        "Planned:        {}\n",
        format_money(overview.planned, base_currency)
    ));
    output.push_str(&format!(
        "After planned:  {}\n",
        format_money(overview.after_planned, base_currency)
    ));
    output
}
