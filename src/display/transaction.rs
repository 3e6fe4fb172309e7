//! Transaction display formatting
//!
//! Provides utilities for formatting transactions for terminal display,
//! including the history list, planned payments and single-transaction
//! details.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::display::format::{format_money, format_nicely_with_time, format_relative_date, time_left, truncate};
use crate::error::WalletResult;
use crate::models::{AccountId, CategoryId, Transaction, TransactionType};
use crate::services::planned::PlannedPayments;
use crate::storage::{Repository, Storage};

/// Name of the pseudo-category for uncategorized transactions
pub const UNSPECIFIED_CATEGORY: &str = "Unspecified";

/// Account and category names needed to print transactions
#[derive(Debug, Clone, Default)]
pub struct NameLookup {
    base_currency: String,
    accounts: HashMap<AccountId, (String, Option<String>)>,
    categories: HashMap<CategoryId, String>,
}

impl NameLookup {
    /// Load names, deleted entities included, so old rows still resolve
    pub fn load(storage: &Storage) -> WalletResult<Self> {
        Ok(Self {
            base_currency: storage.settings.base_currency()?,
            accounts: storage
                .accounts
                .table()
                .all()?
                .into_iter()
                .map(|a| (a.id, (a.name, a.currency)))
                .collect(),
            categories: storage
                .categories
                .table()
                .all()?
                .into_iter()
                .map(|c| (c.id, c.name))
                .collect(),
        })
    }

    pub fn account(&self, id: AccountId) -> &str {
        self.accounts
            .get(&id)
            .map(|(name, _)| name.as_str())
            .unwrap_or("?")
    }

    /// Currency of an account, falling back to the base currency
    pub fn currency(&self, id: AccountId) -> &str {
        self.accounts
            .get(&id)
            .and_then(|(_, currency)| currency.as_deref())
            .unwrap_or(&self.base_currency)
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    pub fn category(&self, id: Option<CategoryId>) -> &str {
        id.and_then(|id| self.categories.get(&id))
            .map(String::as_str)
            .unwrap_or(UNSPECIFIED_CATEGORY)
    }
}

fn amount_column(txn: &Transaction, names: &NameLookup) -> String {
    let currency = names.currency(txn.account_id);
    match txn.transaction_type {
        TransactionType::Income => format!("+{}", format_money(txn.amount, currency)),
        TransactionType::Expense => format_money(-txn.amount, currency),
        TransactionType::Transfer => format_money(txn.amount, currency),
    }
}

fn account_column(txn: &Transaction, names: &NameLookup) -> String {
    match txn.to_account_id {
        Some(to) if txn.is_transfer() => {
            format!("{} → {}", names.account(txn.account_id), names.account(to))
        }
        _ => names.account(txn.account_id).to_string(),
    }
}

fn date_column(txn: &Transaction, now: NaiveDateTime) -> String {
    match (txn.date_time, txn.due_date) {
        (Some(date), _) => format_relative_date(date.date(), now.date()),
        (None, Some(due)) if txn.is_overdue(now) => {
            format!("{} (overdue)", format_relative_date(due.date(), now.date()))
        }
        (None, Some(due)) => format!(
            "{} (in {})",
            format_relative_date(due.date(), now.date()),
            time_left(due, now)
        ),
        (None, None) => String::new(),
    }
}

/// Format a single transaction as one list row
pub fn format_transaction_row(txn: &Transaction, names: &NameLookup, now: NaiveDateTime) -> String {
    let category = if txn.is_transfer() {
        "Transfer"
    } else {
        names.category(txn.category_id)
    };

    format!(
        "{:<8}  {:<28}  {:>20}  {:<24}  {:<14}  {}",
        txn.id.short(),
        date_column(txn, now),
        amount_column(txn, names),
        truncate(&account_column(txn, names), 24),
        truncate(category, 14),
        txn.title.as_deref().unwrap_or("")
    )
}

/// Format a list of transactions with a header
pub fn format_transaction_list(transactions: &[Transaction], names: &NameLookup, now: NaiveDateTime) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<8}  {:<28}  {:>20}  {:<24}  {:<14}  {}\n",
        "ID", "Date", "Amount", "Account", "Category", "Title"
    ));
    output.push_str(&"-".repeat(110));
    output.push('\n');

    for txn in transactions {
        output.push_str(&format_transaction_row(txn, names, now));
        output.push('\n');
    }

    output
}

/// Format planned payments with their totals in the base currency
pub fn format_planned_payments(
    label: &str,
    planned: &PlannedPayments,
    names: &NameLookup,
    now: NaiveDateTime,
) -> String {
    let base = names.base_currency();
    let mut output = format!(
        "{} ({}): income {}, expenses {}\n",
        label,
        planned.items.len(),
        format_money(planned.income, base),
        format_money(planned.expenses, base)
    );
    if !planned.items.is_empty() {
        output.push_str(&format_transaction_list(&planned.items, names, now));
    }
    output
}

/// Format transaction details for display
pub fn format_transaction_details(txn: &Transaction, names: &NameLookup, now: NaiveDateTime) -> String {
    let mut output = String::new();

    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!("Type:        {}\n", txn.transaction_type));
    output.push_str(&format!("Amount:      {}\n", amount_column(txn, names)));
    output.push_str(&format!("Account:     {}\n", names.account(txn.account_id)));

    if let Some(to) = txn.to_account_id.filter(|_| txn.is_transfer()) {
        output.push_str(&format!("To account:  {}\n", names.account(to)));
        output.push_str(&format!(
            "Received:    {}\n",
            format_money(txn.received_amount(), names.currency(to))
        ));
    } else {
        output.push_str(&format!("Category:    {}\n", names.category(txn.category_id)));
    }

    if let Some(title) = &txn.title {
        output.push_str(&format!("Title:       {}\n", title));
    }
    if let Some(description) = &txn.description {
        output.push_str(&format!("Description: {}\n", description));
    }

    if let Some(date) = txn.date_time {
        output.push_str(&format!("Date:        {}\n", format_nicely_with_time(date)));
    }
    if let Some(due) = txn.due_date {
        let status = if txn.is_overdue(now) {
            "overdue".to_string()
        } else {
            time_left(due, now)
        };
        output.push_str(&format!("Due:         {} ({})\n", format_nicely_with_time(due), status));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, Category, Money};
    use crate::storage::test_support::create_test_storage;
    use chrono::{Duration, NaiveDate};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn fixture() -> (tempfile::TempDir, NameLookup, Account, Account, Category) {
        let (temp, storage) = create_test_storage();
        let cash = Account::new("Cash");
        let euro = Account::with_currency("Euro", "EUR");
        let food = Category::new("Food");
        storage.accounts.upsert(cash.clone()).unwrap();
        storage.accounts.upsert(euro.clone()).unwrap();
        storage.categories.upsert(food.clone()).unwrap();
        let names = NameLookup::load(&storage).unwrap();
        (temp, names, cash, euro, food)
    }

    #[test]
    fn test_name_lookup() {
        let (_temp, names, cash, euro, food) = fixture();
        assert_eq!(names.account(cash.id), "Cash");
        assert_eq!(names.currency(cash.id), "USD");
        assert_eq!(names.currency(euro.id), "EUR");
        assert_eq!(names.category(Some(food.id)), "Food");
        assert_eq!(names.category(None), UNSPECIFIED_CATEGORY);
        assert_eq!(names.account(AccountId::new()), "?");
    }

    #[test]
    fn test_format_rows() {
        let (_temp, names, cash, euro, food) = fixture();

        let mut lunch = Transaction::new(TransactionType::Expense, cash.id, Money::from_cents(1_250), now());
        lunch.category_id = Some(food.id);
        lunch.title = Some("Lunch".into());
        let transfer = Transaction::transfer(
            cash.id,
            euro.id,
            Money::from_cents(10_000),
            Money::from_cents(9_000),
            now() - Duration::days(1),
        );

        let output = format_transaction_list(&[lunch, transfer], &names, now());
        assert!(output.contains("Today, 05 Mar"));
        assert!(output.contains("-12.50 USD"));
        assert!(output.contains("Food"));
        assert!(output.contains("Lunch"));
        assert!(output.contains("Yesterday, 04 Mar"));
        assert!(output.contains("Cash → Euro"));
        assert!(output.contains("Transfer"));
    }

    #[test]
    fn test_planned_rows_show_time_left() {
        let (_temp, names, cash, _euro, _food) = fixture();
        let rent = Transaction::planned(
            TransactionType::Expense,
            cash.id,
            Money::from_cents(80_000),
            now() + Duration::days(2) + Duration::hours(3),
        );
        let late = Transaction::planned(
            TransactionType::Income,
            cash.id,
            Money::from_cents(1_000),
            now() - Duration::days(3),
        );

        let row = format_transaction_row(&rent, &names, now());
        assert!(row.contains("(in 2d 3h)"));
        assert!(row.contains("-800.00 USD"));
        assert!(row.contains(UNSPECIFIED_CATEGORY));

        let row = format_transaction_row(&late, &names, now());
        assert!(row.contains("(overdue)"));
        assert!(row.contains("+10.00 USD"));
    }

    #[test]
    fn test_format_details() {
        let (_temp, names, cash, euro, _food) = fixture();
        let transfer = Transaction::transfer(
            cash.id,
            euro.id,
            Money::from_cents(10_000),
            Money::from_cents(9_000),
            now(),
        );
        let output = format_transaction_details(&transfer, &names, now());
        assert!(output.contains("Type:        Transfer"));
        assert!(output.contains("To account:  Euro"));
        assert!(output.contains("Received:    90.00 EUR"));
    }

    #[test]
    fn test_planned_summary_header() {
        let (_temp, names, _cash, _euro, _food) = fixture();
        let planned = PlannedPayments {
            items: Vec::new(),
            income: Money::zero(),
            expenses: Money::from_cents(5_000),
        };
        assert_eq!(
            format_planned_payments("Upcoming", &planned, &names, now()),
            "Upcoming (0): income 0.00 USD, expenses 50.00 USD\n"
        );
    }
}
