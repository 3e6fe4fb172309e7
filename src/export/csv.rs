//! CSV Export functionality
//!
//! Writes transactions in the Ivy Wallet CSV layout, which the importer
//! reads back with `ImportType::Ivy`.

use std::collections::HashMap;
use std::io::Write;

use chrono::NaiveDateTime;

use crate::error::{WalletError, WalletResult};
use crate::models::{AccountId, CategoryId, TransactionType};
use crate::storage::Storage;

/// Column order of the Ivy CSV format
pub const IVY_CSV_HEADERS: [&str; 15] = [
    "Date",
    "Title",
    "Category",
    "Account",
    "Amount",
    "Currency",
    "Type",
    "Transfer Amount",
    "Transfer Currency",
    "To Account",
    "Receive Amount",
    "Receive Currency",
    "Description",
    "Due Date",
    "ID",
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_date(date: Option<NaiveDateTime>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Export all transactions, oldest first; returns the number of rows written
pub fn export_transactions_csv<W: Write>(storage: &Storage, writer: W) -> WalletResult<usize> {
    let base = storage.settings.base_currency()?;

    let accounts: HashMap<AccountId, (String, String)> = storage
        .accounts
        .get_all()?
        .into_iter()
        .map(|a| {
            let currency = a.currency_or(&base).to_string();
            (a.id, (a.name, currency))
        })
        .collect();
    let categories: HashMap<CategoryId, String> = storage
        .categories
        .get_all()?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let mut transactions = storage.transactions.get_all()?;
    transactions.reverse();

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(IVY_CSV_HEADERS)
        .map_err(|e| WalletError::Export(e.to_string()))?;

    let unknown = (String::new(), base.clone());
    let mut rows = 0;
    for txn in &transactions {
        let (account_name, currency) = accounts.get(&txn.account_id).unwrap_or(&unknown);
        let category = txn
            .smart_category_id()
            .and_then(|id| categories.get(&id))
            .cloned()
            .unwrap_or_default();

        let (transfer_amount, transfer_currency, to_account, receive_amount, receive_currency) =
            if txn.transaction_type == TransactionType::Transfer {
                let (to_name, to_currency) = txn
                    .to_account_id
                    .and_then(|id| accounts.get(&id))
                    .unwrap_or(&unknown);
                (
                    txn.amount.to_string(),
                    currency.clone(),
                    to_name.clone(),
                    txn.received_amount().to_string(),
                    to_currency.clone(),
                )
            } else {
                Default::default()
            };

        csv.write_record([
            format_date(txn.date_time),
            txn.title.clone().unwrap_or_default(),
            category,
            account_name.clone(),
            txn.amount.to_string(),
            currency.clone(),
            txn.transaction_type.as_str().to_string(),
            transfer_amount,
            transfer_currency,
            to_account,
            receive_amount,
            receive_currency,
            txn.description.clone().unwrap_or_default(),
            format_date(if txn.is_planned() { txn.due_date } else { None }),
            txn.id.as_uuid().to_string(),
        ])
        .map_err(|e| WalletError::Export(e.to_string()))?;
        rows += 1;
    }

    csv.flush()?;
    tracing::info!(rows, "exported transactions to CSV");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, Category, Money, Transaction};
    use crate::services::import::{ImportService, ImportType};
    use crate::storage::test_support::create_test_storage;
    use crate::storage::Repository;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, day)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
    }

    fn seed(storage: &Storage) {
        let cash = Account::new("Cash");
        let euro = Account::with_currency("Euro, cash", "EUR");
        let food = Category::new("Food");
        storage.accounts.upsert(cash.clone()).unwrap();
        storage.accounts.upsert(euro.clone()).unwrap();
        storage.categories.upsert(food.clone()).unwrap();

        let mut lunch = Transaction::new(TransactionType::Expense, cash.id, Money::from_cents(1_250), at(2, 12));
        lunch.category_id = Some(food.id);
        lunch.title = Some("Lunch \"special\"".into());
        storage.transactions.upsert(lunch).unwrap();
        storage
            .transactions
            .upsert(Transaction::transfer(
                cash.id,
                euro.id,
                Money::from_cents(10_000),
                Money::from_cents(9_000),
                at(3, 9),
            ))
            .unwrap();
        storage
            .transactions
            .upsert(Transaction::planned(
                TransactionType::Income,
                euro.id,
                Money::from_cents(50_000),
                at(20, 8),
            ))
            .unwrap();
    }

    #[test]
    fn test_export_layout() {
        let (_temp, storage) = create_test_storage();
        seed(&storage);

        let mut out = Vec::new();
        let rows = export_transactions_csv(&storage, &mut out).unwrap();
        assert_eq!(rows, 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], IVY_CSV_HEADERS.join(","));
        assert!(lines[1].starts_with("2025-05-02 12:30:00,\"Lunch \"\"special\"\"\",Food,Cash,12.50,USD,EXPENSE"));
        assert!(lines[2].contains("TRANSFER,100.00,USD,\"Euro, cash\",90.00,EUR"));
        assert!(lines[3].starts_with(",,,\"Euro, cash\",500.00,EUR,INCOME"));
        assert!(lines[3].contains("2025-05-20 08:30:00"));
    }

    #[test]
    fn test_export_then_import_reproduces_transactions() {
        let (_source_dir, source) = create_test_storage();
        seed(&source);
        let mut out = Vec::new();
        export_transactions_csv(&source, &mut out).unwrap();

        let (_target_dir, target) = create_test_storage();
        let result = ImportService::new(&target)
            .import_reader(out.as_slice(), ImportType::Ivy)
            .unwrap();
        assert_eq!(result.imported, 3, "{:?}", result.errors);
        assert!(result.errors.is_empty());

        let euro = target.accounts.get_by_name("Euro, cash").unwrap().unwrap();
        assert_eq!(euro.currency.as_deref(), Some("EUR"));

        let imported = target.transactions.get_all().unwrap();
        let transfer = imported.iter().find(|t| t.is_transfer()).unwrap();
        assert_eq!(transfer.amount.cents(), 10_000);
        assert_eq!(transfer.received_amount().cents(), 9_000);
        assert_eq!(transfer.to_account_id, Some(euro.id));

        let planned = imported.iter().find(|t| t.is_planned()).unwrap();
        assert_eq!(planned.due_date, Some(at(20, 8)));

        let lunch = imported.iter().find(|t| t.is_expense()).unwrap();
        assert_eq!(lunch.title.as_deref(), Some("Lunch \"special\""));
        assert!(lunch.category_id.is_some());

        // Importing the same file again changes nothing
        let again = ImportService::new(&target)
            .import_reader(out.as_slice(), ImportType::Ivy)
            .unwrap();
        assert_eq!(again.duplicates_skipped, 3);
    }
}
