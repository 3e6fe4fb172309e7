//! CSV import service
//!
//! Imports transactions exported by Ivy Wallet itself and by a handful of
//! other finance apps. Each source format is described by an `ImportType`:
//! its delimiter and which header names hold which field. Rows that cannot
//! be understood are reported and skipped; the rest of the file still goes
//! in. Accounts and categories named in the file are created on demand and
//! do not count against the paywall.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::audit::{AuditEntry, EntityType};
use crate::error::{WalletError, WalletResult};
use crate::events::WalletEvent;
use crate::models::{currency, Account, Category, CategoryId, Money, Transaction, TransactionType};
use crate::services::exchange::ExchangeService;
use crate::storage::{Repository, Storage};

/// App a CSV file comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportType {
    Ivy,
    MoneyManager,
    WalletByBudgetBakers,
    Spendee,
    OneMoney,
}

/// Header names for each field; `None` when the format has no such column
#[derive(Debug, Clone, Copy)]
pub struct HeaderMap {
    pub date: &'static str,
    pub amount: &'static str,
    pub account: &'static str,
    pub transaction_type: Option<&'static str>,
    pub currency: Option<&'static str>,
    pub category: Option<&'static str>,
    pub title: Option<&'static str>,
    pub description: Option<&'static str>,
    pub to_account: Option<&'static str>,
    pub to_amount: Option<&'static str>,
    pub to_currency: Option<&'static str>,
    pub due_date: Option<&'static str>,
}

impl ImportType {
    pub const ALL: [ImportType; 5] = [
        Self::Ivy,
        Self::MoneyManager,
        Self::WalletByBudgetBakers,
        Self::Spendee,
        Self::OneMoney,
    ];

    /// Parse the short name used on the command line
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "ivy" | "ivywallet" => Some(Self::Ivy),
            "moneymanager" => Some(Self::MoneyManager),
            "wallet" | "budgetbakers" | "walletbybudgetbakers" => Some(Self::WalletByBudgetBakers),
            "spendee" => Some(Self::Spendee),
            "onemoney" | "1money" => Some(Self::OneMoney),
            _ => None,
        }
    }

    pub fn list_name(&self) -> &'static str {
        match self {
            Self::Ivy => "Ivy Wallet CSV",
            Self::MoneyManager => "Money Manager",
            Self::WalletByBudgetBakers => "Wallet by BudgetBakers",
            Self::Spendee => "Spendee",
            Self::OneMoney => "1Money",
        }
    }

    pub fn app_name(&self) -> &'static str {
        match self {
            Self::Ivy => "Ivy Wallet",
            Self::MoneyManager => "Money Manager",
            Self::WalletByBudgetBakers => "Wallet by BudgetBakers",
            Self::Spendee => "Spendee",
            Self::OneMoney => "1Money",
        }
    }

    /// Package id of the source app
    pub fn app_id(&self) -> &'static str {
        match self {
            Self::Ivy => "com.ivy.wallet",
            Self::MoneyManager => "com.realbyteapps.moneymanagerfree",
            Self::WalletByBudgetBakers => "com.droid4you.application.wallet",
            Self::Spendee => "com.cleevio.spendee",
            Self::OneMoney => "org.pixelrush.moneyiq",
        }
    }

    pub fn delimiter(&self) -> u8 {
        match self {
            Self::MoneyManager => b'\t',
            Self::WalletByBudgetBakers => b';',
            Self::Ivy | Self::Spendee | Self::OneMoney => b',',
        }
    }

    pub fn headers(&self) -> HeaderMap {
        match self {
            Self::Ivy => HeaderMap {
                date: "Date",
                amount: "Amount",
                account: "Account",
                transaction_type: Some("Type"),
                currency: Some("Currency"),
                category: Some("Category"),
                title: Some("Title"),
                description: Some("Description"),
                to_account: Some("To Account"),
                to_amount: Some("Receive Amount"),
                to_currency: Some("Receive Currency"),
                due_date: Some("Due Date"),
            },
            Self::MoneyManager => HeaderMap {
                date: "Period",
                amount: "Amount",
                account: "Accounts",
                transaction_type: Some("Income/Expense"),
                currency: Some("Currency"),
                category: Some("Category"),
                title: Some("Note"),
                description: Some("Description"),
                to_account: None,
                to_amount: None,
                to_currency: None,
                due_date: None,
            },
            Self::WalletByBudgetBakers => HeaderMap {
                date: "date",
                amount: "amount",
                account: "account",
                transaction_type: Some("type"),
                currency: Some("currency"),
                category: Some("category"),
                title: Some("payee"),
                description: Some("note"),
                to_account: None,
                to_amount: None,
                to_currency: None,
                due_date: None,
            },
            Self::Spendee => HeaderMap {
                date: "Date",
                amount: "Amount",
                account: "Wallet",
                transaction_type: Some("Type"),
                currency: Some("Currency"),
                category: Some("Category name"),
                title: Some("Note"),
                description: None,
                to_account: None,
                to_amount: None,
                to_currency: None,
                due_date: None,
            },
            Self::OneMoney => HeaderMap {
                date: "DATE",
                amount: "AMOUNT",
                account: "FROM ACCOUNT",
                transaction_type: Some("TYPE"),
                currency: Some("CURRENCY"),
                category: None,
                title: Some("NOTES"),
                description: None,
                to_account: Some("TO ACCOUNT / TO CATEGORY"),
                to_amount: Some("AMOUNT 2"),
                to_currency: Some("CURRENCY 2"),
                due_date: None,
            },
        }
    }

    /// Move fields into place for formats that overload columns
    fn normalize(&self, row: &mut ImportRow) {
        match self {
            // "FROM" is the category for income, "TO" is the category for expenses
            Self::OneMoney => match row.transaction_type {
                TransactionType::Expense => {
                    row.category = row.to_account.take();
                    row.to_amount = None;
                }
                TransactionType::Income => {
                    row.category = Some(std::mem::take(&mut row.account));
                    row.account = row.to_account.take().unwrap_or_default();
                    row.to_amount = None;
                }
                TransactionType::Transfer => {}
            },
            // Transfers name the destination account in the category column
            Self::MoneyManager if row.transaction_type == TransactionType::Transfer => {
                row.to_account = row.category.take();
            }
            _ => {}
        }
    }
}

impl fmt::Display for ImportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.list_name())
    }
}

/// One understood line of the CSV
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    /// 1-based line number in the file, header included
    pub line: usize,
    pub date: Option<NaiveDateTime>,
    pub due_date: Option<NaiveDateTime>,
    pub transaction_type: TransactionType,
    /// Always positive
    pub amount: Money,
    pub currency: Option<String>,
    pub account: String,
    pub category: Option<String>,
    pub to_account: Option<String>,
    pub to_amount: Option<Money>,
    pub to_currency: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Result of a completed import
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    /// Number of transactions imported
    pub imported: usize,
    /// Number of duplicates skipped
    pub duplicates_skipped: usize,
    /// One message per row that could not be imported
    pub errors: Vec<String>,
    /// Names of accounts created for the import
    pub accounts_created: Vec<String>,
    /// Names of categories created for the import
    pub categories_created: Vec<String>,
}

/// Column positions resolved from the header row
struct Columns {
    index: HashMap<String, usize>,
    map: HeaderMap,
}

impl Columns {
    fn new(headers: &StringRecord, map: HeaderMap) -> WalletResult<Self> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().trim_start_matches('\u{feff}').to_lowercase(), i))
            .collect();

        let columns = Self { index, map };
        for required in [map.amount, map.account] {
            if columns.position(required).is_none() {
                return Err(WalletError::Import(format!("Missing column '{}'", required)));
            }
        }
        if columns.position(map.date).is_none() && map.due_date.and_then(|d| columns.position(d)).is_none() {
            return Err(WalletError::Import(format!("Missing column '{}'", map.date)));
        }
        Ok(columns)
    }

    fn position(&self, header: &str) -> Option<usize> {
        self.index.get(&header.to_lowercase()).copied()
    }

    fn get<'r>(&self, record: &'r StringRecord, header: Option<&str>) -> Option<&'r str> {
        header
            .and_then(|h| self.position(h))
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Parse an amount such as "1,234.50", "-12", "€ 9,99" or "(15.00)"
pub fn parse_amount(raw: &str) -> Result<Money, String> {
    let negative = raw.contains('-') || (raw.contains('(') && raw.contains(')'));
    let mut digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();

    // A lone comma followed by one or two digits is a decimal separator
    if !digits.contains('.') {
        if let Some(pos) = digits.rfind(',') {
            let decimals = digits.len() - pos - 1;
            if digits.matches(',').count() == 1 && (1..=2).contains(&decimals) {
                digits.replace_range(pos..=pos, ".");
            }
        }
    }
    digits.retain(|c| c != ',');

    if digits.is_empty() {
        return Err(format!("Could not parse amount '{}'", raw));
    }
    let amount = Money::parse(&digits).map_err(|e| format!("Could not parse amount '{}': {}", raw, e))?;
    Ok(if negative { -amount } else { amount })
}

/// Parse a date or date-time in one of the formats finance apps export
pub fn parse_date_time(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }

    let date_time_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%d.%m.%Y %H:%M",
        "%d/%m/%Y %H:%M",
        "%m/%d/%Y %H:%M",
    ];
    for format in date_time_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt);
        }
    }

    let date_formats = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%m/%d/%Y", "%Y/%m/%d", "%d-%m-%Y"];
    for format in date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(dt);
            }
        }
    }

    Err(format!("Could not parse date '{}'", raw))
}

/// Map the many spellings apps use for the transaction type
fn parse_type(raw: Option<&str>, signed_amount: Money) -> Result<Option<TransactionType>, String> {
    let Some(raw) = raw else {
        return Ok(Some(if signed_amount.is_negative() {
            TransactionType::Expense
        } else {
            TransactionType::Income
        }));
    };

    let lower = raw.trim().to_lowercase();
    match lower.as_str() {
        // The receiving half of a transfer is exported as its own row
        "transfer-in" => Ok(None),
        "exp." | "transfer-out" => Ok(Some(if lower == "exp." {
            TransactionType::Expense
        } else {
            TransactionType::Transfer
        })),
        "inc." => Ok(Some(TransactionType::Income)),
        _ => TransactionType::parse(&lower)
            .map(Some)
            .ok_or_else(|| format!("Unknown transaction type '{}'", raw)),
    }
}

fn parse_row(
    import_type: ImportType,
    columns: &Columns,
    record: &StringRecord,
    line: usize,
) -> Result<Option<ImportRow>, String> {
    let map = columns.map;

    let raw_amount = columns
        .get(record, Some(map.amount))
        .ok_or_else(|| "Missing amount".to_string())?;
    let signed = parse_amount(raw_amount)?;

    let Some(transaction_type) = parse_type(columns.get(record, map.transaction_type), signed)? else {
        return Ok(None);
    };

    let date = columns
        .get(record, Some(map.date))
        .map(parse_date_time)
        .transpose()?;
    let due_date = columns
        .get(record, map.due_date)
        .map(parse_date_time)
        .transpose()?;
    if date.is_none() && due_date.is_none() {
        return Err("Missing date".into());
    }

    let account = columns
        .get(record, Some(map.account))
        .ok_or_else(|| "Missing account".to_string())?
        .to_string();

    let text = |header: Option<&str>| columns.get(record, header).map(str::to_string);
    let to_amount = columns
        .get(record, map.to_amount)
        .map(parse_amount)
        .transpose()?
        .map(|m| m.abs());

    let mut row = ImportRow {
        line,
        date,
        due_date,
        transaction_type,
        amount: signed.abs(),
        currency: text(map.currency),
        account,
        category: text(map.category),
        to_account: text(map.to_account),
        to_amount,
        to_currency: text(map.to_currency),
        title: text(map.title),
        description: text(map.description),
    };
    import_type.normalize(&mut row);

    if row.account.trim().is_empty() {
        return Err("Missing account".into());
    }
    if row.transaction_type == TransactionType::Transfer && row.to_account.is_none() {
        return Err("Transfer without a destination account".into());
    }
    Ok(Some(row))
}

/// Parse every row of a CSV; unreadable rows come back as `Err(message)`
pub fn parse_csv<R: Read>(reader: R, import_type: ImportType) -> WalletResult<Vec<Result<ImportRow, String>>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(import_type.delimiter())
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = Columns::new(&headers, import_type.headers())?;

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let line = index + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                rows.push(Err(format!("Row {}: {}", line, e)));
                continue;
            }
        };
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        match parse_row(import_type, &columns, &record, line) {
            Ok(Some(row)) => rows.push(Ok(row)),
            Ok(None) => {}
            Err(e) => rows.push(Err(format!("Row {}: {}", line, e))),
        }
    }
    Ok(rows)
}

/// Service for CSV import
pub struct ImportService<'a> {
    storage: &'a Storage,
}

/// Accounts and categories resolved or created during one import
#[derive(Default)]
struct Lookup {
    accounts: HashMap<String, Account>,
    categories: HashMap<String, CategoryId>,
}

impl<'a> ImportService<'a> {
    /// Create a new import service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Import a CSV file
    pub fn import_file(&self, path: &Path, import_type: ImportType) -> WalletResult<ImportResult> {
        let file = File::open(path)
            .map_err(|e| WalletError::Import(format!("Cannot open {}: {}", path.display(), e)))?;
        self.import_reader(file, import_type)
    }

    /// Import CSV data from any reader
    pub fn import_reader<R: Read>(&self, reader: R, import_type: ImportType) -> WalletResult<ImportResult> {
        let parsed = parse_csv(reader, import_type)?;
        let mut result = ImportResult::default();
        let mut lookup = Lookup::default();
        let mut audit_entries = Vec::new();

        let known_ids: HashSet<String> = self
            .storage
            .transactions
            .get_all()?
            .iter()
            .map(|t| t.import_id.clone().unwrap_or_else(|| t.generate_import_id()))
            .collect();

        for row in parsed {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    result.errors.push(e);
                    continue;
                }
            };

            match self.build_transaction(&row, &mut lookup, &mut result) {
                Ok(mut txn) => {
                    let import_id = txn.generate_import_id();
                    // Identical rows within one file are separate transactions
                    if known_ids.contains(&import_id) {
                        result.duplicates_skipped += 1;
                        continue;
                    }
                    txn.import_id = Some(import_id);
                    audit_entries.push(AuditEntry::create(
                        EntityType::Transaction,
                        txn.id.to_string(),
                        txn.title.clone(),
                        &txn,
                    ));
                    self.storage.transactions.upsert(txn)?;
                    result.imported += 1;
                }
                Err(e) => result.errors.push(format!("Row {}: {}", row.line, e)),
            }
        }

        self.storage.accounts.save()?;
        self.storage.categories.save()?;
        self.storage.transactions.save()?;
        self.storage.audit().log_batch(&audit_entries)?;

        tracing::info!(
            source = %import_type,
            imported = result.imported,
            duplicates = result.duplicates_skipped,
            errors = result.errors.len(),
            "import finished"
        );
        if !result.accounts_created.is_empty() {
            self.storage.notify(WalletEvent::AccountsUpdated);
        }
        if !result.categories_created.is_empty() {
            self.storage.notify(WalletEvent::CategoriesUpdated);
        }
        if result.imported > 0 {
            self.storage.notify(WalletEvent::TransactionsUpdated);
        }
        Ok(result)
    }

    fn build_transaction(
        &self,
        row: &ImportRow,
        lookup: &mut Lookup,
        result: &mut ImportResult,
    ) -> WalletResult<Transaction> {
        let account = self.account_for(&row.account, row.currency.as_deref(), lookup, result)?;

        let mut txn = match row.date {
            Some(date) => Transaction::new(row.transaction_type, account.id, row.amount, date),
            None => {
                let due = row.due_date.ok_or_else(|| WalletError::Import("Missing date".into()))?;
                Transaction::planned(row.transaction_type, account.id, row.amount, due)
            }
        };
        txn.title = row.title.clone();
        txn.description = row.description.clone();

        if row.transaction_type == TransactionType::Transfer {
            let to_name = row
                .to_account
                .as_deref()
                .ok_or_else(|| WalletError::Import("Transfer without a destination account".into()))?;
            let to_account =
                self.account_for(to_name, row.to_currency.as_deref().or(row.currency.as_deref()), lookup, result)?;
            txn.to_account_id = Some(to_account.id);
            txn.to_amount = Some(match row.to_amount {
                Some(amount) => amount,
                None => self.receive_amount(row.amount, &account, &to_account)?,
            });
        } else if let Some(name) = row.category.as_deref() {
            txn.category_id = Some(self.category_for(name, lookup, result)?);
        }

        txn.validate()
            .map_err(|e| WalletError::Import(e.to_string()))?;
        Ok(txn)
    }

    fn receive_amount(&self, amount: Money, from: &Account, to: &Account) -> WalletResult<Money> {
        let base = self.storage.settings.base_currency()?;
        let (from_currency, to_currency) = (from.currency_or(&base), to.currency_or(&base));
        match ExchangeService::new(self.storage).convert_amount(amount, from_currency, to_currency) {
            Ok(converted) => Ok(converted),
            Err(WalletError::MissingExchangeRate { from, to }) => {
                tracing::warn!(%from, %to, "no exchange rate; transfer imported 1:1");
                Ok(amount)
            }
            Err(e) => Err(e),
        }
    }

    fn account_for(
        &self,
        name: &str,
        currency_code: Option<&str>,
        lookup: &mut Lookup,
        result: &mut ImportResult,
    ) -> WalletResult<Account> {
        let key = name.trim().to_lowercase();
        if let Some(account) = lookup.accounts.get(&key) {
            return Ok(account.clone());
        }

        let account = match self.storage.accounts.get_by_name(name)? {
            Some(existing) => existing,
            None => {
                let base = self.storage.settings.base_currency()?;
                let mut account = Account::new(name.trim());
                account.currency = currency::normalize_opt(currency_code)?.filter(|c| *c != base);
                account.order_num = self.storage.accounts.max_order_num()? + 1.0;
                account
                    .validate()
                    .map_err(|e| WalletError::Import(e.to_string()))?;
                self.storage.accounts.upsert(account.clone())?;
                self.storage.log_create(
                    EntityType::Account,
                    account.id.to_string(),
                    Some(account.name.clone()),
                    &account,
                )?;
                result.accounts_created.push(account.name.clone());
                account
            }
        };
        lookup.accounts.insert(key, account.clone());
        Ok(account)
    }

    fn category_for(&self, name: &str, lookup: &mut Lookup, result: &mut ImportResult) -> WalletResult<CategoryId> {
        let key = name.trim().to_lowercase();
        if let Some(id) = lookup.categories.get(&key) {
            return Ok(*id);
        }

        let id = match self.storage.categories.get_by_name(name)? {
            Some(existing) => existing.id,
            None => {
                let category =
                    Category::with_order(name.trim(), self.storage.categories.max_order_num()? + 1.0);
                category
                    .validate()
                    .map_err(|e| WalletError::Import(e.to_string()))?;
                self.storage.categories.upsert(category.clone())?;
                self.storage.log_create(
                    EntityType::Category,
                    category.id.to_string(),
                    Some(category.name.clone()),
                    &category,
                )?;
                result.categories_created.push(category.name.clone());
                category.id
            }
        };
        lookup.categories.insert(key, id);
        Ok(id)
    }
}
