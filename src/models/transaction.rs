//! Transaction model
//!
//! A transaction is a dated income, expense or transfer. Amounts are always
//! positive; the type carries the direction. A transaction with a due date and
//! no payment date is a planned payment.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, CategoryId, PlannedRuleId, TransactionId};
use super::money::Money;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

impl TransactionType {
    /// Parse transaction type from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" => Some(Self::Income),
            "expense" | "expenses" | "out" => Some(Self::Expense),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
            Self::Transfer => "TRANSFER",
        }
    }
}

impl Default for TransactionType {
    fn default() -> Self {
        Self::Expense
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "Income"),
            Self::Expense => write!(f, "Expense"),
            Self::Transfer => write!(f, "Transfer"),
        }
    }
}

/// A financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    /// Amount in the source account's currency, always positive
    pub amount: Money,

    /// For transfers, the amount received in the destination currency
    #[serde(default)]
    pub to_amount: Option<Money>,

    /// The account money leaves (expense, transfer) or enters (income)
    pub account_id: AccountId,

    /// Destination account for transfers
    #[serde(default)]
    pub to_account_id: Option<AccountId>,

    #[serde(default)]
    pub category_id: Option<CategoryId>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// When the transaction happened (UTC); `None` while planned
    #[serde(default)]
    pub date_time: Option<NaiveDateTime>,

    /// When a planned payment is due (UTC)
    #[serde(default)]
    pub due_date: Option<NaiveDateTime>,

    /// The planned payment rule that generated this transaction
    #[serde(default)]
    pub recurring_rule_id: Option<PlannedRuleId>,

    /// Import ID for duplicate detection during CSV import
    #[serde(default)]
    pub import_id: Option<String>,

    #[serde(default)]
    pub is_synced: bool,

    #[serde(default)]
    pub is_deleted: bool,

    /// When the transaction was created
    pub created_at: DateTime<Utc>,

    /// When the transaction was last modified
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction happening now
    pub fn new(
        transaction_type: TransactionType,
        account_id: AccountId,
        amount: Money,
        date_time: NaiveDateTime,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            transaction_type,
            amount,
            to_amount: None,
            account_id,
            to_account_id: None,
            category_id: None,
            title: None,
            description: None,
            date_time: Some(date_time),
            due_date: None,
            recurring_rule_id: None,
            import_id: None,
            is_synced: false,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a planned (unpaid) transaction due at the given time
    pub fn planned(
        transaction_type: TransactionType,
        account_id: AccountId,
        amount: Money,
        due_date: NaiveDateTime,
    ) -> Self {
        let mut txn = Self::new(transaction_type, account_id, amount, due_date);
        txn.date_time = None;
        txn.due_date = Some(due_date);
        txn
    }

    /// Create a transfer between two accounts
    pub fn transfer(
        from: AccountId,
        to: AccountId,
        amount: Money,
        to_amount: Money,
        date_time: NaiveDateTime,
    ) -> Self {
        let mut txn = Self::new(TransactionType::Transfer, from, amount, date_time);
        txn.to_account_id = Some(to);
        txn.to_amount = Some(to_amount);
        txn
    }

    pub fn is_income(&self) -> bool {
        self.transaction_type == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.transaction_type == TransactionType::Expense
    }

    pub fn is_transfer(&self) -> bool {
        self.transaction_type == TransactionType::Transfer
    }

    /// Planned payments have a due date but have not been paid yet
    pub fn is_planned(&self) -> bool {
        self.due_date.is_some() && self.date_time.is_none()
    }

    /// A planned payment whose due date has passed
    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        self.is_planned() && self.due_date.map(|due| due < now).unwrap_or(false)
    }

    /// The date used for ordering and period filtering
    pub fn effective_date(&self) -> Option<NaiveDateTime> {
        self.date_time.or(self.due_date)
    }

    /// Category for reporting; transfers are never categorized
    pub fn smart_category_id(&self) -> Option<CategoryId> {
        if self.is_transfer() {
            None
        } else {
            self.category_id
        }
    }

    /// Amount received by the destination account of a transfer
    pub fn received_amount(&self) -> Money {
        self.to_amount.unwrap_or(self.amount)
    }

    /// Whether this transaction touches the account on either side
    pub fn involves_account(&self, account_id: AccountId) -> bool {
        self.account_id == account_id || self.to_account_id == Some(account_id)
    }

    /// Signed effect of this transaction on one account's balance
    pub fn balance_effect(&self, account_id: AccountId) -> Money {
        let mut effect = Money::zero();
        if self.account_id == account_id {
            effect += match self.transaction_type {
                TransactionType::Income => self.amount,
                TransactionType::Expense | TransactionType::Transfer => -self.amount,
            };
        }
        if self.is_transfer() && self.to_account_id == Some(account_id) {
            effect += self.received_amount();
        }
        effect
    }

    /// Mark a planned transaction as paid at the given time
    pub fn pay(&mut self, paid_at: NaiveDateTime) {
        self.date_time = Some(paid_at);
        self.due_date = None;
        self.touch();
    }

    /// Record a local change
    pub fn touch(&mut self) {
        self.is_synced = false;
        self.updated_at = Utc::now();
    }

    /// Flag the transaction for deletion
    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
        self.touch();
    }

    /// Validate the transaction
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if !self.amount.is_positive() {
            return Err(TransactionValidationError::NonPositiveAmount(self.amount));
        }

        if self.is_transfer() {
            match self.to_account_id {
                None => return Err(TransactionValidationError::MissingTransferAccount),
                Some(to) if to == self.account_id => {
                    return Err(TransactionValidationError::TransferToSameAccount)
                }
                _ => {}
            }
        }

        if self.date_time.is_none() && self.due_date.is_none() {
            return Err(TransactionValidationError::MissingDate);
        }

        Ok(())
    }

    /// Generate an import ID for duplicate detection
    ///
    /// A SHA-256 digest over a canonical rendering of the identifying fields,
    /// so ids stored in older data keep matching.
    pub fn generate_import_id(&self) -> String {
        use sha2::{Digest, Sha256};

        let date = self
            .effective_date()
            .map(|d| d.format("%Y-%m-%dT%H:%M:%S").to_string())
            .unwrap_or_default();
        let to_account = self
            .to_account_id
            .map(|id| id.as_uuid().to_string())
            .unwrap_or_default();
        let canonical = [
            self.transaction_type.to_string(),
            date,
            self.amount.cents().to_string(),
            self.account_id.as_uuid().to_string(),
            to_account,
            self.title.clone().unwrap_or_default(),
        ]
        .join("\u{1f}");

        let digest = Sha256::digest(canonical.as_bytes());
        format!("imp-{}", hex::encode(&digest[..16]))
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self
            .effective_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        write!(
            f,
            "{} {} {} {}",
            date,
            self.transaction_type,
            self.title.as_deref().unwrap_or(""),
            self.amount
        )
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    NonPositiveAmount(Money),
    MissingTransferAccount,
    TransferToSameAccount,
    MissingDate,
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount(amount) => {
                write!(f, "Amount must be greater than zero, got {}", amount)
            }
            Self::MissingTransferAccount => {
                write!(f, "Transfer requires a destination account")
            }
            Self::TransferToSameAccount => {
                write!(f, "Cannot transfer to the same account")
            }
            Self::MissingDate => write!(f, "Transaction needs a date or a due date"),
        }
    }
}

impl std::error::Error for TransactionValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_new_transaction() {
        let account_id = AccountId::new();
        let txn = Transaction::new(
            TransactionType::Expense,
            account_id,
            Money::from_cents(5000),
            at(2025, 1, 15),
        );
        assert_eq!(txn.account_id, account_id);
        assert!(txn.is_expense());
        assert!(!txn.is_planned());
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_planned_and_overdue() {
        let txn = Transaction::planned(
            TransactionType::Expense,
            AccountId::new(),
            Money::from_cents(1000),
            at(2025, 1, 15),
        );
        assert!(txn.is_planned());
        assert!(txn.is_overdue(at(2025, 1, 16)));
        assert!(!txn.is_overdue(at(2025, 1, 14)));
    }

    #[test]
    fn test_pay_clears_due_date() {
        let mut txn = Transaction::planned(
            TransactionType::Expense,
            AccountId::new(),
            Money::from_cents(1000),
            at(2025, 1, 15),
        );
        txn.is_synced = true;
        txn.pay(at(2025, 1, 10));
        assert!(!txn.is_planned());
        assert_eq!(txn.date_time, Some(at(2025, 1, 10)));
        assert!(txn.due_date.is_none());
        assert!(!txn.is_synced);
    }

    #[test]
    fn test_balance_effect() {
        let a = AccountId::new();
        let b = AccountId::new();

        let income = Transaction::new(TransactionType::Income, a, Money::from_cents(1000), at(2025, 1, 1));
        assert_eq!(income.balance_effect(a).cents(), 1000);
        assert_eq!(income.balance_effect(b).cents(), 0);

        let transfer = Transaction::transfer(
            a,
            b,
            Money::from_cents(1000),
            Money::from_cents(1956),
            at(2025, 1, 1),
        );
        assert_eq!(transfer.balance_effect(a).cents(), -1000);
        assert_eq!(transfer.balance_effect(b).cents(), 1956);
        assert!(transfer.involves_account(b));
    }

    #[test]
    fn test_smart_category_ignores_transfers() {
        let a = AccountId::new();
        let mut txn = Transaction::transfer(
            a,
            AccountId::new(),
            Money::from_cents(100),
            Money::from_cents(100),
            at(2025, 1, 1),
        );
        txn.category_id = Some(CategoryId::new());
        assert!(txn.smart_category_id().is_none());

        txn.transaction_type = TransactionType::Expense;
        assert!(txn.smart_category_id().is_some());
    }

    #[test]
    fn test_validation() {
        let a = AccountId::new();
        let zero = Transaction::new(TransactionType::Expense, a, Money::zero(), at(2025, 1, 1));
        assert!(matches!(
            zero.validate(),
            Err(TransactionValidationError::NonPositiveAmount(_))
        ));

        let mut transfer = Transaction::new(
            TransactionType::Transfer,
            a,
            Money::from_cents(100),
            at(2025, 1, 1),
        );
        assert_eq!(
            transfer.validate(),
            Err(TransactionValidationError::MissingTransferAccount)
        );

        transfer.to_account_id = Some(a);
        assert_eq!(
            transfer.validate(),
            Err(TransactionValidationError::TransferToSameAccount)
        );
    }

    #[test]
    fn test_import_id_generation() {
        let mut txn = Transaction::new(
            TransactionType::Expense,
            AccountId::new(),
            Money::from_cents(5000),
            at(2025, 1, 15),
        );
        txn.title = Some("Test Store".to_string());

        let import_id = txn.generate_import_id();
        assert!(import_id.starts_with("imp-"));
        assert_eq!(import_id, txn.generate_import_id());

        txn.title = Some("Other Store".to_string());
        assert_ne!(import_id, txn.generate_import_id());
    }

    #[test]
    fn test_import_id_is_stable() {
        let account = AccountId::from_uuid(
            uuid::Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap(),
        );
        let mut txn = Transaction::new(
            TransactionType::Expense,
            account,
            Money::from_cents(5000),
            at(2025, 1, 15),
        );
        txn.title = Some("Test Store".to_string());

        assert_eq!(txn.generate_import_id(), "imp-3271cd4fc54db44210742f16420c751e");
    }

    #[test]
    fn test_serialization() {
        let txn = Transaction::new(
            TransactionType::Income,
            AccountId::new(),
            Money::from_cents(5000),
            at(2025, 1, 15),
        );
        let json = serde_json::to_string(&txn).unwrap();
        assert!(json.contains("\"type\":\"income\""));
        let deserialized: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(txn.id, deserialized.id);
        assert_eq!(txn.date_time, deserialized.date_time);
    }
}
