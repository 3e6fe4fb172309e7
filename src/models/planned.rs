//! Planned payment rules
//!
//! A rule describes a future payment, either once or on a repeating
//! interval. Rules materialize as planned transactions that the user later
//! pays or skips.

use chrono::{DateTime, Duration, Months, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, CategoryId, PlannedRuleId};
use super::money::Money;
use super::transaction::TransactionType;

/// Upper bound on generated occurrences per rule
pub const MAX_OCCURRENCES: usize = 72;

/// Unit of a repeat interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalType {
    Day,
    Week,
    Month,
    Year,
}

impl IntervalType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" | "days" | "d" => Some(Self::Day),
            "week" | "weeks" | "w" => Some(Self::Week),
            "month" | "months" | "m" => Some(Self::Month),
            "year" | "years" | "y" => Some(Self::Year),
            _ => None,
        }
    }

    /// Step `steps` units forward from `start`
    fn advance(&self, start: NaiveDateTime, steps: u32) -> Option<NaiveDateTime> {
        match self {
            Self::Day => start.checked_add_signed(Duration::days(i64::from(steps))),
            Self::Week => start.checked_add_signed(Duration::weeks(i64::from(steps))),
            Self::Month => start.checked_add_months(Months::new(steps)),
            Self::Year => start.checked_add_months(Months::new(steps.checked_mul(12)?)),
        }
    }
}

impl fmt::Display for IntervalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
            Self::Year => write!(f, "year"),
        }
    }
}

/// A rule that generates planned transactions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedPaymentRule {
    pub id: PlannedRuleId,

    /// First (or only) due date
    pub start_date: NaiveDateTime,

    #[serde(default)]
    pub one_time: bool,

    /// Repeat every `interval_n` units; ignored for one-time rules
    #[serde(default)]
    pub interval_n: Option<u32>,

    #[serde(default)]
    pub interval_type: Option<IntervalType>,

    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    pub amount: Money,

    pub account_id: AccountId,

    #[serde(default)]
    pub category_id: Option<CategoryId>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Due dates already paid or skipped; regeneration leaves them out
    #[serde(default)]
    pub settled_dates: Vec<NaiveDateTime>,

    #[serde(default)]
    pub is_synced: bool,

    #[serde(default)]
    pub is_deleted: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl PlannedPaymentRule {
    /// Create a one-time rule
    pub fn one_time(
        transaction_type: TransactionType,
        account_id: AccountId,
        amount: Money,
        due: NaiveDateTime,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PlannedRuleId::new(),
            start_date: due,
            one_time: true,
            interval_n: None,
            interval_type: None,
            transaction_type,
            amount,
            account_id,
            category_id: None,
            title: None,
            description: None,
            settled_dates: Vec::new(),
            is_synced: false,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a repeating rule
    pub fn recurring(
        transaction_type: TransactionType,
        account_id: AccountId,
        amount: Money,
        start: NaiveDateTime,
        interval_n: u32,
        interval_type: IntervalType,
    ) -> Self {
        let mut rule = Self::one_time(transaction_type, account_id, amount, start);
        rule.one_time = false;
        rule.interval_n = Some(interval_n);
        rule.interval_type = Some(interval_type);
        rule
    }

    /// Due dates this rule produces
    ///
    /// One-time rules yield the start date. Recurring rules yield dates from
    /// the start date up to one year later, capped at `MAX_OCCURRENCES`.
    pub fn occurrences(&self) -> Vec<NaiveDateTime> {
        if self.one_time {
            return vec![self.start_date];
        }

        let (Some(n), Some(unit)) = (self.interval_n, self.interval_type) else {
            return vec![self.start_date];
        };
        let Some(horizon) = self.start_date.checked_add_months(Months::new(12)) else {
            return vec![self.start_date];
        };

        let mut dates = Vec::new();
        let mut k: u32 = 0;
        while dates.len() < MAX_OCCURRENCES {
            // Step from the start each time so month-end dates do not drift
            let Some(date) = k.checked_mul(n).and_then(|steps| unit.advance(self.start_date, steps))
            else {
                break;
            };
            if date > horizon {
                break;
            }
            dates.push(date);
            k += 1;
        }
        dates
    }

    /// Due dates still to be materialized as planned transactions
    pub fn unsettled_occurrences(&self) -> Vec<NaiveDateTime> {
        self.occurrences()
            .into_iter()
            .filter(|date| !self.settled_dates.contains(date))
            .collect()
    }

    /// Remember that the occurrence due on `due` was paid or skipped
    pub fn settle(&mut self, due: NaiveDateTime) -> bool {
        if self.settled_dates.contains(&due) {
            return false;
        }
        self.settled_dates.push(due);
        self.settled_dates.sort();
        self.touch();
        true
    }

    pub fn touch(&mut self) {
        self.is_synced = false;
        self.updated_at = Utc::now();
    }

    pub fn mark_deleted(&mut self) {
        self.is_deleted = true;
        self.touch();
    }

    /// Validate the rule
    pub fn validate(&self) -> Result<(), PlannedRuleValidationError> {
        if !self.amount.is_positive() {
            return Err(PlannedRuleValidationError::NonPositiveAmount);
        }
        if self.transaction_type == TransactionType::Transfer {
            return Err(PlannedRuleValidationError::TransferNotSupported);
        }
        if !self.one_time {
            match (self.interval_n, self.interval_type) {
                (Some(n), Some(_)) if n > 0 => {}
                _ => return Err(PlannedRuleValidationError::MissingInterval),
            }
        }
        Ok(())
    }

    /// Human readable schedule, e.g. "every 2 weeks"
    pub fn schedule(&self) -> String {
        match (self.one_time, self.interval_n, self.interval_type) {
            (false, Some(1), Some(unit)) => format!("every {}", unit),
            (false, Some(n), Some(unit)) => format!("every {} {}s", n, unit),
            _ => "once".to_string(),
        }
    }
}

impl fmt::Display for PlannedPaymentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.title.as_deref().unwrap_or("Planned payment"),
            self.amount,
            self.schedule()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedRuleValidationError {
    NonPositiveAmount,
    TransferNotSupported,
    MissingInterval,
}

impl fmt::Display for PlannedRuleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount => write!(f, "Planned amount must be greater than zero"),
            Self::TransferNotSupported => {
                write!(f, "Planned payments must be income or expense")
            }
            Self::MissingInterval => {
                write!(f, "Recurring planned payments need an interval of at least 1")
            }
        }
    }
}

impl std::error::Error for PlannedRuleValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_one_time_single_occurrence() {
        let rule = PlannedPaymentRule::one_time(
            TransactionType::Expense,
            AccountId::new(),
            Money::from_cents(1000),
            at(2025, 3, 1),
        );
        assert_eq!(rule.occurrences(), vec![at(2025, 3, 1)]);
    }

    #[test]
    fn test_monthly_occurrences_cover_a_year() {
        let rule = PlannedPaymentRule::recurring(
            TransactionType::Expense,
            AccountId::new(),
            Money::from_cents(1000),
            at(2025, 1, 31),
            1,
            IntervalType::Month,
        );
        let dates = rule.occurrences();
        assert_eq!(dates.len(), 13);
        assert_eq!(dates[1], at(2025, 2, 28));
        assert_eq!(dates[2], at(2025, 3, 31));
        assert_eq!(dates[12], at(2026, 1, 31));
    }

    #[test]
    fn test_daily_occurrences_capped() {
        let rule = PlannedPaymentRule::recurring(
            TransactionType::Expense,
            AccountId::new(),
            Money::from_cents(100),
            at(2025, 1, 1),
            1,
            IntervalType::Day,
        );
        assert_eq!(rule.occurrences().len(), MAX_OCCURRENCES);
    }

    #[test]
    fn test_validation() {
        let mut rule = PlannedPaymentRule::recurring(
            TransactionType::Income,
            AccountId::new(),
            Money::from_cents(100),
            at(2025, 1, 1),
            0,
            IntervalType::Week,
        );
        assert_eq!(
            rule.validate(),
            Err(PlannedRuleValidationError::MissingInterval)
        );
        rule.interval_n = Some(2);
        assert!(rule.validate().is_ok());
        assert_eq!(rule.schedule(), "every 2 weeks");
    }
}
