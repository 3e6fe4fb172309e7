//! Time period representation
//!
//! Supports calendar-ish months that begin on a configurable day, the whole
//! history, and custom date ranges. Periods resolve to half-open
//! `[from, to)` ranges of UTC date-times.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open range of date-times; `None` bounds are unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

impl DateRange {
    pub fn new(from: NaiveDateTime, to: NaiveDateTime) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn all_time() -> Self {
        Self::default()
    }

    /// Check if a date-time falls within this range
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.from.map(|from| at >= from).unwrap_or(true) && self.to.map(|to| at < to).unwrap_or(true)
    }
}

/// Represents a reporting period
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum TimePeriod {
    /// A month (e.g., "2025-01"), shifted by the start day of month
    Month { year: i32, month: u32 },

    /// Everything ever recorded
    AllTime,

    /// Custom inclusive date range
    Custom { from: NaiveDate, to: NaiveDate },
}

impl TimePeriod {
    /// Create a month period
    pub fn month(year: i32, month: u32) -> Self {
        Self::Month { year, month }
    }

    /// Create a custom period
    pub fn custom(from: NaiveDate, to: NaiveDate) -> Self {
        Self::Custom { from, to }
    }

    /// The month period containing `today` given the start day of month
    pub fn current_month(today: NaiveDate, start_day: u32) -> Self {
        let this_month = Self::month(today.year(), today.month());
        let started = month_start(today.year(), today.month(), start_day)
            .map_or(true, |start| today >= start);
        if started {
            this_month
        } else {
            this_month.prev()
        }
    }

    /// Resolve this period to a date-time range
    ///
    /// Fails for periods at the edge of the representable calendar.
    pub fn range(&self, start_day: u32) -> Result<DateRange, PeriodParseError> {
        let out_of_range = || PeriodParseError::OutOfRange(self.to_string());
        match self {
            Self::Month { year, month } => {
                let (next_year, next_month) = if *month == 12 {
                    (year.checked_add(1).ok_or_else(out_of_range)?, 1)
                } else {
                    (*year, *month + 1)
                };
                let from = month_start(*year, *month, start_day).ok_or_else(out_of_range)?;
                let to = month_start(next_year, next_month, start_day).ok_or_else(out_of_range)?;
                Ok(DateRange::new(from.and_time(NaiveTime::MIN), to.and_time(NaiveTime::MIN)))
            }
            Self::AllTime => Ok(DateRange::all_time()),
            Self::Custom { from, to } => {
                let end = to.succ_opt().ok_or_else(out_of_range)?;
                Ok(DateRange::new(from.and_time(NaiveTime::MIN), end.and_time(NaiveTime::MIN)))
            }
        }
    }

    /// Get the next period
    pub fn next(&self) -> Self {
        match self {
            Self::Month { year, month } => {
                if *month == 12 {
                    Self::Month {
                        year: *year + 1,
                        month: 1,
                    }
                } else {
                    Self::Month {
                        year: *year,
                        month: *month + 1,
                    }
                }
            }
            Self::AllTime => Self::AllTime,
            Self::Custom { from, to } => {
                let duration = *to - *from + Duration::days(1);
                match (from.checked_add_signed(duration), to.checked_add_signed(duration)) {
                    (Some(from), Some(to)) => Self::Custom { from, to },
                    _ => self.clone(),
                }
            }
        }
    }

    /// Get the previous period
    pub fn prev(&self) -> Self {
        match self {
            Self::Month { year, month } => {
                if *month == 1 {
                    Self::Month {
                        year: *year - 1,
                        month: 12,
                    }
                } else {
                    Self::Month {
                        year: *year,
                        month: *month - 1,
                    }
                }
            }
            Self::AllTime => Self::AllTime,
            Self::Custom { from, to } => {
                let duration = *to - *from + Duration::days(1);
                match (from.checked_sub_signed(duration), to.checked_sub_signed(duration)) {
                    (Some(from), Some(to)) => Self::Custom { from, to },
                    _ => self.clone(),
                }
            }
        }
    }

    /// Parse a period string
    ///
    /// Formats:
    /// - Month: "2025-01"
    /// - All time: "all"
    /// - Custom: "2025-01-01..2025-01-15"
    pub fn parse(s: &str) -> Result<Self, PeriodParseError> {
        let s = s.trim();

        if s.eq_ignore_ascii_case("all") || s.eq_ignore_ascii_case("all-time") {
            return Ok(Self::AllTime);
        }

        if let Some((from, to)) = s.split_once("..") {
            let from = NaiveDate::parse_from_str(from, "%Y-%m-%d")
                .map_err(|_| PeriodParseError::InvalidFormat(s.to_string()))?;
            let to = NaiveDate::parse_from_str(to, "%Y-%m-%d")
                .map_err(|_| PeriodParseError::InvalidFormat(s.to_string()))?;
            if to < from {
                return Err(PeriodParseError::InvertedRange(s.to_string()));
            }
            return Ok(Self::Custom { from, to });
        }

        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() == 2 {
            let year: i32 = parts[0]
                .parse()
                .map_err(|_| PeriodParseError::InvalidFormat(s.to_string()))?;
            let month: u32 = parts[1]
                .parse()
                .map_err(|_| PeriodParseError::InvalidFormat(s.to_string()))?;

            if !(1..=12).contains(&month) {
                return Err(PeriodParseError::InvalidMonth(month));
            }
            if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
                return Err(PeriodParseError::OutOfRange(s.to_string()));
            }

            return Ok(Self::Month { year, month });
        }

        Err(PeriodParseError::InvalidFormat(s.to_string()))
    }
}

/// The start date of a month whose first day is `start_day`, clamped to the
/// month's length; `None` outside the supported calendar
pub fn month_start(year: i32, month: u32, start_day: u32) -> Option<NaiveDate> {
    let day = start_day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Number of days in a month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        year.checked_add(1).and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            Self::AllTime => write!(f, "All time"),
            Self::Custom { from, to } => {
                write!(f, "{}..{}", from.format("%Y-%m-%d"), to.format("%Y-%m-%d"))
            }
        }
    }
}

/// Error type for period parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodParseError {
    InvalidFormat(String),
    InvalidMonth(u32),
    InvertedRange(String),
    OutOfRange(String),
}

impl fmt::Display for PeriodParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodParseError::InvalidFormat(s) => write!(f, "Invalid period format: {}", s),
            PeriodParseError::InvalidMonth(m) => write!(f, "Invalid month: {}", m),
            PeriodParseError::InvertedRange(s) => {
                write!(f, "Period end is before its start: {}", s)
            }
            PeriodParseError::OutOfRange(s) => {
                write!(f, "Period is outside the supported calendar: {}", s)
            }
        }
    }
}

impl std::error::Error for PeriodParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        date(y, m, d).and_time(NaiveTime::MIN)
    }

    #[test]
    fn test_month_range_default_start() {
        let range = TimePeriod::month(2025, 1).range(1).unwrap();
        assert_eq!(range.from, Some(midnight(2025, 1, 1)));
        assert_eq!(range.to, Some(midnight(2025, 2, 1)));
    }

    #[test]
    fn test_month_range_custom_start_day() {
        let range = TimePeriod::month(2025, 3).range(25).unwrap();
        assert_eq!(range.from, Some(midnight(2025, 3, 25)));
        assert_eq!(range.to, Some(midnight(2025, 4, 25)));
    }

    #[test]
    fn test_month_range_clamps_short_months() {
        let range = TimePeriod::month(2025, 1).range(31).unwrap();
        assert_eq!(range.from, Some(midnight(2025, 1, 31)));
        assert_eq!(range.to, Some(midnight(2025, 2, 28)));

        let leap = TimePeriod::month(2024, 2).range(30).unwrap();
        assert_eq!(leap.from, Some(midnight(2024, 2, 29)));
        assert_eq!(leap.to, Some(midnight(2024, 3, 30)));
    }

    #[test]
    fn test_current_month_respects_start_day() {
        assert_eq!(
            TimePeriod::current_month(date(2025, 3, 10), 25),
            TimePeriod::month(2025, 2)
        );
        assert_eq!(
            TimePeriod::current_month(date(2025, 3, 26), 25),
            TimePeriod::month(2025, 3)
        );
        assert_eq!(
            TimePeriod::current_month(date(2025, 1, 5), 10),
            TimePeriod::month(2024, 12)
        );
    }

    #[test]
    fn test_navigation() {
        assert_eq!(TimePeriod::month(2024, 12).next(), TimePeriod::month(2025, 1));
        assert_eq!(TimePeriod::month(2025, 1).prev(), TimePeriod::month(2024, 12));
        assert_eq!(TimePeriod::AllTime.next(), TimePeriod::AllTime);

        let custom = TimePeriod::custom(date(2025, 1, 1), date(2025, 1, 10));
        assert_eq!(
            custom.next(),
            TimePeriod::custom(date(2025, 1, 11), date(2025, 1, 20))
        );
    }

    #[test]
    fn test_range_contains() {
        let range = TimePeriod::custom(date(2025, 1, 1), date(2025, 1, 31)).range(1).unwrap();
        assert!(range.contains(midnight(2025, 1, 31) + Duration::hours(23)));
        assert!(!range.contains(midnight(2025, 2, 1)));
        assert!(DateRange::all_time().contains(midnight(1990, 1, 1)));
    }

    #[test]
    fn test_parse() {
        assert_eq!(TimePeriod::parse("2025-01").unwrap(), TimePeriod::month(2025, 1));
        assert_eq!(TimePeriod::parse("all").unwrap(), TimePeriod::AllTime);
        assert_eq!(
            TimePeriod::parse("2025-01-01..2025-01-15").unwrap(),
            TimePeriod::custom(date(2025, 1, 1), date(2025, 1, 15))
        );
        assert!(matches!(
            TimePeriod::parse("2025-13"),
            Err(PeriodParseError::InvalidMonth(13))
        ));
        assert!(TimePeriod::parse("2025-02-01..2025-01-01").is_err());
        assert!(TimePeriod::parse("soon").is_err());
        assert!(matches!(
            TimePeriod::parse("300000-01"),
            Err(PeriodParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_range_at_calendar_edge() {
        let last_day = TimePeriod::custom(NaiveDate::MAX, NaiveDate::MAX);
        assert!(matches!(last_day.range(1), Err(PeriodParseError::OutOfRange(_))));
        assert_eq!(last_day.next(), last_day);

        let max_month = TimePeriod::month(NaiveDate::MAX.year(), NaiveDate::MAX.month());
        assert!(max_month.range(1).is_err());
        assert_eq!(month_start(i32::MAX, 1, 1), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(TimePeriod::month(2025, 1).to_string(), "2025-01");
        assert_eq!(TimePeriod::AllTime.to_string(), "All time");
    }
}
