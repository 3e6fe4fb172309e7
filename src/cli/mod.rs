//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod account;
pub mod budget;
pub mod category;
pub mod export;
pub mod import;
pub mod overview;
pub mod planned;
pub mod rate;
pub mod settings;
pub mod sync;
pub mod transaction;

pub use account::{handle_account_command, AccountCommands};
pub use budget::{handle_budget_command, BudgetCommands};
pub use category::{handle_category_command, CategoryCommands};
pub use export::{handle_export_command, ExportFormat};
pub use import::{handle_import_command, print_import_formats};
pub use overview::{handle_balance_command, handle_stats_command, StatsCommands};
pub use planned::{handle_planned_command, PlannedCommands};
pub use rate::{handle_rate_command, RateCommands};
pub use settings::{handle_premium_command, handle_settings_command, PremiumCommands, SettingsCommands};
pub use sync::{handle_sync_command, SyncCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{WalletError, WalletResult};
use crate::models::{DateRange, Money, TimePeriod};
use crate::storage::Storage;

/// Parse a positive amount such as "12.50" or "1,200"
pub(crate) fn parse_amount(input: &str) -> WalletResult<Money> {
    Money::parse(input).map_err(|e| {
        WalletError::Validation(format!(
            "Invalid amount '{}'. Use a format like '12.50'. Error: {}",
            input, e
        ))
    })
}

/// Parse "today", "yesterday", "tomorrow", "YYYY-MM-DD" or "YYYY-MM-DD HH:MM"
///
/// Dates without a time take the current time of day.
pub(crate) fn parse_date_time(input: &str) -> WalletResult<NaiveDateTime> {
    let now = Utc::now().naive_utc();
    let trimmed = input.trim();
    let day = match trimmed.to_lowercase().as_str() {
        "today" | "now" => Some(now.date()),
        "yesterday" => Some(now.date() - Duration::days(1)),
        "tomorrow" => Some(now.date() + Duration::days(1)),
        _ => None,
    };
    if let Some(day) = day {
        return Ok(day.and_time(now.time()));
    }

    for format in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(at);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(|d| d.and_time(now.time()))
        .map_err(|_| {
            WalletError::Validation(format!(
                "Invalid date '{}'. Use YYYY-MM-DD, 'YYYY-MM-DD HH:MM', today, yesterday or tomorrow",
                input
            ))
        })
}

/// Parse "#RRGGBB" (or "RRGGBB") into an opaque 0xAARRGGBB color
pub(crate) fn parse_color(input: &str) -> WalletResult<u32> {
    let hex = input.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return Err(WalletError::Validation(format!(
            "Invalid color '{}'. Use #RRGGBB",
            input
        )));
    }
    u32::from_str_radix(hex, 16)
        .map(|rgb| 0xFF00_0000 | rgb)
        .map_err(|_| WalletError::Validation(format!("Invalid color '{}'. Use #RRGGBB", input)))
}

/// Resolve a period argument ("2025-03", "all", "2025-01-01..2025-03-31")
///
/// Without an argument this is the current budgeting month, which starts on
/// the configured day of month.
pub(crate) fn resolve_range(storage: &Storage, period: Option<&str>) -> WalletResult<DateRange> {
    let start_day = storage.settings.get()?.start_date_of_month;
    let period = match period {
        Some(text) => {
            TimePeriod::parse(text).map_err(|e| WalletError::Validation(e.to_string()))?
        }
        None => TimePeriod::current_month(Utc::now().date_naive(), start_day),
    };
    period
        .range(start_day)
        .map_err(|e| WalletError::Validation(e.to_string()))
}

pub(crate) fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Midnight at the start of a date
pub(crate) fn start_of(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::create_test_storage;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12.5").unwrap().cents(), 1_250);
        assert!(parse_amount("twelve").unwrap_err().is_validation());
    }

    #[test]
    fn test_parse_date_time() {
        let at = parse_date_time("2025-03-05 14:30").unwrap();
        assert_eq!(at.to_string(), "2025-03-05 14:30:00");
        assert_eq!(
            parse_date_time("2025-03-05").unwrap().date(),
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()
        );
        assert_eq!(
            parse_date_time("tomorrow").unwrap().date(),
            now().date() + Duration::days(1)
        );
        assert!(parse_date_time("05/03/2025").is_err());
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#12B880").unwrap(), 0xFF12_B880);
        assert_eq!(parse_color("ff0000").unwrap(), 0xFFFF_0000);
        assert!(parse_color("#12B8").is_err());
        assert!(parse_color("#GGGGGG").is_err());
    }

    #[test]
    fn test_resolve_range() {
        let (_temp, storage) = create_test_storage();
        let march = resolve_range(&storage, Some("2025-03")).unwrap();
        assert_eq!(march.from, Some(start_of(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap())));
        assert_eq!(march.to, Some(start_of(NaiveDate::from_ymd_opt(2025, 4, 1).unwrap())));

        assert_eq!(resolve_range(&storage, Some("all")).unwrap(), DateRange::all_time());
        assert!(resolve_range(&storage, Some("March")).is_err());

        let current = resolve_range(&storage, None).unwrap();
        assert!(current.contains(now()));
    }
}
