//! Shared formatting helpers for money and dates

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};

use crate::models::Money;

/// "1,234.50 USD"
pub fn format_money(amount: Money, currency: &str) -> String {
    format!("{} {}", amount.format_grouped(), currency)
}

/// Like `format_money` with an explicit "+" on positive amounts
pub fn format_signed(amount: Money, currency: &str) -> String {
    if amount.is_positive() {
        format!("+{}", format_money(amount, currency))
    } else {
        format_money(amount, currency)
    }
}

/// "Today", "Yesterday" or "Tomorrow" relative to `today`
pub fn close_day(date: NaiveDate, today: NaiveDate) -> Option<&'static str> {
    if date == today {
        Some("Today")
    } else if Some(date) == today.pred_opt() {
        Some("Yesterday")
    } else if Some(date) == today.succ_opt() {
        Some("Tomorrow")
    } else {
        None
    }
}

/// "Today, 05 Mar" near `today`, else "Wed, 05 Mar"
///
/// Dates outside the current year carry the year: "Wed, 05 Mar 2024".
pub fn format_relative_date(date: NaiveDate, today: NaiveDate) -> String {
    use chrono::Datelike;

    if let Some(label) = close_day(date, today) {
        return format!("{}, {}", label, date.format("%d %b"));
    }
    if date.year() == today.year() {
        date.format("%a, %d %b").to_string()
    } else {
        date.format("%a, %d %b %Y").to_string()
    }
}

/// Relative date against the current UTC day
pub fn format_nicely(at: NaiveDateTime) -> String {
    format_relative_date(at.date(), Utc::now().date_naive())
}

/// `format_nicely` followed by the time of day: "Today, 05 Mar at 14:30"
pub fn format_nicely_with_time(at: NaiveDateTime) -> String {
    format!("{} at {}", format_nicely(at), at.format("%H:%M"))
}

/// Time remaining until `target` as "2d 3h 5m"; "Expired" once it has passed
pub fn time_left(target: NaiveDateTime, from: NaiveDateTime) -> String {
    let left = target - from;
    if left <= Duration::zero() {
        return "Expired".to_string();
    }

    let days = left.num_days();
    let hours = (left - Duration::days(days)).num_hours();
    let minutes = (left - Duration::days(days) - Duration::hours(hours)).num_minutes();

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (minutes, "m")]
        .iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{}{}", value, unit))
        .collect();

    if parts.is_empty() {
        "<1m".to_string()
    } else {
        parts.join(" ")
    }
}

/// Cut `text` to `width` characters, marking the cut with "…"
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", kept)
    }
}

/// Color as "#RRGGBB", dropping the alpha channel
pub fn format_color(color: u32) -> String {
    format!("#{:06X}", color & 0x00FF_FFFF)
}
