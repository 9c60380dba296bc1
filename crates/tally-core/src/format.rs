//! Human-readable formatting for dates and amounts

use chrono::{Datelike, NaiveDate};

/// Format a date range the way people say it
///
/// - same month: `05 to 20 of January 2024`
/// - same year: `05 January to 20 March 2024`
/// - otherwise: `05 December 2023 to 20 January 2024`
pub fn format_date_range(first: NaiveDate, last: NaiveDate) -> String {
    if first.year() == last.year() {
        if first.month() == last.month() {
            return format!(
                "{} to {} of {}",
                first.format("%d"),
                last.format("%d"),
                last.format("%B %Y")
            );
        }
        return format!("{} to {}", first.format("%d %B"), last.format("%d %B %Y"));
    }
    format!("{} to {}", first.format("%d %B %Y"), last.format("%d %B %Y"))
}

/// Two decimals with `,` thousands grouping, e.g. `-1,234.50`
pub fn format_money(amount: f64) -> String {
    let formatted = format!("{:.2}", amount.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // Avoid "-0.00"
    let sign = if amount < 0.0 && formatted != "0.00" {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, cents)
}
