//! `MM/DD/YYYY` date handling for schema fields.

use chrono::NaiveDate;
use serde_json::Value;

/// chrono format string for schema dates.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Human-readable form of [`DATE_FORMAT`], used in prompts and errors.
pub const DATE_FORMAT_LABEL: &str = "MM/DD/YYYY";

/// Parse a `MM/DD/YYYY` date.
///
/// Month and day take one or two digits, the year exactly four. chrono alone
/// would also take short years, signs and padding.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    if !has_date_shape(text) {
        return None;
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
}

fn has_date_shape(text: &str) -> bool {
    let digits = |part: &str, len: std::ops::RangeInclusive<usize>| {
        len.contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
    };

    let mut parts = text.split('/');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(month), Some(day), Some(year), None) => {
            digits(month, 1..=2) && digits(day, 1..=2) && digits(year, 4..=4)
        }
        _ => false,
    }
}

/// Whether a value stands for "date not visible".
///
/// Models sometimes spell null as the string `"None"`.
pub fn is_unknown(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s == "None",
        _ => false,
    }
}

/// Error message for a value that is not a `MM/DD/YYYY` date.
pub fn format_error(value: &Value) -> String {
    let shown = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    format!("Date '{shown}' must be in {DATE_FORMAT_LABEL} format")
}
