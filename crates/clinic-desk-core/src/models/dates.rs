//! Timestamp helpers shared by the record types.
//!
//! Records keep their dates as the strings the UI wrote: full RFC 3339
//! timestamps for `created_at`/`updated_at`/invoice `date`, and bare
//! `YYYY-MM-DD` calendar dates for appointments.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Current time in the store's timestamp format (`2025-01-15T10:30:00.000Z`).
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

/// Format an instant in the store's timestamp format.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored date or timestamp.
///
/// Accepts RFC 3339 and bare calendar dates (read as midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Epoch milliseconds of a stored date, or 0 when it does not parse.
pub fn epoch_millis(value: &str) -> i64 {
    parse_timestamp(value)
        .map(|at| at.timestamp_millis())
        .unwrap_or(0)
}
