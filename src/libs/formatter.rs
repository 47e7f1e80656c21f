//! Hours formatting and parsing helpers.
//!
//! Durations are stored as whole seconds everywhere. Conversion to hours
//! happens only when a value is rendered (two decimals, `seconds / 3600`) or
//! written to the denormalized `totalhours` ticket field.
//!
//! ```rust
//! use tickethours::libs::formatter::{format_hours, format_hours_minutes, parse_hours_minutes};
//!
//! assert_eq!(format_hours(5400), "1.50");
//! assert_eq!(format_hours_minutes(5400), "1:30");
//! assert_eq!(parse_hours_minutes("2:15").unwrap(), 8100);
//! ```

use crate::libs::error::{HoursError, Result};
use crate::libs::messages::Message;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// Date format used in report titles and CSV metadata.
pub const DATE_FORMAT: &str = "%B %d, %Y";

/// Date format accepted on input and used in query links.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

static HOURS_MINUTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([0-9]+):([0-5][0-9])\s*$").unwrap());

/// Hours with two decimals, e.g. `"1.50"`, `"0.00"`.
pub fn format_hours(seconds: i64) -> String {
    format!("{:.2}", seconds as f64 / 3600.0)
}

/// `H:MM`, e.g. `"1:05"`; minutes are truncated.
pub fn format_hours_minutes(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 3600, (seconds % 3600) / 60)
}

/// Zero-padded `HH:MM`, as shown on the per-ticket hours page.
pub fn format_hours_minutes_padded(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{:02}:{:02}", seconds / 3600, (seconds % 3600) / 60)
}

/// Parses an `H:MM` form value into seconds.
pub fn parse_hours_minutes(value: &str) -> Result<i64> {
    let caps = HOURS_MINUTES
        .captures(value)
        .ok_or_else(|| HoursError::validation(Message::InvalidHours))?;
    let hours: i64 = caps[1].parse().map_err(|_| HoursError::validation(Message::InvalidHours))?;
    let minutes: i64 = caps[2].parse().map_err(|_| HoursError::validation(Message::InvalidHours))?;
    hours
        .checked_mul(3600)
        .and_then(|seconds| seconds.checked_add(minutes * 60))
        .ok_or_else(|| HoursError::validation(Message::InvalidHours))
}

/// Parses a decimal hours value (estimated hours) into seconds.
pub fn parse_decimal_hours(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return Some(0.0);
    }
    value.parse::<f64>().ok().filter(|h| h.is_finite())
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), ISO_DATE_FORMAT).map_err(|_| HoursError::validation(Message::InvalidDate(value.to_string())))
}

/// Local midnight at the start of `date`, as a UTC instant.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// The last second of `date` in local time, as a UTC instant.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + chrono::Duration::hours(23) + chrono::Duration::minutes(59) + chrono::Duration::seconds(59)
}

/// Formats a stored instant as a local calendar date.
pub fn format_date(time: &DateTime<Utc>, format: &str) -> String {
    time.with_timezone(&Local).format(format).to_string()
}

pub fn local_date(time: &DateTime<Utc>) -> NaiveDate {
    time.with_timezone(&Local).date_naive()
}

pub fn from_timestamp(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or_default()
}
