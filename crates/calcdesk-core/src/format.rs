//! Display formatting for dates, times, numbers and text.
//!
//! Date inputs are the timestamps the calculator service returns (ISO 8601,
//! with or without an offset). Values without an offset are read as local
//! time, and everything is rendered in the local time zone.

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use thiserror::Error;

use crate::config::ClockStyle;

/// Naive timestamp layouts accepted in addition to RFC 3339.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Date-only layout, read as local midnight.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Decimal places kept when displaying a fractional result.
const NUMBER_PRECISION: usize = 6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Cannot capitalize an empty string")]
    Empty,
}

fn parse_in<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(tz));
    }

    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        // Skipped by a DST change: read it as the wall time an hour later
        LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
    }
}

fn render_date<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.format("%b %-d, %Y").to_string()
}

fn render_time<Tz: TimeZone>(dt: &DateTime<Tz>, style: ClockStyle) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match style {
        ClockStyle::TwelveHour => dt.format("%I:%M %p").to_string(),
        ClockStyle::TwentyFourHour => dt.format("%H:%M").to_string(),
    }
}

/// Format a timestamp as "Jan 5, 2024" in the given time zone.
/// Unparseable input is returned unchanged.
pub fn format_date_in<Tz: TimeZone>(value: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match parse_in(value, tz) {
        Some(dt) => render_date(&dt),
        None => value.to_string(),
    }
}

/// Format the hour and minute of a timestamp, zero-padded.
pub fn format_time_in<Tz: TimeZone>(value: &str, tz: &Tz, style: ClockStyle) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match parse_in(value, tz) {
        Some(dt) => render_time(&dt, style),
        None => value.to_string(),
    }
}

pub fn format_date_time_in<Tz: TimeZone>(value: &str, tz: &Tz, style: ClockStyle) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match parse_in(value, tz) {
        Some(dt) => format!("{} {}", render_date(&dt), render_time(&dt, style)),
        None => value.to_string(),
    }
}

/// Format a timestamp as a local date, e.g. "Jan 5, 2024".
pub fn format_date(value: &str) -> String {
    format_date_in(value, &Local)
}

/// Format a timestamp as a local time using the default clock style.
pub fn format_time(value: &str) -> String {
    format_time_with(value, ClockStyle::default())
}

pub fn format_time_with(value: &str, style: ClockStyle) -> String {
    format_time_in(value, &Local, style)
}

/// Date and time separated by a single space.
pub fn format_date_time(value: &str) -> String {
    format_date_time_with(value, ClockStyle::default())
}

pub fn format_date_time_with(value: &str, style: ClockStyle) -> String {
    format_date_time_in(value, &Local, style)
}

/// Upper-case the first character, leaving the rest untouched.
pub fn capitalize_first(s: &str) -> Result<String, FormatError> {
    let mut chars = s.chars();
    let first = chars.next().ok_or(FormatError::Empty)?;
    Ok(first.to_uppercase().chain(chars).collect())
}

/// Format a calculation result without a trailing `.0` or float noise.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let fixed = format!("{:.*}", NUMBER_PRECISION, value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
