//! Per-column validation and normalization of operator input.
//!
//! Every entry path (the entry form, cell edits, the command line) goes
//! through [`validate`], which turns raw text into the canonical text stored
//! in a [`LogEntry`](crate::qso::LogEntry). How out-of-range input is treated
//! is decided once by an [`InputPolicy`] and applied to every column alike.
//!
//! # Example
//!
//! ```
//! use qsolog::fields::{validate, InputPolicy};
//! use qsolog::qso::Column;
//!
//! let time = validate(Column::Time, "9:5", InputPolicy::Reject).unwrap();
//! assert_eq!(time, "09:05");
//!
//! assert!(validate(Column::Date, "2024-02-31", InputPolicy::Reject).is_err());
//! let date = validate(Column::Date, "2024-02-31", InputPolicy::Clamp).unwrap();
//! assert_eq!(date, "2024-02-29");
//! ```

mod patterns;

use chrono::{Datelike, NaiveDate};
use regex::Captures;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::qso::{Band, Column, Mode, QsoDirection};

pub use patterns::{column_pattern, grid_pattern, FieldPattern};

/// Longest call sign accepted.
pub const MAX_CALL_LEN: usize = 9;

/// Largest magnitude of a signal report.
const MAX_REPORT: i64 = 999;

/// Largest frequency in MHz.
const MAX_FREQ: f64 = 999_999.999_999;

/// Largest transmit power in watts.
const MAX_PWR: f64 = 9_999.999;

/// How invalid input is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputPolicy {
    /// Refuse the input with an error and keep the previous value.
    #[default]
    Reject,
    /// Clamp out-of-range values into range and fall back to zero values for
    /// unparsable text. Enumerated columns are still rejected.
    Clamp,
}

/// Validate raw input for a column and return its canonical text.
///
/// # Errors
///
/// Returns [`Error::InvalidField`] when the input cannot be accepted under
/// the given policy. The sequence column is never editable.
pub fn validate(column: Column, input: &str, policy: InputPolicy) -> Result<String> {
    match column {
        Column::Seq => Err(Error::invalid_field(
            column.name(),
            input,
            "sequence numbers are assigned automatically",
        )),
        Column::Time => validate_time(input, policy),
        Column::Date => validate_date(input, policy),
        Column::Call => validate_call(input, policy),
        Column::Mode => parse_choice::<Mode>(column, input).map(|m| m.as_str().to_string()),
        Column::Band => parse_choice::<Band>(column, input).map(|b| b.as_str().to_string()),
        Column::Qso => {
            parse_choice::<QsoDirection>(column, input).map(|q| q.as_str().to_string())
        }
        Column::Freq => validate_freq(input, policy),
        Column::Tx | Column::Rx => validate_report(column, input, policy),
        Column::Pwr => validate_pwr(input, policy),
    }
}

/// Validate a UTC time, producing `HH:MM`.
///
/// # Errors
///
/// Returns an error under [`InputPolicy::Reject`] when the text is not a
/// time or the hour or minute is out of range.
pub fn validate_time(input: &str, policy: InputPolicy) -> Result<String> {
    let text = input.trim();
    let Some(caps) = patterns::TIME.captures(text) else {
        return match policy {
            InputPolicy::Reject => Err(mismatch(Column::Time, text)),
            InputPolicy::Clamp => Ok("00:00".to_string()),
        };
    };

    let mut hour = group(&caps, "hour", Column::Time, text)?;
    let mut minute = group(&caps, "minute", Column::Time, text)?;
    match policy {
        InputPolicy::Reject => {
            if hour > 23 {
                return Err(Error::invalid_field("time", text, "hour must be 00-23"));
            }
            if minute > 59 {
                return Err(Error::invalid_field("time", text, "minute must be 00-59"));
            }
        }
        InputPolicy::Clamp => {
            hour = hour.min(23);
            minute = minute.min(59);
        }
    }
    Ok(format!("{hour:02}:{minute:02}"))
}

/// Validate a UTC date, producing `YYYY-MM-DD`.
///
/// The day is checked against the length of its month, leap years included.
///
/// # Errors
///
/// Returns an error under [`InputPolicy::Reject`] when the text is not a
/// date or the month or day is out of range.
pub fn validate_date(input: &str, policy: InputPolicy) -> Result<String> {
    let text = input.trim();
    let Some(caps) = patterns::DATE.captures(text) else {
        return match policy {
            InputPolicy::Reject => Err(mismatch(Column::Date, text)),
            InputPolicy::Clamp => Ok("0000-01-01".to_string()),
        };
    };

    let year = group(&caps, "year", Column::Date, text)?;
    let mut month = group(&caps, "month", Column::Date, text)?;
    let mut day = group(&caps, "day", Column::Date, text)?;
    let year = i32::try_from(year).map_err(|_| mismatch(Column::Date, text))?;

    match policy {
        InputPolicy::Reject => {
            if !(1..=12).contains(&month) {
                return Err(Error::invalid_field("date", text, "month must be 01-12"));
            }
            let max_day = days_in_month(year, month);
            if !(1..=max_day).contains(&day) {
                return Err(Error::invalid_field(
                    "date",
                    text,
                    format!("day must be 01-{max_day} for {year:04}-{month:02}"),
                ));
            }
        }
        InputPolicy::Clamp => {
            month = month.clamp(1, 12);
            day = day.clamp(1, days_in_month(year, month));
        }
    }
    Ok(format!("{year:04}-{month:02}-{day:02}"))
}

/// Number of days in a month, leap years included.
///
/// `month` must be in `1..=12`.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map_or(31, |last| last.day())
}

/// Validate a call sign, producing uppercase text of at most
/// [`MAX_CALL_LEN`] characters.
///
/// # Errors
///
/// Returns an error when the call sign is empty, or under
/// [`InputPolicy::Reject`] when it is too long or has characters other than
/// letters, digits and `/`.
pub fn validate_call(input: &str, policy: InputPolicy) -> Result<String> {
    let text = input.trim().to_uppercase();
    if text.is_empty() {
        return Err(Error::invalid_field("call", input, "call sign is required"));
    }

    let call = match policy {
        InputPolicy::Reject => {
            if !patterns::CALL.matches(&text) {
                return Err(mismatch(Column::Call, &text));
            }
            text
        }
        InputPolicy::Clamp => text
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '/')
            .take(MAX_CALL_LEN)
            .collect(),
    };

    if call.is_empty() {
        return Err(Error::invalid_field("call", input, "call sign is required"));
    }
    Ok(call)
}

/// Validate a frequency in MHz, producing three decimal places.
///
/// Empty input means zero.
///
/// # Errors
///
/// Returns an error under [`InputPolicy::Reject`] when the text is not a
/// frequency.
pub fn validate_freq(input: &str, policy: InputPolicy) -> Result<String> {
    let text = input.trim();
    let freq = if text.is_empty() {
        0.0
    } else {
        match policy {
            InputPolicy::Reject => {
                if !patterns::FREQ.matches(text) {
                    return Err(mismatch(Column::Freq, text));
                }
                text.parse::<f64>().map_err(|_| mismatch(Column::Freq, text))?
            }
            InputPolicy::Clamp => clamp_float(text, MAX_FREQ),
        }
    };
    Ok(format!("{freq:.3}"))
}

/// Validate a signal report, producing a plain signed integer.
///
/// Empty input means zero.
///
/// # Errors
///
/// Returns an error under [`InputPolicy::Reject`] when the text is not a
/// signed number of up to three digits.
pub fn validate_report(column: Column, input: &str, policy: InputPolicy) -> Result<String> {
    let text = input.trim();
    if text.is_empty() {
        return Ok("0".to_string());
    }
    let report = match policy {
        InputPolicy::Reject => {
            if !patterns::REPORT.matches(text) {
                return Err(mismatch(column, text));
            }
            text.parse::<i64>().map_err(|_| mismatch(column, text))?
        }
        InputPolicy::Clamp => text
            .parse::<i64>()
            .map_or(0, |value| value.clamp(-MAX_REPORT, MAX_REPORT)),
    };
    Ok(report.to_string())
}

/// Validate a transmit power in watts.
///
/// Input typed with a decimal point keeps two decimal places; whole numbers
/// stay whole. Empty input means zero.
///
/// # Errors
///
/// Returns an error under [`InputPolicy::Reject`] when the text is not a
/// power value.
pub fn validate_pwr(input: &str, policy: InputPolicy) -> Result<String> {
    let text = input.trim();
    if text.is_empty() {
        return Ok("0".to_string());
    }
    let watts = match policy {
        InputPolicy::Reject => {
            if !patterns::PWR.matches(text) {
                return Err(mismatch(Column::Pwr, text));
            }
            text.parse::<f64>().map_err(|_| mismatch(Column::Pwr, text))?
        }
        InputPolicy::Clamp => clamp_float(text, MAX_PWR),
    };
    Ok(format_power(text, watts))
}

/// Format a power value the way it was typed: two decimals if the text had a
/// decimal point, otherwise a whole number.
#[must_use]
pub fn format_power(text: &str, watts: f64) -> String {
    if text.contains('.') {
        format!("{watts:.2}")
    } else {
        format!("{}", watts.trunc())
    }
}

/// Validate the operator call sign.
///
/// # Errors
///
/// Returns [`Error::MissingField`] when empty, otherwise as
/// [`validate_call`].
pub fn validate_mycall(input: &str, policy: InputPolicy) -> Result<String> {
    if input.trim().is_empty() {
        return Err(Error::MissingField { field: "mycall" });
    }
    validate_call(input, policy).map_err(|err| match err {
        Error::InvalidField { value, reason, .. } => Error::InvalidField {
            field: "mycall",
            value,
            reason,
        },
        other => other,
    })
}

/// Validate a Maidenhead grid square, producing uppercase text.
///
/// # Errors
///
/// Returns [`Error::MissingField`] when empty or [`Error::InvalidField`]
/// when the text is not a 4 or 6 character locator. A locator cannot be
/// clamped, so this holds under either policy.
pub fn validate_grid(input: &str) -> Result<String> {
    let text = input.trim();
    if text.is_empty() {
        return Err(Error::MissingField { field: "grid" });
    }
    let grid = grid_pattern();
    if !grid.matches(text) {
        return Err(Error::invalid_field(
            "grid",
            text,
            format!("expected {}", grid.description),
        ));
    }
    Ok(text.to_uppercase())
}

fn mismatch(column: Column, text: &str) -> Error {
    let description = column_pattern(column).map_or("a valid value", |p| p.description);
    Error::invalid_field(column.name(), text, format!("expected {description}"))
}

fn group(caps: &Captures<'_>, name: &str, column: Column, text: &str) -> Result<u32> {
    caps.name(name)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| mismatch(column, text))
}

fn parse_choice<T>(column: Column, input: &str) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    input
        .parse::<T>()
        .map_err(|reason| Error::invalid_field(column.name(), input.trim(), reason))
}

fn clamp_float(text: &str, max: f64) -> f64 {
    text.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map_or(0.0, |value| value.clamp(0.0, max))
}
