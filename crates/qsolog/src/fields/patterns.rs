//! Input patterns for the free-form log columns.
//!
//! Each pattern describes the text an operator may type into a column before
//! it is normalized. Patterns are compiled once on first use.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::qso::Column;

/// A compiled field input pattern.
#[derive(Debug)]
pub struct FieldPattern {
    /// Name of the pattern for identification.
    pub name: &'static str,

    /// Description of what this pattern accepts, shown when input is rejected.
    pub description: &'static str,

    /// The compiled regex.
    regex: Regex,
}

impl FieldPattern {
    /// Create a new field pattern.
    ///
    /// # Panics
    ///
    /// Panics if the regex pattern is invalid.
    #[must_use]
    pub fn new(name: &'static str, description: &'static str, pattern: &str) -> Self {
        Self {
            name,
            description,
            regex: Regex::new(pattern).expect("Invalid regex pattern"),
        }
    }

    /// Check if the input matches this pattern.
    #[must_use]
    pub fn matches(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }

    /// Capture the groups of a matching input.
    #[must_use]
    pub fn captures<'a>(&self, input: &'a str) -> Option<Captures<'a>> {
        self.regex.captures(input)
    }
}

pub(super) static TIME: LazyLock<FieldPattern> = LazyLock::new(|| {
    FieldPattern::new("time", "HH:MM", r"^(?P<hour>[0-9]{1,2}):(?P<minute>[0-9]{1,2})$")
});

pub(super) static DATE: LazyLock<FieldPattern> = LazyLock::new(|| {
    FieldPattern::new(
        "date",
        "YYYY-MM-DD",
        r"^(?P<year>[0-9]{4})-(?P<month>[0-9]{1,2})-(?P<day>[0-9]{1,2})$",
    )
});

pub(super) static CALL: LazyLock<FieldPattern> = LazyLock::new(|| {
    FieldPattern::new(
        "call",
        "up to 9 letters, digits or '/'",
        r"^[A-Z0-9/]{1,9}$",
    )
});

pub(super) static FREQ: LazyLock<FieldPattern> = LazyLock::new(|| {
    FieldPattern::new(
        "freq",
        "MHz with up to 6 digits and 6 decimals",
        r"^[0-9]{1,6}(\.[0-9]{0,6})?$",
    )
});

pub(super) static REPORT: LazyLock<FieldPattern> = LazyLock::new(|| {
    FieldPattern::new("report", "signed number up to 3 digits", r"^[+-]?[0-9]{1,3}$")
});

pub(super) static PWR: LazyLock<FieldPattern> = LazyLock::new(|| {
    FieldPattern::new(
        "pwr",
        "watts with up to 4 digits and 3 decimals",
        r"^[0-9]{1,4}(\.[0-9]{0,3})?$",
    )
});

static GRID: LazyLock<FieldPattern> = LazyLock::new(|| {
    FieldPattern::new(
        "grid",
        "Maidenhead locator such as FN31 or FN31pr",
        r"^[A-Ra-r]{2}[0-9]{2}([A-Xa-x]{2})?$",
    )
});

/// Get the input pattern for a column.
///
/// Enumerated columns (mode, band, qso) and the sequence column have no
/// pattern.
#[must_use]
pub fn column_pattern(column: Column) -> Option<&'static FieldPattern> {
    let pattern: &'static LazyLock<FieldPattern> = match column {
        Column::Time => &TIME,
        Column::Date => &DATE,
        Column::Call => &CALL,
        Column::Freq => &FREQ,
        Column::Tx | Column::Rx => &REPORT,
        Column::Pwr => &PWR,
        Column::Seq | Column::Mode | Column::Band | Column::Qso => return None,
    };
    Some(LazyLock::force(pattern))
}

/// Get the Maidenhead grid square pattern.
#[must_use]
pub fn grid_pattern() -> &'static FieldPattern {
    &GRID
}
