//! Core contact types for qsolog.
//!
//! This module defines the log entry, the log file that owns the entries,
//! and the table columns through which entries are displayed and edited.

mod band;
mod mode;

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

pub use band::Band;
pub use mode::{Mode, QsoDirection};

/// Format of the `date` field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format of the `time` field.
pub const TIME_FORMAT: &str = "%H:%M";

/// A column of the log table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    /// Positional sequence number.
    Seq,
    /// UTC time, `HH:MM`.
    Time,
    /// UTC date, `YYYY-MM-DD`.
    Date,
    /// Call sign of the station worked.
    Call,
    /// Operating mode.
    Mode,
    /// Band.
    Band,
    /// Frequency in MHz.
    Freq,
    /// Report sent.
    Tx,
    /// Report received.
    Rx,
    /// Transmit power in watts.
    Pwr,
    /// Whether the QSO was sent or received.
    Qso,
}

impl Column {
    /// All columns in table order.
    pub const ALL: [Column; 11] = [
        Self::Seq,
        Self::Time,
        Self::Date,
        Self::Call,
        Self::Mode,
        Self::Band,
        Self::Freq,
        Self::Tx,
        Self::Rx,
        Self::Pwr,
        Self::Qso,
    ];

    /// Columns backed by a log entry field.
    pub const FIELDS: [Column; 10] = [
        Self::Time,
        Self::Date,
        Self::Call,
        Self::Mode,
        Self::Band,
        Self::Freq,
        Self::Tx,
        Self::Rx,
        Self::Pwr,
        Self::Qso,
    ];

    /// Lowercase column name, also the JSON key of the field.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Seq => "#",
            Self::Time => "time",
            Self::Date => "date",
            Self::Call => "call",
            Self::Mode => "mode",
            Self::Band => "band",
            Self::Freq => "freq",
            Self::Tx => "tx",
            Self::Rx => "rx",
            Self::Pwr => "pwr",
            Self::Qso => "qso",
        }
    }

    /// Table header text.
    #[must_use]
    pub fn header(self) -> &'static str {
        match self {
            Self::Seq => "#",
            Self::Time => "Time",
            Self::Date => "Date",
            Self::Call => "Call",
            Self::Mode => "Mode",
            Self::Band => "Band",
            Self::Freq => "Freq",
            Self::Tx => "Tx",
            Self::Rx => "Rx",
            Self::Pwr => "Pwr",
            Self::Qso => "QSO",
        }
    }

    /// Whether the column sorts by parsed numeric value.
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Freq | Self::Tx | Self::Rx | Self::Pwr)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case("seq") {
            return Ok(Self::Seq);
        }
        Self::ALL
            .into_iter()
            .find(|column| column.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown column '{wanted}'"))
    }
}

/// A single logged contact.
///
/// Free-form fields hold their validated text so that a saved log reloads
/// byte for byte; values that came from an older file and no longer parse
/// are kept as they are and sort after parsable ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// UTC time, `HH:MM`.
    pub time: String,
    /// UTC date, `YYYY-MM-DD`.
    pub date: String,
    /// Call sign of the station worked.
    pub call: String,
    /// Operating mode.
    pub mode: Mode,
    /// Band.
    pub band: Band,
    /// Frequency in MHz.
    #[serde(deserialize_with = "string_or_number")]
    pub freq: String,
    /// Report sent.
    #[serde(deserialize_with = "string_or_number")]
    pub tx: String,
    /// Report received.
    #[serde(deserialize_with = "string_or_number")]
    pub rx: String,
    /// Transmit power in watts.
    #[serde(deserialize_with = "string_or_number")]
    pub pwr: String,
    /// Whether the QSO was sent or received.
    pub qso: QsoDirection,
}

impl LogEntry {
    /// The stored text of a field column.
    ///
    /// Returns `None` for [`Column::Seq`], which is positional rather than stored.
    #[must_use]
    pub fn cell(&self, column: Column) -> Option<String> {
        let text = match column {
            Column::Seq => return None,
            Column::Time => self.time.clone(),
            Column::Date => self.date.clone(),
            Column::Call => self.call.clone(),
            Column::Mode => self.mode.as_str().to_string(),
            Column::Band => self.band.as_str().to_string(),
            Column::Freq => self.freq.clone(),
            Column::Tx => self.tx.clone(),
            Column::Rx => self.rx.clone(),
            Column::Pwr => self.pwr.clone(),
            Column::Qso => self.qso.as_str().to_string(),
        };
        Some(text)
    }

    /// Replace a field with already-validated text.
    ///
    /// # Errors
    ///
    /// Returns an error for [`Column::Seq`] or if an enumerated column is
    /// given text that is not one of its values.
    pub fn set_cell(&mut self, column: Column, value: &str) -> crate::Result<()> {
        let invalid = |reason: String| crate::Error::invalid_field(column.name(), value, reason);
        match column {
            Column::Seq => {
                return Err(invalid(
                    "sequence numbers are assigned automatically".to_string(),
                ))
            }
            Column::Time => self.time = value.to_string(),
            Column::Date => self.date = value.to_string(),
            Column::Call => self.call = value.to_string(),
            Column::Mode => self.mode = value.parse().map_err(invalid)?,
            Column::Band => self.band = value.parse().map_err(invalid)?,
            Column::Freq => self.freq = value.to_string(),
            Column::Tx => self.tx = value.to_string(),
            Column::Rx => self.rx = value.to_string(),
            Column::Pwr => self.pwr = value.to_string(),
            Column::Qso => self.qso = value.parse().map_err(invalid)?,
        }
        Ok(())
    }

    /// Parsed UTC date, if the stored text is a valid date.
    #[must_use]
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, DATE_FORMAT).ok()
    }

    /// Parsed UTC time, if the stored text is a valid time.
    #[must_use]
    pub fn parsed_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.time, TIME_FORMAT).ok()
    }

    /// When the contact took place, if both date and time parse.
    #[must_use]
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        Some(self.parsed_date()?.and_time(self.parsed_time()?))
    }
}

/// A complete log: operator details plus entries in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogFile {
    /// Operator call sign.
    pub mycall: String,
    /// Operator Maidenhead grid square.
    pub grid: String,
    /// Entries, oldest first.
    pub log: Vec<LogEntry>,
}

impl LogFile {
    /// Create an empty log for the given operator.
    #[must_use]
    pub fn new(mycall: impl Into<String>, grid: impl Into<String>) -> Self {
        Self {
            mycall: mycall.into(),
            grid: grid.into(),
            log: Vec::new(),
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Check if the log has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Entries paired with their 1-based sequence numbers.
    pub fn numbered(&self) -> impl Iterator<Item = (usize, &LogEntry)> {
        self.log.iter().enumerate().map(|(i, entry)| (i + 1, entry))
    }

    /// Reorder entries chronologically.
    ///
    /// The sort is stable, so entries logged in the same minute keep their
    /// relative order. Entries whose date or time does not parse go last.
    pub fn sort_chronologically(&mut self) {
        self.log.sort_by_key(|entry| {
            let stamp = entry.timestamp();
            (stamp.is_none(), stamp)
        });
    }
}

/// Accept a JSON string or number, keeping it as text.
///
/// Older log files stored empty numeric fields as the number `0`.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
