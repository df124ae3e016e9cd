//! ADIF export.
//!
//! Writes the log as an ADIF text file. Exports are incremental: when the
//! target already holds an earlier export, only contacts made since that
//! export are written, and the file is replaced.
//!
//! Contacts are logged to the minute while the export stamp carries seconds.
//! Contacts from the minute an export runs in are held back for the next
//! export, and the next export starts at the start of that minute, so every
//! contact is exported exactly once.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::qso::{Column, LogEntry, LogFile};
use crate::storage::write_atomic;
use crate::table::format_cell;

/// Extension given to export paths that have none.
pub const ADIF_EXTENSION: &str = "adi";

/// Prefix of the header line carrying the export timestamp.
const EXPORTED_ON: &str = "Log exported on: ";

/// Format of the export timestamp, without the trailing zone name.
const EXPORTED_ON_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Who produced an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportHeader {
    /// Program name and version.
    pub program: String,
    /// Person or station credited with the export.
    pub author: String,
}

/// Outcome of an export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    /// File that was written.
    pub path: PathBuf,
    /// Number of records written.
    pub written: usize,
    /// Number of entries skipped because their date or time did not parse.
    pub skipped: usize,
    /// Number of entries from the current minute or later, left for the
    /// next export.
    pub held_back: usize,
    /// Timestamp of the previous export, if there was one.
    pub since: Option<NaiveDateTime>,
}

/// Resolve an export target, adding the `.adi` extension if it has none.
#[must_use]
pub fn adif_path(target: &Path) -> PathBuf {
    if target.extension().is_some() {
        target.to_path_buf()
    } else {
        target.with_extension(ADIF_EXTENSION)
    }
}

/// Read the timestamp of a previous export.
///
/// Returns `None` if the file does not exist or has no timestamp line.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn last_export_time(path: &Path) -> Result<Option<NaiveDateTime>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(parse_export_time(&text)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(Error::FileRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Find the export timestamp in the text of an ADIF header.
#[must_use]
pub fn parse_export_time(text: &str) -> Option<NaiveDateTime> {
    text.lines()
        .take_while(|line| !line.trim_start().starts_with("<EOH>"))
        .find_map(|line| line.trim().strip_prefix(EXPORTED_ON))
        .and_then(|stamp| {
            let stamp = stamp.trim().trim_end_matches("UTC").trim_end();
            NaiveDateTime::parse_from_str(stamp, EXPORTED_ON_FORMAT).ok()
        })
}

/// An export rendered to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// The ADIF document.
    pub text: String,
    /// Number of records in the document.
    pub written: usize,
    /// Number of entries left out because their date or time did not parse.
    pub skipped: usize,
    /// Number of entries left for a later export.
    pub held_back: usize,
}

/// Render the entries of a log made since `since` as an ADIF document.
///
/// Both bounds are taken to the minute: entries from the minute of `since`
/// onwards are included and entries from the minute of `now` onwards are
/// held back. Records are written in chronological order.
#[must_use]
pub fn render(
    log: &LogFile,
    header: &ExportHeader,
    now: DateTime<Utc>,
    since: Option<NaiveDateTime>,
) -> Rendered {
    let mut text = format!(
        "ADIF Export from {}\nWritten by {}\n{EXPORTED_ON}{} UTC\n<EOH>\n\n",
        header.program,
        header.author,
        now.format(EXPORTED_ON_FORMAT),
    );

    let from = since.map(start_of_minute);
    let until = start_of_minute(now.naive_utc());

    let mut skipped = 0;
    let mut held_back = 0;
    let mut records: Vec<(NaiveDateTime, &LogEntry)> = Vec::new();
    for (seq, entry) in log.numbered() {
        let Some(stamp) = entry.timestamp() else {
            warn!(
                seq,
                call = %entry.call,
                "Skipping entry with unparsable date or time"
            );
            skipped += 1;
            continue;
        };
        if stamp >= until {
            held_back += 1;
        } else if from.map_or(true, |from| stamp >= from) {
            records.push((stamp, entry));
        }
    }
    records.sort_by_key(|(stamp, _)| *stamp);

    for (stamp, entry) in &records {
        text.push_str(&record(log, entry, *stamp));
    }

    Rendered {
        text,
        written: records.len(),
        skipped,
        held_back,
    }
}

fn start_of_minute(stamp: NaiveDateTime) -> NaiveDateTime {
    stamp
        .with_second(0)
        .and_then(|stamp| stamp.with_nanosecond(0))
        .unwrap_or(stamp)
}

/// Export a log to an ADIF file, replacing the file.
///
/// # Errors
///
/// Returns an error if an existing export cannot be read or the new one
/// cannot be written.
pub fn export_adif(
    log: &LogFile,
    target: &Path,
    header: &ExportHeader,
    now: DateTime<Utc>,
) -> Result<ExportSummary> {
    let path = adif_path(target);
    let since = last_export_time(&path)?;
    if let Some(since) = since {
        debug!("Previous export at {since}, writing newer contacts only");
    }

    let rendered = render(log, header, now, since);
    write_atomic(&path, rendered.text.as_bytes())?;
    info!(
        written = rendered.written,
        skipped = rendered.skipped,
        held_back = rendered.held_back,
        "Exported log to {}",
        path.display()
    );

    Ok(ExportSummary {
        path,
        written: rendered.written,
        skipped: rendered.skipped,
        held_back: rendered.held_back,
        since,
    })
}

fn record(log: &LogFile, entry: &LogEntry, stamp: NaiveDateTime) -> String {
    let mut out = String::new();
    let display = |column| format_cell(entry, column, 0);
    field(&mut out, "CALL", &entry.call);
    field(&mut out, "QSO_DATE", &stamp.format("%Y%m%d").to_string());
    field(&mut out, "TIME_ON", &stamp.format("%H%M").to_string());
    field(&mut out, "BAND", entry.band.as_str());
    field(&mut out, "FREQ", &display(Column::Freq));
    field(&mut out, "MODE", entry.mode.adif_name());
    field(&mut out, "TX_PWR", &display(Column::Pwr));
    field(&mut out, "RST_SENT", &display(Column::Tx));
    field(&mut out, "RST_RCVD", &display(Column::Rx));
    field(&mut out, "STATION_CALLSIGN", &log.mycall);
    field(&mut out, "MY_GRIDSQUARE", &log.grid);
    out.push_str("<EOR>\n\n");
    out
}

fn field(out: &mut String, tag: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    out.push_str(&format!("<{tag}:{}>{value}\n", value.chars().count()));
}
