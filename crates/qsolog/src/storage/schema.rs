//! On-disk JSON document format for qsolog.
//!
//! A log file is a single JSON object:
//!
//! ```json
//! {
//!     "mycall": "N0CALL",
//!     "grid": "FN31",
//!     "log": [
//!         { "time": "14:02", "date": "2024-03-01", "call": "W1AW", "mode": "SSB",
//!           "band": "20m", "freq": "14.250", "tx": "59", "rx": "57",
//!           "pwr": "100", "qso": "Sent" }
//!     ]
//! }
//! ```
//!
//! Documents are written pretty-printed with four-space indentation.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::qso::LogFile;

/// Indentation used when writing log documents.
const INDENT: &[u8] = b"    ";

/// Serialize a log to its on-disk text.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(log: &LogFile) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    log.serialize(&mut ser)?;
    buf.push(b'\n');
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Parse a log from its on-disk text.
///
/// # Errors
///
/// Returns an error if the text is not a log document.
pub fn from_json(text: &str) -> serde_json::Result<LogFile> {
    serde_json::from_str(text)
}

/// BLAKE3 fingerprint of a log's canonical serialization.
///
/// Two logs with equal content always have equal fingerprints, regardless of
/// how their files were formatted on disk.
#[must_use]
pub fn fingerprint(log: &LogFile) -> String {
    // compact form, independent of the pretty printer
    let bytes = serde_json::to_vec(log).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}
