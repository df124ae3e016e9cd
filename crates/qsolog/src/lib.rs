//! `qsolog` - A single-operator amateur radio contact logger
//!
//! This library provides the core of the logger: validated log entries, a
//! sortable and searchable table, an edit session with explicit lock states,
//! whole-file JSON persistence, and incremental ADIF export.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod fields;
pub mod form;
pub mod logging;
pub mod qso;
pub mod session;
pub mod storage;
pub mod table;

pub use config::Config;
pub use error::{Error, Result};
pub use export::{ExportHeader, ExportSummary};
pub use fields::InputPolicy;
pub use form::{EntryForm, FormDefaults};
pub use logging::init_logging;
pub use qso::{Band, Column, LogEntry, LogFile, Mode, QsoDirection};
pub use session::{EditBuffer, Session, SessionState};
pub use storage::{JsonFileStore, LogStore, MemoryStore};
pub use table::{LogTable, Row, SortOrder};
