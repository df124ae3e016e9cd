//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::qso::{Band, Column, Mode, QsoDirection};

/// Arguments for creating a log.
#[derive(Debug, Args)]
pub struct NewCommand {
    /// Operator call sign (defaults to `station.mycall`)
    #[arg(short, long)]
    pub mycall: Option<String>,

    /// Operator grid square (defaults to `station.grid`)
    #[arg(short, long)]
    pub grid: Option<String>,

    /// Replace an existing log file
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for logging a contact.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Call sign of the station worked
    #[arg(long)]
    pub call: String,

    /// Operating mode (defaults to `entry.default_mode`)
    #[arg(short, long)]
    pub mode: Option<Mode>,

    /// Band (defaults to `entry.default_band`)
    #[arg(short, long)]
    pub band: Option<Band>,

    /// Frequency in MHz
    #[arg(short, long, default_value = "")]
    pub freq: String,

    /// Report sent
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub tx: String,

    /// Report received
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub rx: String,

    /// Transmit power in watts
    #[arg(short, long, default_value = "")]
    pub pwr: String,

    /// Whether the QSO was sent or received (defaults to `entry.default_qso`)
    #[arg(long)]
    pub qso: Option<QsoDirection>,

    /// UTC time, HH:MM (defaults to now)
    #[arg(long)]
    pub time: Option<String>,

    /// UTC date, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub date: Option<String>,
}

/// Arguments for listing the log.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Sort by column (#, time, date, call, mode, band, freq, tx, rx, pwr, qso)
    #[arg(short, long)]
    pub sort: Option<Column>,

    /// Sort in descending order
    #[arg(short, long, requires = "sort")]
    pub desc: bool,

    /// Only show rows containing this text
    #[arg(long)]
    pub search: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

/// Arguments for editing the log.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Sequence number of the row to edit
    #[arg(short, long)]
    pub row: Option<usize>,

    /// Cell assignment, may be repeated
    #[arg(
        short,
        long = "set",
        value_name = "COLUMN=VALUE",
        value_parser = parse_assignment,
        requires = "row"
    )]
    pub set: Vec<Assignment>,

    /// New operator call sign
    #[arg(long)]
    pub mycall: Option<String>,

    /// New operator grid square
    #[arg(long)]
    pub grid: Option<String>,

    /// Check the edits without saving them
    #[arg(long)]
    pub discard: bool,
}

/// Arguments for deleting a row.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Sequence number of the row to delete
    #[arg(short, long)]
    pub row: usize,
}

/// Arguments for exporting the log.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// ADIF file to write (`.adi` is added if there is no extension)
    pub output: PathBuf,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// A `COLUMN=VALUE` cell assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Column to change.
    pub column: Column,
    /// Raw text for the cell.
    pub value: String,
}

/// Parse a `COLUMN=VALUE` assignment.
///
/// # Errors
///
/// Returns an error if there is no `=` or the column is unknown.
pub fn parse_assignment(text: &str) -> Result<Assignment, String> {
    let (column, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected COLUMN=VALUE, got '{text}'"))?;
    Ok(Assignment {
        column: column.parse()?,
        value: value.to_string(),
    })
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    Plain,
    /// Formatted table
    #[default]
    Table,
    /// JSON output
    Json,
}
