//! Command-line interface for qsolog.
//!
//! This module provides the CLI structure and output rendering for the
//! `qsolog` binary.

mod commands;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    parse_assignment, AddCommand, Assignment, ConfigCommand, DeleteCommand, EditCommand,
    ExportCommand, ListCommand, NewCommand, OutputFormat, StatusCommand,
};
pub use output::render_rows;

/// qsolog - Amateur radio contact logger
///
/// Keeps a log of contacts in a JSON file, with sorting, search, editing
/// and ADIF export.
#[derive(Debug, Parser)]
#[command(name = "qsolog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log file to use instead of the configured one
    #[arg(long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new, empty log
    New(NewCommand),

    /// Log a contact
    Add(AddCommand),

    /// Show the log
    List(ListCommand),

    /// Edit cells or operator details, then save
    Edit(EditCommand),

    /// Delete a row, then save
    Delete(DeleteCommand),

    /// Export contacts made since the last export to ADIF
    Export(ExportCommand),

    /// Show log file status
    Status(StatusCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qso::{Band, Column, Mode};
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "qsolog");
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["qsolog", "status"]).verbosity(), Verbosity::Normal);
        assert_eq!(
            parse(&["qsolog", "-vv", "status"]).verbosity(),
            Verbosity::Trace
        );
        assert_eq!(
            parse(&["qsolog", "status", "-q"]).verbosity(),
            Verbosity::Quiet
        );
    }

    #[test]
    fn test_parse_with_config_and_log() {
        let cli = parse(&[
            "qsolog",
            "-c",
            "/custom/config.toml",
            "--log",
            "/radio/log.json",
            "status",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert_eq!(cli.log, Some(PathBuf::from("/radio/log.json")));
    }

    #[test]
    fn test_parse_new() {
        let cli = parse(&["qsolog", "new", "--mycall", "N0CALL", "--grid", "FN31", "-f"]);
        let Command::New(cmd) = cli.command else {
            panic!("expected new command");
        };
        assert_eq!(cmd.mycall.as_deref(), Some("N0CALL"));
        assert!(cmd.force);
    }

    #[test]
    fn test_parse_add() {
        let cli = parse(&[
            "qsolog", "add", "--call", "W1AW", "--mode", "ft8", "--band", "20m", "--freq",
            "14.074", "--tx", "-10", "--rx", "-12",
        ]);
        let Command::Add(cmd) = cli.command else {
            panic!("expected add command");
        };
        assert_eq!(cmd.call, "W1AW");
        assert_eq!(cmd.mode, Some(Mode::Ft8));
        assert_eq!(cmd.band, Some(Band::M20));
        assert_eq!(cmd.tx, "-10");
        assert_eq!(cmd.rx, "-12");
        assert!(cmd.pwr.is_empty());
        assert!(cmd.time.is_none());
    }

    #[test]
    fn test_parse_add_rejects_unknown_band() {
        assert!(Cli::try_parse_from(["qsolog", "add", "--call", "W1AW", "--band", "11m"]).is_err());
    }

    #[test]
    fn test_parse_list() {
        let cli = parse(&["qsolog", "list", "--sort", "band", "--desc", "-f", "json"]);
        let Command::List(cmd) = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(cmd.sort, Some(Column::Band));
        assert!(cmd.desc);
        assert_eq!(cmd.format, OutputFormat::Json);
    }

    #[test]
    fn test_parse_list_defaults_to_table() {
        let Command::List(cmd) = parse(&["qsolog", "list"]).command else {
            panic!("expected list command");
        };
        assert_eq!(cmd.format, OutputFormat::default());
        assert_eq!(cmd.format, OutputFormat::Table);
        assert!(cmd.sort.is_none());
    }

    #[test]
    fn test_parse_list_desc_requires_sort() {
        assert!(Cli::try_parse_from(["qsolog", "list", "--desc"]).is_err());
    }

    #[test]
    fn test_parse_edit() {
        let cli = parse(&[
            "qsolog", "edit", "--row", "3", "--set", "freq=7.074", "--set", "call=K1ABC",
        ]);
        let Command::Edit(cmd) = cli.command else {
            panic!("expected edit command");
        };
        assert_eq!(cmd.row, Some(3));
        assert_eq!(cmd.set.len(), 2);
        assert_eq!(cmd.set[1].column, Column::Call);
        assert!(!cmd.discard);
    }

    #[test]
    fn test_parse_edit_set_requires_row() {
        assert!(Cli::try_parse_from(["qsolog", "edit", "--set", "freq=7.074"]).is_err());
        assert!(Cli::try_parse_from(["qsolog", "edit", "--grid", "EM12"]).is_ok());
    }

    #[test]
    fn test_parse_export() {
        let cli = parse(&["qsolog", "export", "contacts"]);
        let Command::Export(cmd) = cli.command else {
            panic!("expected export command");
        };
        assert_eq!(cmd.output, PathBuf::from("contacts"));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = parse(&["qsolog", "config", "validate", "--file", "/tmp/c.toml"]);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }
}
