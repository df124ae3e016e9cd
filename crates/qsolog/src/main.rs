//! `qsolog` - CLI for the qsolog contact logger.
//!
//! Each invocation loads the log, carries out one action through a
//! [`Session`], and exits.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};

use qsolog::cli::{
    render_rows, AddCommand, Cli, Command, ConfigCommand, EditCommand, ListCommand, NewCommand,
};
use qsolog::storage::{schema, JsonFileStore, LogStore};
use qsolog::table::SortOrder;
use qsolog::{init_logging, Config, EntryForm, Session};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<qsolog::Error>() {
            Some(user) if user.is_user_error() => {
                eprintln!("warning: {user}");
                ExitCode::from(2)
            }
            _ => {
                eprintln!("error: {err:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load_from(cli.config.clone())?;
    let log_path = cli.log.clone().unwrap_or_else(|| config.log_path());

    match cli.command {
        Command::New(cmd) => handle_new(&config, &log_path, cmd),
        Command::Add(cmd) => handle_add(&config, &log_path, cmd),
        Command::List(cmd) => handle_list(&config, &log_path, cmd),
        Command::Edit(cmd) => handle_edit(&config, &log_path, cmd),
        Command::Delete(cmd) => {
            let mut session = open(&config, &log_path)?;
            session.unlock()?;
            let entry = session.delete_row(cmd.row)?;
            session.save()?;
            println!("Deleted #{:04} {}", cmd.row, entry.call);
            Ok(())
        }
        Command::Export(cmd) => {
            let session = open(&config, &log_path)?;
            let mycall = session.log().map(|log| log.mycall.clone()).unwrap_or_default();
            let header = config.export_header(&mycall);
            let summary = session.export(&cmd.output, &header, Utc::now())?;
            if summary.skipped > 0 {
                warn!(
                    "{} entries with an unparsable date or time were not exported",
                    summary.skipped
                );
            }
            if summary.held_back > 0 {
                info!(
                    "{} contact(s) from this minute will go out with the next export",
                    summary.held_back
                );
            }
            println!(
                "Exported {} contact(s) to {}",
                summary.written,
                summary.path.display()
            );
            Ok(())
        }
        Command::Status(cmd) => handle_status(&log_path, cmd.json),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open(config: &Config, log_path: &Path) -> anyhow::Result<Session> {
    let mut session = Session::new(config.entry.policy);
    session.load(JsonFileStore::new(log_path))?;
    Ok(session)
}

fn handle_new(config: &Config, log_path: &Path, cmd: NewCommand) -> anyhow::Result<()> {
    let mycall = cmd
        .mycall
        .or_else(|| config.station.mycall.clone())
        .unwrap_or_default();
    let grid = cmd
        .grid
        .or_else(|| config.station.grid.clone())
        .unwrap_or_default();

    let mut session = Session::new(config.entry.policy);
    session.create(JsonFileStore::new(log_path), &mycall, &grid, cmd.force)?;
    println!("Created log at {}", log_path.display());
    Ok(())
}

fn handle_add(config: &Config, log_path: &Path, cmd: AddCommand) -> anyhow::Result<()> {
    let mut session = open(config, log_path)?;

    let mut form = EntryForm::new(config.form_defaults(), Utc::now());
    form.call = cmd.call;
    form.freq = cmd.freq;
    form.tx = cmd.tx;
    form.rx = cmd.rx;
    form.pwr = cmd.pwr;
    if let Some(mode) = cmd.mode {
        form.mode = mode;
    }
    if let Some(band) = cmd.band {
        form.band = band;
    }
    if let Some(qso) = cmd.qso {
        form.qso = qso;
    }
    if let Some(time) = cmd.time {
        form.set_time(time);
    }
    if let Some(date) = cmd.date {
        form.date = date;
    }

    let entry = form.submit(session.policy())?;
    let call = entry.call.clone();
    let seq = session.append(entry)?;
    println!("Logged #{seq:04} {call}");
    Ok(())
}

fn handle_list(config: &Config, log_path: &Path, cmd: ListCommand) -> anyhow::Result<()> {
    let mut session = open(config, log_path)?;

    if let Some(column) = cmd.sort {
        let order = if cmd.desc {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        };
        session.sort_by(column, order)?;
    }
    if let Some(term) = &cmd.search {
        if session.search(term)? == 0 {
            info!("No entries match '{}'", term.trim());
        }
    }

    let table = session
        .table()
        .context("log table missing after load")?;
    let text = render_rows(table.visible_rows(), cmd.format)?;
    if !text.is_empty() {
        println!("{text}");
    }
    Ok(())
}

fn handle_edit(config: &Config, log_path: &Path, cmd: EditCommand) -> anyhow::Result<()> {
    let mut session = open(config, log_path)?;
    session.unlock()?;

    if let Some(row) = cmd.row {
        for assignment in &cmd.set {
            let value = session.edit_cell(row, assignment.column, &assignment.value)?;
            info!("#{row:04} {} = {value}", assignment.column);
        }
    }
    if let Some(mycall) = &cmd.mycall {
        session.edit_mycall(mycall)?;
    }
    if let Some(grid) = &cmd.grid {
        session.edit_grid(grid)?;
    }

    let changed = session
        .edit_buffer()
        .map(|buffer| buffer.changed_cells().len())
        .unwrap_or_default();
    if cmd.discard {
        session.cancel()?;
        println!("Discarded {changed} changed cell(s)");
    } else {
        session.save()?;
        println!("Saved {changed} changed cell(s)");
    }
    Ok(())
}

fn handle_status(log_path: &Path, json: bool) -> anyhow::Result<()> {
    let store = JsonFileStore::new(log_path);
    let log = if store.exists() {
        Some(store.load()?)
    } else {
        None
    };
    let fingerprint = log.as_ref().map(schema::fingerprint);
    let last = log
        .as_ref()
        .and_then(|log| log.log.iter().filter_map(|entry| entry.timestamp()).max());

    if json {
        let status = serde_json::json!({
            "log_path": log_path,
            "exists": log.is_some(),
            "mycall": log.as_ref().map(|log| &log.mycall),
            "grid": log.as_ref().map(|log| &log.grid),
            "entries": log.as_ref().map_or(0, qsolog::LogFile::len),
            "last_contact": last.map(|stamp| stamp.to_string()),
            "fingerprint": fingerprint,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("qsolog status");
    println!("-------------");
    println!("Log file:      {}", log_path.display());
    match &log {
        None => println!("               (not created yet, run `qsolog new`)"),
        Some(log) => {
            println!("Operator:      {}", log.mycall);
            println!("Grid:          {}", log.grid);
            println!("Entries:       {}", log.len());
            if let Some(last) = last {
                println!("Last contact:  {last} UTC");
            }
            if let Some(fingerprint) = &fingerprint {
                println!("Fingerprint:   {fingerprint}");
            }
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                let unset = || "(unset)".to_string();
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Log path:       {}", config.log_path().display());
                println!();
                println!("[Station]");
                println!(
                    "  Call sign:      {}",
                    config.station.mycall.clone().unwrap_or_else(unset)
                );
                println!(
                    "  Grid:           {}",
                    config.station.grid.clone().unwrap_or_else(unset)
                );
                println!();
                println!("[Entry]");
                println!("  Invalid input:  {:?}", config.entry.policy);
                println!("  Default mode:   {}", config.entry.default_mode);
                println!("  Default band:   {}", config.entry.default_band);
                println!("  Default QSO:    {}", config.entry.default_qso);
                println!();
                println!("[Export]");
                println!("  Program:        {}", config.export.program);
                println!(
                    "  Author:         {}",
                    config
                        .export
                        .author
                        .clone()
                        .unwrap_or_else(|| "(log call sign)".to_string())
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::from_file(&path) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
