//! Logging session.
//!
//! A [`Session`] owns the log store and the loaded snapshot and carries out
//! the operator's actions on them. It is always in one of three states:
//!
//! - **Idle**: no log is loaded.
//! - **Viewing**: a log is loaded and locked against edits. New contacts can
//!   be appended and the log can be exported.
//! - **Editing**: the log is unlocked. Cells can be changed and rows deleted
//!   in a working copy, which is written back on [`Session::save`] or thrown
//!   away on [`Session::cancel`].
//!
//! File actions (new, create, load, append, export) are refused while
//! editing so that unsaved edits are never silently lost.

use std::fmt;
use std::mem;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::export::{self, ExportHeader, ExportSummary};
use crate::fields::{self, InputPolicy};
use crate::qso::{Column, LogEntry, LogFile};
use crate::storage::schema::fingerprint;
use crate::storage::LogStore;
use crate::table::{LogTable, SortOrder};

/// Which state a session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No log loaded.
    Idle,
    /// A log is loaded and locked.
    Viewing,
    /// A log is loaded and unlocked for editing.
    Editing,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Viewing => write!(f, "viewing"),
            Self::Editing => write!(f, "editing"),
        }
    }
}

/// A loaded snapshot and its table.
#[derive(Debug)]
struct View {
    log: LogFile,
    table: LogTable,
    fingerprint: String,
}

impl View {
    fn new(log: LogFile) -> Self {
        let table = LogTable::from_log(&log);
        let fingerprint = fingerprint(&log);
        Self {
            log,
            table,
            fingerprint,
        }
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Viewing(View),
    Editing(View, EditBuffer),
}

/// Working copy of a log while it is unlocked.
///
/// Rows keep the sequence numbers they had when the log was unlocked, so a
/// row can be addressed the same way before and after other rows are
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    original: LogFile,
    mycall: String,
    grid: String,
    rows: Vec<(usize, LogEntry)>,
}

impl EditBuffer {
    fn new(log: &LogFile) -> Self {
        Self {
            original: log.clone(),
            mycall: log.mycall.clone(),
            grid: log.grid.clone(),
            rows: log
                .numbered()
                .map(|(seq, entry)| (seq, entry.clone()))
                .collect(),
        }
    }

    /// Operator call sign in the working copy.
    #[must_use]
    pub fn mycall(&self) -> &str {
        &self.mycall
    }

    /// Grid square in the working copy.
    #[must_use]
    pub fn grid(&self) -> &str {
        &self.grid
    }

    /// Working copy of an entry.
    #[must_use]
    pub fn entry(&self, seq: usize) -> Option<&LogEntry> {
        self.rows
            .iter()
            .find(|(row, _)| *row == seq)
            .map(|(_, entry)| entry)
    }

    /// Cells whose value differs from the value when the log was unlocked.
    #[must_use]
    pub fn changed_cells(&self) -> Vec<(usize, Column)> {
        let mut changed = Vec::new();
        for (seq, entry) in &self.rows {
            let Some(original) = self.original.log.get(seq - 1) else {
                continue;
            };
            for column in Column::FIELDS {
                if entry.cell(column) != original.cell(column) {
                    changed.push((*seq, column));
                }
            }
        }
        changed
    }

    /// Check if a single cell has been changed.
    #[must_use]
    pub fn is_changed(&self, seq: usize, column: Column) -> bool {
        match (self.entry(seq), self.original.log.get(seq.wrapping_sub(1))) {
            (Some(entry), Some(original)) => entry.cell(column) != original.cell(column),
            _ => false,
        }
    }

    /// Sequence numbers of deleted rows.
    #[must_use]
    pub fn deleted(&self) -> Vec<usize> {
        self.original
            .numbered()
            .map(|(seq, _)| seq)
            .filter(|seq| self.entry(*seq).is_none())
            .collect()
    }

    /// Check if the working copy differs from the unlocked log.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.mycall != self.original.mycall
            || self.grid != self.original.grid
            || self.rows.len() != self.original.len()
            || !self.changed_cells().is_empty()
    }

    fn entry_mut(&mut self, seq: usize) -> Result<&mut LogEntry> {
        self.rows
            .iter_mut()
            .find(|(row, _)| *row == seq)
            .map(|(_, entry)| entry)
            .ok_or(Error::RowNotFound { seq })
    }

    fn remove(&mut self, seq: usize) -> Result<LogEntry> {
        let index = self
            .rows
            .iter()
            .position(|(row, _)| *row == seq)
            .ok_or(Error::RowNotFound { seq })?;
        Ok(self.rows.remove(index).1)
    }

    fn to_log(&self) -> LogFile {
        LogFile {
            mycall: self.mycall.clone(),
            grid: self.grid.clone(),
            log: self.rows.iter().map(|(_, entry)| entry.clone()).collect(),
        }
    }
}

/// An operator's session with one log.
#[derive(Debug)]
pub struct Session {
    store: Option<Box<dyn LogStore>>,
    state: State,
    policy: InputPolicy,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(InputPolicy::default())
    }
}

impl Session {
    /// Create an idle session.
    #[must_use]
    pub fn new(policy: InputPolicy) -> Self {
        Self {
            store: None,
            state: State::Idle,
            policy,
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        match self.state {
            State::Idle => SessionState::Idle,
            State::Viewing(_) => SessionState::Viewing,
            State::Editing(..) => SessionState::Editing,
        }
    }

    /// The input policy used for edits.
    #[must_use]
    pub fn policy(&self) -> InputPolicy {
        self.policy
    }

    /// Where the current log is stored, if one is loaded.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        self.store.as_ref().map(|store| store.location())
    }

    /// The loaded log as last read from or written to the store.
    ///
    /// While editing this is the log as it was when unlocked; see
    /// [`Session::edit_buffer`] for the working copy.
    #[must_use]
    pub fn log(&self) -> Option<&LogFile> {
        self.view().map(|view| &view.log)
    }

    /// The table of the loaded log.
    #[must_use]
    pub fn table(&self) -> Option<&LogTable> {
        self.view().map(|view| &view.table)
    }

    /// Fingerprint of the loaded log.
    #[must_use]
    pub fn fingerprint(&self) -> Option<&str> {
        self.view().map(|view| view.fingerprint.as_str())
    }

    /// The working copy, while editing.
    #[must_use]
    pub fn edit_buffer(&self) -> Option<&EditBuffer> {
        match &self.state {
            State::Editing(_, buffer) => Some(buffer),
            _ => None,
        }
    }

    /// Check if there are unsaved edits.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.edit_buffer().is_some_and(EditBuffer::is_dirty)
    }

    /// Close the current log.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EditModeActive`] while editing.
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_not_editing("start a new log")?;
        self.state = State::Idle;
        self.store = None;
        debug!("Session reset");
        Ok(())
    }

    /// Create a new, empty log in a store and open it.
    ///
    /// # Errors
    ///
    /// Returns an error while editing, if the operator call sign or grid is
    /// missing or invalid, if the store already holds a log and `overwrite`
    /// is false, or if the log cannot be written.
    pub fn create(
        &mut self,
        store: impl LogStore + 'static,
        mycall: &str,
        grid: &str,
        overwrite: bool,
    ) -> Result<()> {
        self.ensure_not_editing("create a log")?;
        let mycall = fields::validate_mycall(mycall, self.policy)?;
        let grid = fields::validate_grid(grid)?;

        let mut store: Box<dyn LogStore> = Box::new(store);
        if store.exists() && !overwrite {
            return Err(Error::LogExists {
                path: PathBuf::from(store.location()),
            });
        }

        let log = LogFile::new(mycall, grid);
        store.save(&log)?;
        info!(mycall = %log.mycall, grid = %log.grid, "Created log at {}", store.location());
        self.store = Some(store);
        self.state = State::Viewing(View::new(log));
        Ok(())
    }

    /// Open the log held by a store.
    ///
    /// Returns the number of entries loaded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFileLoaded`] if the store holds no log yet, or an
    /// error while editing or if the log cannot be read.
    pub fn load(&mut self, store: impl LogStore + 'static) -> Result<usize> {
        self.ensure_not_editing("load a log")?;
        let store: Box<dyn LogStore> = Box::new(store);
        if !store.exists() {
            debug!("No log at {}", store.location());
            return Err(Error::NoFileLoaded);
        }
        let log = store.load()?;
        let count = log.len();
        self.store = Some(store);
        self.state = State::Viewing(View::new(log));
        Ok(count)
    }

    /// Append a contact to the log and write it.
    ///
    /// The log is re-read from the store first so the append applies to the
    /// latest snapshot. Returns the new entry's sequence number.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFileLoaded`] when idle, [`Error::EditModeActive`]
    /// while editing, or an error if the log cannot be read or written.
    pub fn append(&mut self, entry: LogEntry) -> Result<usize> {
        match self.state {
            State::Idle => return Err(Error::NoFileLoaded),
            State::Editing(..) => return Err(Error::edit_mode_active("add a contact")),
            State::Viewing(_) => {}
        }
        let store = self.store.as_mut().ok_or(Error::NoFileLoaded)?;
        let mut log = store.load()?;
        log.log.push(entry);
        store.save(&log)?;

        let seq = log.len();
        debug!(seq, "Appended entry");
        self.state = State::Viewing(View::new(log));
        Ok(seq)
    }

    /// Unlock the log for editing.
    ///
    /// Unlocking an already unlocked log keeps the current edits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFileLoaded`] when idle.
    pub fn unlock(&mut self) -> Result<()> {
        match mem::replace(&mut self.state, State::Idle) {
            State::Idle => Err(Error::NoFileLoaded),
            State::Viewing(view) => {
                let buffer = EditBuffer::new(&view.log);
                self.state = State::Editing(view, buffer);
                debug!("Log unlocked for editing");
                Ok(())
            }
            editing @ State::Editing(..) => {
                self.state = editing;
                Ok(())
            }
        }
    }

    /// Change one cell of the working copy.
    ///
    /// The input is validated under the session's policy; on failure the
    /// cell keeps its value. Returns the stored text.
    ///
    /// # Errors
    ///
    /// Returns an error when not editing, when no row has the sequence
    /// number, or when the input is invalid.
    pub fn edit_cell(&mut self, seq: usize, column: Column, input: &str) -> Result<String> {
        let policy = self.policy;
        let (view, buffer) = self.editing_mut()?;
        let value = fields::validate(column, input, policy)?;
        let entry = buffer.entry_mut(seq)?;
        entry.set_cell(column, &value)?;
        let updated = entry.clone();
        view.table.replace(seq, updated)?;
        debug!(seq, %column, value = %value, "Edited cell");
        Ok(value)
    }

    /// Change the operator call sign in the working copy.
    ///
    /// # Errors
    ///
    /// Returns an error when not editing or when the call sign is invalid.
    pub fn edit_mycall(&mut self, input: &str) -> Result<String> {
        let policy = self.policy;
        let (_, buffer) = self.editing_mut()?;
        buffer.mycall = fields::validate_mycall(input, policy)?;
        Ok(buffer.mycall.clone())
    }

    /// Change the grid square in the working copy.
    ///
    /// # Errors
    ///
    /// Returns an error when not editing or when the grid is invalid.
    pub fn edit_grid(&mut self, input: &str) -> Result<String> {
        let (_, buffer) = self.editing_mut()?;
        buffer.grid = fields::validate_grid(input)?;
        Ok(buffer.grid.clone())
    }

    /// Delete a row from the working copy.
    ///
    /// # Errors
    ///
    /// Returns an error when not editing or when no row has the sequence
    /// number.
    pub fn delete_row(&mut self, seq: usize) -> Result<LogEntry> {
        let (view, buffer) = self.editing_mut()?;
        let entry = buffer.remove(seq)?;
        view.table.remove(seq)?;
        debug!(seq, call = %entry.call, "Deleted row");
        Ok(entry)
    }

    /// Write the working copy and lock the log.
    ///
    /// Entries are put in chronological order and renumbered from 1. If the
    /// stored log changed since it was loaded, a warning is logged and the
    /// working copy is written anyway.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotEditing`] when not editing, or an error if the
    /// log cannot be written. On failure the session stays in edit mode.
    pub fn save(&mut self) -> Result<()> {
        let (view, buffer) = self.take_editing()?;
        let mut log = buffer.to_log();
        log.sort_chronologically();

        match self.write_back(&view, &log) {
            Ok(()) => {
                info!(entries = log.len(), "Saved edits");
                self.state = State::Viewing(View::new(log));
                Ok(())
            }
            Err(err) => {
                self.state = State::Editing(view, buffer);
                Err(err)
            }
        }
    }

    /// Discard the working copy and reload the log from the store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotEditing`] when not editing, or an error if the
    /// log cannot be read. On failure the session stays in edit mode.
    pub fn cancel(&mut self) -> Result<()> {
        let (view, buffer) = self.take_editing()?;
        let reloaded = self
            .store
            .as_ref()
            .ok_or(Error::NoFileLoaded)
            .and_then(|store| store.load());
        match reloaded {
            Ok(log) => {
                debug!("Discarded edits");
                self.state = State::Viewing(View::new(log));
                Ok(())
            }
            Err(err) => {
                self.state = State::Editing(view, buffer);
                Err(err)
            }
        }
    }

    /// Check if the stored log differs from the loaded one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFileLoaded`] when idle, or an error if the stored
    /// log cannot be read.
    pub fn has_external_changes(&self) -> Result<bool> {
        let view = self.view().ok_or(Error::NoFileLoaded)?;
        let store = self.store.as_ref().ok_or(Error::NoFileLoaded)?;
        if !store.exists() {
            return Ok(true);
        }
        Ok(fingerprint(&store.load()?) != view.fingerprint)
    }

    /// Filter the table to rows containing `term`.
    ///
    /// Returns the number of matches. When nothing matches the table is
    /// left unfiltered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFileLoaded`] when idle or [`Error::EmptySearch`]
    /// for a blank term.
    pub fn search(&mut self, term: &str) -> Result<usize> {
        self.view_mut()?.table.search(term)
    }

    /// Remove the search filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFileLoaded`] when idle.
    pub fn clear_search(&mut self) -> Result<()> {
        self.view_mut()?.table.clear_search();
        Ok(())
    }

    /// Sort the table by a column.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFileLoaded`] when idle.
    pub fn sort_by(&mut self, column: Column, order: SortOrder) -> Result<()> {
        self.view_mut()?.table.sort_by(column, order);
        Ok(())
    }

    /// Export the log to an ADIF file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFileLoaded`] when idle, [`Error::EditModeActive`]
    /// while editing, or an error if the export cannot be written.
    pub fn export(
        &self,
        target: &Path,
        header: &ExportHeader,
        now: DateTime<Utc>,
    ) -> Result<ExportSummary> {
        match &self.state {
            State::Idle => Err(Error::NoFileLoaded),
            State::Editing(..) => Err(Error::edit_mode_active("export")),
            State::Viewing(view) => export::export_adif(&view.log, target, header, now),
        }
    }

    fn view(&self) -> Option<&View> {
        match &self.state {
            State::Idle => None,
            State::Viewing(view) | State::Editing(view, _) => Some(view),
        }
    }

    fn view_mut(&mut self) -> Result<&mut View> {
        match &mut self.state {
            State::Idle => Err(Error::NoFileLoaded),
            State::Viewing(view) | State::Editing(view, _) => Ok(view),
        }
    }

    fn editing_mut(&mut self) -> Result<(&mut View, &mut EditBuffer)> {
        match &mut self.state {
            State::Idle => Err(Error::NoFileLoaded),
            State::Viewing(_) => Err(Error::NotEditing),
            State::Editing(view, buffer) => Ok((view, buffer)),
        }
    }

    fn take_editing(&mut self) -> Result<(View, EditBuffer)> {
        match mem::replace(&mut self.state, State::Idle) {
            State::Editing(view, buffer) => Ok((view, buffer)),
            other => {
                let err = if matches!(other, State::Idle) {
                    Error::NoFileLoaded
                } else {
                    Error::NotEditing
                };
                self.state = other;
                Err(err)
            }
        }
    }

    fn ensure_not_editing(&self, action: &'static str) -> Result<()> {
        if matches!(self.state, State::Editing(..)) {
            return Err(Error::edit_mode_active(action));
        }
        Ok(())
    }

    fn write_back(&mut self, view: &View, log: &LogFile) -> Result<()> {
        let store = self.store.as_mut().ok_or(Error::NoFileLoaded)?;
        if store.exists() {
            match store.load() {
                Ok(on_disk) if fingerprint(&on_disk) != view.fingerprint => {
                    warn!(
                        "Log at {} changed since it was loaded, overwriting",
                        store.location()
                    );
                }
                Ok(_) => {}
                Err(err) => warn!("Could not re-read log before saving: {err}"),
            }
        }
        store.save(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qso::tests::entry;
    use crate::qso::Band;
    use crate::storage::{JsonFileStore, MemoryStore};
    use chrono::TimeZone;

    fn sample() -> LogFile {
        let mut log = LogFile::new("N0CALL", "FN31");
        log.log.push(entry("2024-03-01", "14:02", "W1AW"));
        log.log.push(entry("2024-03-01", "14:10", "K1ABC"));
        log
    }

    fn viewing() -> Session {
        let mut session = Session::default();
        session.load(MemoryStore::with_log(sample())).unwrap();
        session
    }

    fn header() -> ExportHeader {
        ExportHeader {
            program: "qsolog".to_string(),
            author: "N0CALL".to_string(),
        }
    }

    #[test]
    fn test_starts_idle() {
        let session = Session::default();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.log().is_none());
        assert!(session.location().is_none());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_idle_refuses_log_actions() {
        let mut session = Session::default();
        assert!(matches!(
            session.append(entry("2024-03-01", "14:02", "W1AW")),
            Err(Error::NoFileLoaded)
        ));
        assert!(matches!(session.unlock(), Err(Error::NoFileLoaded)));
        assert!(matches!(session.search("W1AW"), Err(Error::NoFileLoaded)));
        assert!(matches!(session.save(), Err(Error::NoFileLoaded)));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_create_requires_operator() {
        let mut session = Session::default();
        assert!(matches!(
            session.create(MemoryStore::new(), "", "FN31", false),
            Err(Error::MissingField { field: "mycall" })
        ));
        assert!(matches!(
            session.create(MemoryStore::new(), "N0CALL", "", false),
            Err(Error::MissingField { field: "grid" })
        ));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_create_writes_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        let mut session = Session::default();
        session
            .create(JsonFileStore::new(&path), "n0call", "fn31", false)
            .unwrap();

        assert_eq!(session.state(), SessionState::Viewing);
        let on_disk = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(on_disk, LogFile::new("N0CALL", "FN31"));
        assert_eq!(session.location(), Some(path.display().to_string()));
    }

    #[test]
    fn test_create_refuses_existing_log() {
        let mut session = Session::default();
        let err = session
            .create(MemoryStore::with_log(sample()), "N0CALL", "FN31", false)
            .unwrap_err();
        assert!(matches!(err, Error::LogExists { .. }));

        session
            .create(MemoryStore::with_log(sample()), "N0CALL", "FN31", true)
            .unwrap();
        assert!(session.log().unwrap().is_empty());
    }

    #[test]
    fn test_load() {
        let mut session = Session::default();
        let count = session.load(MemoryStore::with_log(sample())).unwrap();
        assert_eq!(count, 2);
        assert_eq!(session.state(), SessionState::Viewing);
        assert_eq!(session.table().unwrap().rows()[0].entry.call, "K1ABC");
    }

    #[test]
    fn test_load_missing_log_is_no_file_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::default();

        let err = session
            .load(JsonFileStore::new(dir.path().join("never-created.json")))
            .unwrap_err();
        assert!(matches!(err, Error::NoFileLoaded));
        assert!(err.is_user_error());
        assert_eq!(session.state(), SessionState::Idle);

        assert!(matches!(
            session.load(MemoryStore::new()),
            Err(Error::NoFileLoaded)
        ));
    }

    #[test]
    fn test_load_malformed_log_is_not_a_user_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        std::fs::write(&path, "not json").unwrap();

        let err = Session::default()
            .load(JsonFileStore::new(&path))
            .unwrap_err();
        assert!(matches!(err, Error::LogParse { .. }));
        assert!(!err.is_user_error());
    }

    #[test]
    fn test_append_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        let mut session = Session::default();
        session
            .create(JsonFileStore::new(&path), "N0CALL", "FN31", false)
            .unwrap();

        let seq = session.append(entry("2024-03-01", "14:02", "W1AW")).unwrap();
        assert_eq!(seq, 1);
        let seq = session.append(entry("2024-03-01", "14:05", "K1ABC")).unwrap();
        assert_eq!(seq, 2);

        let on_disk = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(on_disk.len(), 2);
        assert_eq!(session.log(), Some(&on_disk));
        assert!(!session.has_external_changes().unwrap());
    }

    #[test]
    fn test_append_rereads_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        let mut other = JsonFileStore::new(&path);
        other.save(&sample()).unwrap();

        let mut session = Session::default();
        session.load(JsonFileStore::new(&path)).unwrap();

        let mut changed = sample();
        changed.log.push(entry("2024-03-01", "15:00", "VE3XYZ"));
        other.save(&changed).unwrap();
        assert!(session.has_external_changes().unwrap());

        let seq = session.append(entry("2024-03-01", "15:05", "G4ABC")).unwrap();
        assert_eq!(seq, 4);
    }

    #[test]
    fn test_editing_refuses_file_actions() {
        let mut session = viewing();
        session.unlock().unwrap();
        assert_eq!(session.state(), SessionState::Editing);

        let err = session
            .append(entry("2024-03-01", "14:02", "W1AW"))
            .unwrap_err();
        assert!(err.is_edit_mode_active());
        assert!(session.reset().unwrap_err().is_edit_mode_active());
        assert!(session
            .load(MemoryStore::with_log(sample()))
            .unwrap_err()
            .is_edit_mode_active());
        assert!(session
            .create(MemoryStore::new(), "N0CALL", "FN31", false)
            .unwrap_err()
            .is_edit_mode_active());

        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        assert!(session
            .export(&dir.path().join("out"), &header(), now)
            .unwrap_err()
            .is_edit_mode_active());
        assert_eq!(session.state(), SessionState::Editing);
    }

    #[test]
    fn test_edit_requires_unlock() {
        let mut session = viewing();
        assert!(matches!(
            session.edit_cell(1, Column::Call, "W1AX"),
            Err(Error::NotEditing)
        ));
        assert!(matches!(session.delete_row(1), Err(Error::NotEditing)));
        assert!(matches!(session.cancel(), Err(Error::NotEditing)));
        assert_eq!(session.state(), SessionState::Viewing);
    }

    #[test]
    fn test_edit_cell_tracks_changes() {
        let mut session = viewing();
        session.unlock().unwrap();

        let value = session.edit_cell(1, Column::Call, "w1ax").unwrap();
        assert_eq!(value, "W1AX");
        let buffer = session.edit_buffer().unwrap();
        assert!(buffer.is_changed(1, Column::Call));
        assert_eq!(buffer.changed_cells(), vec![(1, Column::Call)]);
        assert!(session.is_dirty());
        assert_eq!(session.table().unwrap().row(1).unwrap().entry.call, "W1AX");

        session.edit_cell(1, Column::Call, "W1AW").unwrap();
        assert!(!session.edit_buffer().unwrap().is_changed(1, Column::Call));
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_invalid_edit_keeps_value() {
        let mut session = viewing();
        session.unlock().unwrap();

        let err = session.edit_cell(1, Column::Date, "2024-02-30").unwrap_err();
        assert!(matches!(err, Error::InvalidField { field: "date", .. }));
        assert!(session.edit_cell(1, Column::Band, "11m").is_err());

        let buffer = session.edit_buffer().unwrap();
        assert_eq!(buffer.entry(1).unwrap().date, "2024-03-01");
        assert_eq!(buffer.entry(1).unwrap().band, Band::M20);
        assert!(!buffer.is_dirty());
    }

    #[test]
    fn test_clamp_policy_applies_to_edits() {
        let mut session = Session::new(InputPolicy::Clamp);
        session.load(MemoryStore::with_log(sample())).unwrap();
        session.unlock().unwrap();
        let value = session.edit_cell(1, Column::Date, "2024-02-30").unwrap();
        assert_eq!(value, "2024-02-29");
    }

    #[test]
    fn test_edit_unknown_row() {
        let mut session = viewing();
        session.unlock().unwrap();
        assert!(matches!(
            session.edit_cell(9, Column::Call, "W1AW"),
            Err(Error::RowNotFound { seq: 9 })
        ));
    }

    #[test]
    fn test_edit_cancel_restores_disk_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        JsonFileStore::new(&path).save(&sample()).unwrap();

        let mut session = Session::default();
        session.load(JsonFileStore::new(&path)).unwrap();
        session.unlock().unwrap();
        session.edit_cell(2, Column::Freq, "7.074").unwrap();
        session.edit_mycall("K9XYZ").unwrap();
        session.delete_row(1).unwrap();
        assert!(session.is_dirty());
        let buffer = session.edit_buffer().unwrap();
        assert_eq!(buffer.deleted(), vec![1]);
        assert!(buffer.entry(1).is_none());

        session.cancel().unwrap();
        assert_eq!(session.state(), SessionState::Viewing);
        let on_disk = JsonFileStore::new(&path).load().unwrap();
        assert_eq!(session.log(), Some(&on_disk));
        assert_eq!(session.table().unwrap().len(), 2);
    }

    #[test]
    fn test_save_sorts_and_renumbers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        let mut log = sample();
        log.log.push(entry("2024-03-01", "14:20", "VE3XYZ"));
        JsonFileStore::new(&path).save(&log).unwrap();

        let mut session = Session::default();
        session.load(JsonFileStore::new(&path)).unwrap();
        session.unlock().unwrap();
        session.edit_cell(1, Column::Time, "14:30").unwrap();
        session.delete_row(2).unwrap();
        session.edit_grid("em12").unwrap();
        assert_eq!(session.edit_buffer().unwrap().deleted(), vec![2]);
        assert!(matches!(
            session.delete_row(2),
            Err(Error::RowNotFound { seq: 2 })
        ));
        session.save().unwrap();

        assert_eq!(session.state(), SessionState::Viewing);
        let on_disk = JsonFileStore::new(&path).load().unwrap();
        let calls: Vec<&str> = on_disk.log.iter().map(|e| e.call.as_str()).collect();
        assert_eq!(calls, ["VE3XYZ", "W1AW"]);
        assert_eq!(on_disk.grid, "EM12");

        let table = session.table().unwrap();
        let seqs: Vec<usize> = table.rows().iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![2, 1]);
        assert_eq!(table.row(2).unwrap().entry.call, "W1AW");
    }

    #[test]
    fn test_save_orders_chronologically() {
        let mut session = viewing();
        session.unlock().unwrap();
        session.edit_cell(2, Column::Date, "2024-02-01").unwrap();
        session.save().unwrap();

        let log = session.log().unwrap();
        assert_eq!(log.log[0].call, "K1ABC");
        assert_eq!(log.log[1].call, "W1AW");
    }

    #[test]
    fn test_save_round_trip_preserves_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        JsonFileStore::new(&path).save(&sample()).unwrap();

        let mut session = Session::default();
        session.load(JsonFileStore::new(&path)).unwrap();
        session.unlock().unwrap();
        session.save().unwrap();

        assert_eq!(JsonFileStore::new(&path).load().unwrap(), sample());
    }

    #[test]
    fn test_save_overwrites_external_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.json");
        let mut other = JsonFileStore::new(&path);
        other.save(&sample()).unwrap();

        let mut session = Session::default();
        session.load(JsonFileStore::new(&path)).unwrap();
        session.unlock().unwrap();
        other.save(&LogFile::new("N0CALL", "FN31")).unwrap();

        session.save().unwrap();
        assert_eq!(JsonFileStore::new(&path).load().unwrap().len(), 2);
    }

    #[test]
    fn test_unlock_twice_keeps_edits() {
        let mut session = viewing();
        session.unlock().unwrap();
        session.edit_cell(1, Column::Call, "W1AX").unwrap();
        session.unlock().unwrap();
        assert!(session.is_dirty());
    }

    #[test]
    fn test_search_and_sort_through_session() {
        let mut session = viewing();
        assert_eq!(session.search("k1abc").unwrap(), 1);
        assert!(matches!(session.search(""), Err(Error::EmptySearch)));
        session.clear_search().unwrap();

        session.sort_by(Column::Seq, SortOrder::Ascending).unwrap();
        let first = &session.table().unwrap().rows()[0];
        assert_eq!(first.seq, 1);
    }

    #[test]
    fn test_export_while_viewing() {
        let dir = tempfile::tempdir().unwrap();
        let session = viewing();
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let summary = session
            .export(&dir.path().join("out"), &header(), now)
            .unwrap();
        assert_eq!(summary.written, 2);
        assert!(summary.path.ends_with("out.adi"));
    }

    #[test]
    fn test_reset() {
        let mut session = viewing();
        session.reset().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.location().is_none());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Editing.to_string(), "editing");
    }
}
