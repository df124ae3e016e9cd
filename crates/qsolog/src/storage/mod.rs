//! Storage layer for qsolog.
//!
//! A log is persisted as a whole snapshot: every load reads the complete
//! document and every save replaces it. The [`LogStore`] trait is the only
//! way the rest of the crate touches persistence, so the backing store can
//! change without affecting the session logic.

pub mod schema;

use std::fmt;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::qso::LogFile;

/// Load/save access to a log snapshot.
pub trait LogStore: fmt::Debug {
    /// Human-readable location of the snapshot, for messages.
    fn location(&self) -> String;

    /// Check if a snapshot has been saved.
    fn exists(&self) -> bool;

    /// Read the complete snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is missing or cannot be read.
    fn load(&self) -> Result<LogFile>;

    /// Replace the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn save(&mut self, log: &LogFile) -> Result<()>;
}

/// A log stored as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    /// Path to the log file.
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store for the given path. Nothing is read or written yet.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the path to the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogStore for JsonFileStore {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<LogFile> {
        debug!("Loading log from {}", self.path.display());
        let text = fs::read_to_string(&self.path).map_err(|source| Error::FileRead {
            path: self.path.clone(),
            source,
        })?;
        let log = schema::from_json(&text).map_err(|source| Error::LogParse {
            path: self.path.clone(),
            source,
        })?;
        info!(
            entries = log.len(),
            "Loaded log from {}",
            self.path.display()
        );
        Ok(log)
    }

    fn save(&mut self, log: &LogFile) -> Result<()> {
        let text = schema::to_json(log)?;
        write_atomic(&self.path, text.as_bytes())?;
        info!(entries = log.len(), "Saved log to {}", self.path.display());
        Ok(())
    }
}

/// Replace a file's contents in one step.
///
/// The contents go to a temporary sibling file which is then renamed over
/// the target, so readers see either the old file or the new one. Parent
/// directories are created as needed.
///
/// # Errors
///
/// Returns an error if a directory cannot be created or the file cannot be
/// written.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("log");
    let tmp = path.with_file_name(format!(".{file_name}.tmp.{}", std::process::id()));
    let write_err = |source| Error::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    {
        let mut file = File::create(&tmp).map_err(write_err)?;
        file.write_all(contents).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
    }
    if let Err(source) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(source));
    }
    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// A log kept in memory, for tests and front ends without a file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Option<LogFile>,
    saves: usize,
}

impl MemoryStore {
    /// Create an empty store with no snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding a snapshot.
    #[must_use]
    pub fn with_log(log: LogFile) -> Self {
        Self {
            snapshot: Some(log),
            saves: 0,
        }
    }

    /// Number of times the snapshot has been saved.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl LogStore for MemoryStore {
    fn location(&self) -> String {
        ":memory:".to_string()
    }

    fn exists(&self) -> bool {
        self.snapshot.is_some()
    }

    fn load(&self) -> Result<LogFile> {
        self.snapshot.clone().ok_or_else(|| Error::FileRead {
            path: PathBuf::from(":memory:"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no snapshot saved"),
        })
    }

    fn save(&mut self, log: &LogFile) -> Result<()> {
        self.snapshot = Some(log.clone());
        self.saves += 1;
        Ok(())
    }
}
