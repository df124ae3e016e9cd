//! Error types for qsolog.
//!
//! This module defines all error types used throughout the qsolog crate.
//! User-facing variants carry enough context to be shown to the operator as a
//! warning; infrastructure variants wrap the underlying cause.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for qsolog operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Input Errors ===
    /// A required field was left empty.
    #[error("please fill in the {field} field")]
    MissingField {
        /// Name of the empty field.
        field: &'static str,
    },

    /// A field value failed validation and was not applied.
    #[error("invalid {field} '{value}': {reason}")]
    InvalidField {
        /// Field or column the value was entered into.
        field: &'static str,
        /// The rejected input text.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A search was requested without a search term.
    #[error("please enter a search term")]
    EmptySearch,

    // === Session Errors ===
    /// An operation needs an open log file but none is loaded.
    #[error("no log file loaded, create or load a file first")]
    NoFileLoaded,

    /// A file operation was attempted while edit mode is active.
    #[error("cannot {action} while in edit mode, save or cancel edits first")]
    EditModeActive {
        /// The operation that was refused.
        action: &'static str,
    },

    /// An edit operation was attempted outside of edit mode.
    #[error("log is locked, unlock it for editing first")]
    NotEditing,

    /// No table row carries the given sequence number.
    #[error("no entry #{seq:04} in the log")]
    RowNotFound {
        /// The requested sequence number.
        seq: usize,
    },

    /// Refused to overwrite an existing log file.
    #[error("log file already exists at {path}")]
    LogExists {
        /// Path of the existing file.
        path: PathBuf,
    },

    // === Storage Errors ===
    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Path of the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        /// Path of the file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The log document could not be parsed.
    #[error("malformed log file {path}: {source}")]
    LogParse {
        /// Path of the log file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for qsolog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a field validation error.
    #[must_use]
    pub fn invalid_field(
        field: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an edit-mode refusal for the given action.
    #[must_use]
    pub fn edit_mode_active(action: &'static str) -> Self {
        Self::EditModeActive { action }
    }

    /// Check if this error is a warning for the operator rather than a fault.
    ///
    /// These are the conditions the operator can correct by changing their
    /// input or finishing the current edit session.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::MissingField { .. }
                | Self::InvalidField { .. }
                | Self::EmptySearch
                | Self::NoFileLoaded
                | Self::EditModeActive { .. }
                | Self::NotEditing
                | Self::RowNotFound { .. }
                | Self::LogExists { .. }
        )
    }

    /// Check if this error was caused by edit mode being active.
    #[must_use]
    pub fn is_edit_mode_active(&self) -> bool {
        matches!(self, Self::EditModeActive { .. })
    }
}
