//! Error types and Result aliases for dropsort.
//!
//! This module defines the error hierarchy used throughout the crate.
//! Operations that the user drives return [`Result<T>`]. The path store and
//! the file router report their own [`PersistenceError`] and
//! [`RouteFailure`], which callers handle in place rather than propagate.

use std::path::Path;

use thiserror::Error;

/// Result type alias using dropsort's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dropsort operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A monitored or destination path is not an existing directory.
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// Destination set mutation rejected.
    #[error("destination error: {0}")]
    Destination(#[from] DestinationError),

    /// File watching error.
    #[error("watch error: {0}")]
    Watch(#[from] WatchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Destination set errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DestinationError {
    /// The destination is already in the set.
    #[error("'{0}' is already a destination")]
    Duplicate(String),

    /// The destination is not in the set.
    #[error("'{0}' is not a destination")]
    Unknown(String),
}

/// File watcher errors.
#[derive(Error, Debug, Clone)]
pub enum WatchError {
    /// Failed to open a watch on the path.
    #[error("failed to watch path '{path}': {reason}")]
    WatchFailed { path: String, reason: String },

    /// The watch primitive failed while delivering events; the handle is dead.
    #[error("watch on '{path}' stopped: {reason}")]
    Rearm { path: String, reason: String },
}

/// Persistence errors for the path store.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Failed to read a persisted file.
    #[error("failed to read '{file}': {reason}")]
    Read { file: String, reason: String },

    /// Failed to write a persisted file.
    #[error("failed to write '{file}': {reason}")]
    Write { file: String, reason: String },
}

/// Reasons a file could not be routed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteFailure {
    /// The requested file name cannot name a file inside the destination.
    #[error("invalid file name '{0}'")]
    InvalidName(String),

    /// The discovered file is gone.
    #[error("source file '{0}' no longer exists")]
    SourceMissing(String),

    /// The destination directory does not exist.
    #[error("destination directory '{0}' does not exist")]
    DestinationMissing(String),

    /// A file already exists at the target path.
    #[error("'{0}' already exists")]
    TargetExists(String),

    /// The platform refused the rename.
    #[error("move refused: {reason}")]
    Refused { reason: String },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid path error.
    pub fn invalid_path(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.as_ref().display().to_string(),
            reason: reason.into(),
        }
    }
}

impl PersistenceError {
    /// Create a read error for `file`.
    pub fn read(file: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::Read {
            file: file.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a write error for `file`.
    pub fn write(file: impl AsRef<Path>, reason: impl ToString) -> Self {
        Self::Write {
            file: file.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }
}
