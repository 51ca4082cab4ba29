//! Flat-file persistence of the monitored path and destination list.
//!
//! Two text files live in the data directory:
//! - `monitored_path.txt`: a single line with the absolute monitored path
//! - `directories.txt`: one destination directory per line
//!
//! Loading never fails; missing or unreadable state falls back to defaults.
//! Saving reports errors but the caller's in-memory state stays authoritative.

mod destinations;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub use destinations::{normalize_destination, DestinationSet};

use crate::config::Config;
use crate::error::PersistenceError;

/// State restored at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredState {
    /// Directory to monitor.
    pub monitored_path: PathBuf,
    /// Candidate destinations.
    pub destinations: DestinationSet,
}

/// Loads and saves persisted paths.
#[derive(Debug, Clone)]
pub struct PathStore {
    directories_file: PathBuf,
    monitored_path_file: PathBuf,
}

impl PathStore {
    /// Create a store rooted in the configured data directory.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            directories_file: config.directories_file(),
            monitored_path_file: config.monitored_path_file(),
        }
    }

    /// Load the monitored path and destinations, falling back to defaults for
    /// whatever is missing or unreadable.
    #[must_use]
    pub fn load(&self) -> StoredState {
        let monitored_path = match self.load_monitored_path() {
            Ok(Some(path)) => path,
            Ok(None) => {
                tracing::info!("No monitored path saved, using default");
                default_monitored_path()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to default monitored path");
                default_monitored_path()
            }
        };

        let destinations = match self.load_destinations() {
            Ok(Some(set)) => set,
            Ok(None) => {
                tracing::info!("No destination list saved, using defaults");
                default_destinations()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to default destinations");
                default_destinations()
            }
        };

        tracing::debug!(
            monitored = %monitored_path.display(),
            destinations = destinations.len(),
            "Loaded persisted state"
        );

        StoredState {
            monitored_path,
            destinations,
        }
    }

    /// Persist the monitored path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_monitored_path(&self, path: &Path) -> Result<(), PersistenceError> {
        write_file(
            &self.monitored_path_file,
            &format!("{}\n", path.display()),
        )
    }

    /// Persist the destination list, one entry per line.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_destinations(&self, set: &DestinationSet) -> Result<(), PersistenceError> {
        let mut contents = String::new();
        for entry in set.iter() {
            contents.push_str(entry);
            contents.push('\n');
        }
        write_file(&self.directories_file, &contents)
    }

    fn load_monitored_path(&self) -> Result<Option<PathBuf>, PersistenceError> {
        let Some(contents) = read_file(&self.monitored_path_file)? else {
            return Ok(None);
        };

        let line = contents.lines().next().map(str::trim).unwrap_or_default();
        if line.is_empty() {
            return Err(PersistenceError::read(
                &self.monitored_path_file,
                "file is empty",
            ));
        }
        Ok(Some(PathBuf::from(line)))
    }

    fn load_destinations(&self) -> Result<Option<DestinationSet>, PersistenceError> {
        Ok(read_file(&self.directories_file)?
            .map(|contents| DestinationSet::from_entries(contents.lines())))
    }
}

/// `None` when the file does not exist.
fn read_file(path: &Path) -> Result<Option<String>, PersistenceError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PersistenceError::read(path, e)),
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PersistenceError::write(path, e))?;
    }
    fs::write(path, contents).map_err(|e| PersistenceError::write(path, e))?;
    tracing::debug!(file = %path.display(), "Saved");
    Ok(())
}

/// The user's download directory, else their home, else the working directory.
#[must_use]
pub fn default_monitored_path() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Documents, desktop and pictures, as far as the platform knows them.
#[must_use]
pub fn default_destinations() -> DestinationSet {
    let candidates = [dirs::document_dir(), dirs::desktop_dir(), dirs::picture_dir()];
    DestinationSet::from_entries(
        candidates
            .into_iter()
            .flatten()
            .map(|p| p.display().to_string()),
    )
}
