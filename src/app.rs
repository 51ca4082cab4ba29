//! Application state and user operations.
//!
//! [`App`] is the single owner of the monitored path and destination set.
//! Every mutation validates first, updates memory, then persists. A failed
//! save is reported but never undoes the in-memory change.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::dispatch::{DispatchGate, DispatchStatsSnapshot, Prompter, SharedDestinations};
use crate::error::{DestinationError, PersistenceError};
use crate::store::{DestinationSet, PathStore, StoredState};
use crate::watcher::{validate_directory, SessionState, WatchSession};
use crate::Result;

/// Point-in-time view of the application.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub monitored_path: PathBuf,
    pub session: SessionState,
    pub routing: bool,
    pub destinations: DestinationSet,
    pub stats: DispatchStatsSnapshot,
}

/// The running application.
pub struct App {
    store: PathStore,
    monitored: RwLock<PathBuf>,
    destinations: SharedDestinations,
    session: WatchSession,
    gate: DispatchGate,
    prompter: Arc<dyn Prompter>,
}

impl App {
    /// Load persisted state and wire the watch session to the dispatch gate.
    ///
    /// Monitoring is not started.
    pub fn new(store: PathStore, prompter: Arc<dyn Prompter>) -> Self {
        let StoredState {
            monitored_path,
            destinations,
        } = store.load();

        let destinations = Arc::new(RwLock::new(destinations));
        let gate = DispatchGate::new(Arc::clone(&destinations), Arc::clone(&prompter));
        let session = WatchSession::new(Arc::new(gate.clone()));

        Self {
            store,
            monitored: RwLock::new(monitored_path),
            destinations,
            session,
            gate,
            prompter,
        }
    }

    /// Start watching the monitored path.
    ///
    /// # Errors
    ///
    /// Returns an error if the monitored path is not a directory or cannot be
    /// watched.
    pub async fn start_monitoring(&self) -> Result<PathBuf> {
        let path = self.monitored_path();
        self.session.start(&path).await
    }

    /// Stop watching. Any open routing sequence runs to completion.
    pub async fn stop_monitoring(&self) {
        self.session.stop().await;
    }

    /// Change the monitored directory, moving the live watch if there is one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidPath`] and keeps the current path if
    /// `raw` is not an existing directory. Returns a watch error if the new
    /// directory cannot be watched; the current path is then kept too.
    pub async fn set_monitored_path(&self, raw: &str) -> Result<PathBuf> {
        let path = validate_directory(Path::new(raw.trim()))?;

        if self.session.is_watching() {
            self.session.switch_to(&path).await?;
        }

        *self.monitored.write() = path.clone();
        self.report_save(self.store.save_monitored_path(&path));
        tracing::info!(path = %path.display(), "Monitored path changed");
        Ok(path)
    }

    /// Add an existing directory to the destination set.
    ///
    /// Returns the updated destination list.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidPath`] if `raw` is not a directory, or
    /// [`DestinationError::Duplicate`] if it is already present.
    pub fn add_destination(&self, raw: &str) -> Result<DestinationSet> {
        let path = validate_directory(Path::new(raw.trim()))?;

        let snapshot = {
            let mut set = self.destinations.write();
            let added = set.insert(&path.display().to_string())?;
            tracing::info!(destination = %added, "Destination added");
            set.clone()
        };

        self.report_save(self.store.save_destinations(&snapshot));
        Ok(snapshot)
    }

    /// Remove a destination.
    ///
    /// `raw` may be written as listed or as any path resolving to the same
    /// directory. Returns the updated destination list.
    ///
    /// # Errors
    ///
    /// Returns [`DestinationError::Unknown`] if it is not in the set.
    pub fn remove_destination(&self, raw: &str) -> Result<DestinationSet> {
        let snapshot = {
            let mut set = self.destinations.write();
            let removed = match set.remove(raw) {
                Ok(removed) => removed,
                Err(DestinationError::Unknown(listed)) => {
                    let resolved = validate_directory(Path::new(raw.trim()))
                        .map_err(|_| DestinationError::Unknown(listed.clone()))?;
                    set.remove(&resolved.display().to_string())
                        .map_err(|_| DestinationError::Unknown(listed))?
                }
                Err(e) => return Err(e.into()),
            };
            tracing::info!(destination = %removed, "Destination removed");
            set.clone()
        };

        self.report_save(self.store.save_destinations(&snapshot));
        Ok(snapshot)
    }

    /// The directory that is, or would be, monitored.
    #[must_use]
    pub fn monitored_path(&self) -> PathBuf {
        self.monitored.read().clone()
    }

    #[must_use]
    pub fn destinations(&self) -> DestinationSet {
        self.destinations.read().clone()
    }

    #[must_use]
    pub fn is_monitoring(&self) -> bool {
        self.session.is_watching()
    }

    #[must_use]
    pub fn status(&self) -> Status {
        Status {
            monitored_path: self.monitored_path(),
            session: self.session.state(),
            routing: self.gate.is_busy(),
            destinations: self.destinations(),
            stats: self.gate.stats(),
        }
    }

    fn report_save(&self, result: std::result::Result<(), PersistenceError>) {
        if let Err(e) = result {
            tracing::warn!(error = %e, "Could not save state");
            self.prompter
                .notify(&format!("Change applied but not saved: {e}"));
        }
    }
}
