//! Single-directory watch session using notify-rs.
//!
//! A session owns at most one live watch. Replacing the monitored directory
//! tears the old watch down completely (subscription closed, event loop
//! joined) before the new one is opened, so no event is ever attributed to
//! the wrong directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Event, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

use super::events::{discovered_in, DiscoveredFile};
use crate::error::WatchError;
use crate::{Error, Result};

/// Receiver of discovered files and watch failures.
///
/// Called from the event loop; implementations must not block.
pub trait DiscoverySink: Send + Sync + 'static {
    /// A file appeared in the monitored directory.
    fn discovered(&self, file: DiscoveredFile);

    /// The watch died and will not deliver further events.
    fn watch_failed(&self, _error: &WatchError) {}
}

impl DiscoverySink for mpsc::UnboundedSender<DiscoveredFile> {
    fn discovered(&self, file: DiscoveredFile) {
        let _ = self.send(file);
    }
}

/// Observable lifecycle of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// No watch is open.
    Stopped,
    /// Events from this directory are being delivered.
    Watching { path: PathBuf },
    /// The watch on this directory failed and must be restarted.
    Failed { path: PathBuf, reason: String },
}

struct ActiveWatch {
    root: PathBuf,
    // Owns the OS subscription; it closes when the loop exits.
    task: JoinHandle<()>,
    cancel: CancellationToken,
    // Cancels the loop if the session is dropped without `stop`.
    _guard: DropGuard,
}

/// Watches exactly one directory at a time.
pub struct WatchSession {
    sink: Arc<dyn DiscoverySink>,
    active: Mutex<Option<ActiveWatch>>,
    state: Arc<RwLock<SessionState>>,
}

impl WatchSession {
    /// Create a stopped session delivering into `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn DiscoverySink>) -> Self {
        Self {
            sink,
            active: Mutex::new(None),
            state: Arc::new(RwLock::new(SessionState::Stopped)),
        }
    }

    /// Start watching `path`, replacing any current watch.
    ///
    /// Returns the canonical directory now being watched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] if `path` is not an existing directory;
    /// the current watch, if any, keeps running. Returns [`Error::Watch`] if
    /// the directory could not be watched; the session is then failed.
    pub async fn start(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let root = validate_directory(path.as_ref())?;

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            teardown(previous).await;
        }

        match self.open(&root) {
            Ok(watch) => {
                *active = Some(watch);
                *self.state.write() = SessionState::Watching { path: root.clone() };
                tracing::info!(path = %root.display(), "Watching directory");
                Ok(root)
            }
            Err(e) => {
                *self.state.write() = SessionState::Failed {
                    path: root,
                    reason: e.to_string(),
                };
                Err(e.into())
            }
        }
    }

    /// Move the watch to `path`.
    ///
    /// The old watch stops delivering before the new one starts. An invalid
    /// `path` leaves the old watch running.
    ///
    /// # Errors
    ///
    /// Same as [`WatchSession::start`].
    pub async fn switch_to(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let from = self.watched_path();
        let root = self.start(path).await?;
        tracing::info!(from = ?from, to = %root.display(), "Switched monitored directory");
        Ok(root)
    }

    /// Close the watch and wait for the event loop to exit. Idempotent.
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        if let Some(watch) = active.take() {
            teardown(watch).await;
        }
        *self.state.write() = SessionState::Stopped;
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    /// True while events are being delivered.
    #[must_use]
    pub fn is_watching(&self) -> bool {
        matches!(*self.state.read(), SessionState::Watching { .. })
    }

    /// The directory currently being watched.
    #[must_use]
    pub fn watched_path(&self) -> Option<PathBuf> {
        match &*self.state.read() {
            SessionState::Watching { path } => Some(path.clone()),
            _ => None,
        }
    }

    fn open(&self, root: &Path) -> std::result::Result<ActiveWatch, WatchError> {
        let watch_failed = |e: notify::Error| WatchError::WatchFailed {
            path: root.display().to_string(),
            reason: e.to_string(),
        };

        // Each watch gets its own channel; dropping the receiver on teardown
        // discards anything the old subscription still emits.
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = raw_tx.send(res);
        })
        .map_err(watch_failed)?;

        watcher
            .watch(root, RecursiveMode::NonRecursive)
            .map_err(watch_failed)?;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(event_loop(
            root.to_path_buf(),
            raw_rx,
            cancel.clone(),
            Arc::clone(&self.sink),
            Arc::clone(&self.state),
            watcher,
        ));

        Ok(ActiveWatch {
            root: root.to_path_buf(),
            task,
            _guard: cancel.clone().drop_guard(),
            cancel,
        })
    }
}

/// Stop delivery, close the OS subscription and join the loop.
async fn teardown(watch: ActiveWatch) {
    let ActiveWatch {
        root,
        task,
        cancel,
        _guard,
    } = watch;

    cancel.cancel();
    if let Err(e) = task.await {
        tracing::warn!(path = %root.display(), error = %e, "Watch loop ended abnormally");
    }
    tracing::info!(path = %root.display(), "Stopped watching directory");
}

/// Deliver events until cancelled or the watch fails.
///
/// `subscription` is held for the life of the loop and dropped on every exit,
/// so a failed watch releases its OS resources without waiting for `stop`.
async fn event_loop<S: Send + 'static>(
    root: PathBuf,
    mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    cancel: CancellationToken,
    sink: Arc<dyn DiscoverySink>,
    state: Arc<RwLock<SessionState>>,
    subscription: S,
) {
    let _subscription = subscription;
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            next = events.recv() => match next {
                Some(Ok(event)) => {
                    for file in discovered_in(&root, &event) {
                        if cancel.is_cancelled() {
                            return;
                        }
                        tracing::debug!(path = %file.path().display(), "Discovered file");
                        sink.discovered(file);
                    }
                }
                Some(Err(e)) => {
                    let error = WatchError::Rearm {
                        path: root.display().to_string(),
                        reason: e.to_string(),
                    };
                    tracing::error!(error = %error, "Watch failed");
                    *state.write() = SessionState::Failed {
                        path: root.clone(),
                        reason: e.to_string(),
                    };
                    sink.watch_failed(&error);
                    break;
                }
                None => break,
            }
        }
    }
    tracing::debug!(path = %root.display(), "Watch loop exited");
}

/// Check that `path` is an existing directory and return its canonical form.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] otherwise.
pub fn validate_directory(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Error::invalid_path(path, "path is empty"));
    }
    let metadata = fs::metadata(path).map_err(|_| Error::invalid_path(path, "does not exist"))?;
    if !metadata.is_dir() {
        return Err(Error::invalid_path(path, "not a directory"));
    }
    fs::canonicalize(path).map_err(|e| Error::invalid_path(path, e.to_string()))
}
