//! Single-flight gate for interactive routing.
//!
//! At most one routing sequence runs at a time. Files discovered while a
//! sequence is open are dropped rather than queued: the user is already
//! looking at a prompt and a backlog of dialogs is worse than a missed file,
//! which stays in the monitored directory anyway.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use super::prompt::Prompter;
use super::router::{target_file_name, FileRouter};
use crate::error::{RouteFailure, WatchError};
use crate::store::DestinationSet;
use crate::watcher::{split_extension, DiscoveredFile, DiscoverySink};

/// Destination set shared between the owner that mutates it and the gate.
pub type SharedDestinations = Arc<RwLock<DestinationSet>>;

/// Prompt at which the user walked away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStep {
    Destination,
    Name,
}

/// How a routing sequence ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The file now lives at this path.
    Moved(PathBuf),
    /// The user cancelled; the file stays where it is.
    Abandoned(PromptStep),
    /// No destinations are configured.
    Unrouted,
    /// The move failed; the file stays where it is.
    Failed(RouteFailure),
}

/// Result of handing a file to the gate.
#[derive(Debug)]
pub enum Submission {
    /// A routing sequence is running for the file.
    Started(JoinHandle<RouteOutcome>),
    /// Another sequence was running; the file was dropped.
    Busy,
}

impl Submission {
    #[must_use]
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}

/// Routing counters.
#[derive(Debug, Default)]
pub struct DispatchStats {
    pub discovered: AtomicU64,
    pub dropped: AtomicU64,
    pub moved: AtomicU64,
    pub abandoned: AtomicU64,
    pub unrouted: AtomicU64,
    pub failed: AtomicU64,
}

impl DispatchStats {
    /// Get snapshot of current stats.
    #[must_use]
    pub fn snapshot(&self) -> DispatchStatsSnapshot {
        DispatchStatsSnapshot {
            discovered: self.discovered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            moved: self.moved.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            unrouted: self.unrouted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    fn record(&self, outcome: &RouteOutcome) {
        let counter = match outcome {
            RouteOutcome::Moved(_) => &self.moved,
            RouteOutcome::Abandoned(_) => &self.abandoned,
            RouteOutcome::Unrouted => &self.unrouted,
            RouteOutcome::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of routing counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchStatsSnapshot {
    pub discovered: u64,
    pub dropped: u64,
    pub moved: u64,
    pub abandoned: u64,
    pub unrouted: u64,
    pub failed: u64,
}

struct GateInner {
    permit: Arc<Semaphore>,
    destinations: SharedDestinations,
    prompter: Arc<dyn Prompter>,
    router: FileRouter,
    stats: DispatchStats,
}

/// Presents discovered files to the user one at a time.
#[derive(Clone)]
pub struct DispatchGate {
    inner: Arc<GateInner>,
}

impl DispatchGate {
    /// Create an idle gate.
    #[must_use]
    pub fn new(destinations: SharedDestinations, prompter: Arc<dyn Prompter>) -> Self {
        Self {
            inner: Arc::new(GateInner {
                permit: Arc::new(Semaphore::new(1)),
                destinations,
                prompter,
                router: FileRouter::new(),
                stats: DispatchStats::default(),
            }),
        }
    }

    /// Start a routing sequence for `file`, or drop it if one is running.
    ///
    /// Never blocks. Must be called from within a tokio runtime.
    pub fn submit(&self, file: DiscoveredFile) -> Submission {
        self.inner.stats.discovered.fetch_add(1, Ordering::Relaxed);

        let Ok(permit) = Arc::clone(&self.inner.permit).try_acquire_owned() else {
            self.inner.stats.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                path = %file.path().display(),
                "Routing in progress, dropping discovered file"
            );
            return Submission::Busy;
        };

        let inner = Arc::clone(&self.inner);
        Submission::Started(tokio::task::spawn_blocking(move || {
            // Released on every exit, unwinding included.
            let _permit = permit;
            let span = tracing::info_span!("route", file = %file.path().display());
            let _enter = span.enter();

            let outcome = inner.route(&file);
            inner.stats.record(&outcome);
            tracing::debug!(?outcome, "Routing finished");
            outcome
        }))
    }

    /// True while a routing sequence is open.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.inner.permit.available_permits() == 0
    }

    #[must_use]
    pub fn stats(&self) -> DispatchStatsSnapshot {
        self.inner.stats.snapshot()
    }
}

impl GateInner {
    fn route(&self, file: &DiscoveredFile) -> RouteOutcome {
        let destinations = self.destinations.read().clone();
        let Some(default) = destinations.first() else {
            self.prompter.notify(&format!(
                "No destination directories configured; {} left in place",
                file.file_name()
            ));
            return RouteOutcome::Unrouted;
        };

        let Some(destination) = self.prompter.choose(
            &format!("Move {} to", file.file_name()),
            destinations.as_slice(),
            Some(default),
        ) else {
            return RouteOutcome::Abandoned(PromptStep::Destination);
        };

        let mut suggested = file.base_name();
        loop {
            let Some(entered) = self
                .prompter
                .prompt_text("New name (without extension)", &suggested)
            else {
                return RouteOutcome::Abandoned(PromptStep::Name);
            };
            let base = entered.trim();
            if base.is_empty() {
                return RouteOutcome::Abandoned(PromptStep::Name);
            }

            let Some(name) = target_file_name(base, file.extension()) else {
                self.prompter.notify(&format!(
                    "{} has no extension; enter a name without one",
                    file.file_name()
                ));
                suggested = split_extension(base).0.to_string();
                continue;
            };
            match self
                .router
                .move_file(file.path(), Path::new(&destination), &name)
            {
                Ok(target) => {
                    self.prompter
                        .notify(&format!("Moved to {}", target.display()));
                    return RouteOutcome::Moved(target);
                }
                Err(RouteFailure::TargetExists(existing))
                    if self
                        .prompter
                        .confirm(&format!("{existing} already exists. Choose another name?")) =>
                {
                    suggested = base.to_string();
                }
                Err(failure) => {
                    tracing::warn!(error = %failure, "Routing failed");
                    self.prompter.notify(&format!(
                        "Could not move {}: {failure}",
                        file.file_name()
                    ));
                    return RouteOutcome::Failed(failure);
                }
            }
        }
    }
}

impl DiscoverySink for DispatchGate {
    fn discovered(&self, file: DiscoveredFile) {
        let _ = self.submit(file);
    }

    fn watch_failed(&self, error: &WatchError) {
        let prompter = Arc::clone(&self.inner.prompter);
        let message = format!("Monitoring stopped: {error}. Start it again once fixed.");
        tokio::task::spawn_blocking(move || prompter.notify(&message));
    }
}
