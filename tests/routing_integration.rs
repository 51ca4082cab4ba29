//! Integration tests for watching, routing and the console together.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use dropsort::console::{self, ConsolePrompter};
use dropsort::dispatch::{PromptStep, SharedDestinations};
use dropsort::watcher::DiscoverySink;
use dropsort::{
    App, Config, DestinationSet, DiscoveredFile, DispatchGate, PathStore, Prompter, RouteOutcome,
    Submission, WatchSession,
};
use parking_lot::{Mutex, RwLock};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, DuplexStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_test::assert_ok;

const EVENT_WAIT: Duration = Duration::from_secs(10);

/// Answers prompts from a queue; `None` cancels.
#[derive(Default)]
struct QueuedPrompter {
    choices: Mutex<VecDeque<Option<String>>>,
    names: Mutex<VecDeque<Option<String>>>,
}

impl QueuedPrompter {
    fn new(choice: Option<&str>, name: Option<&str>) -> Self {
        let prompter = Self::default();
        prompter.choices.lock().push_back(choice.map(String::from));
        prompter.names.lock().push_back(name.map(String::from));
        prompter
    }
}

impl Prompter for QueuedPrompter {
    fn choose(&self, _label: &str, _options: &[String], _default: Option<&str>) -> Option<String> {
        self.choices.lock().pop_front().flatten()
    }

    fn prompt_text(&self, _label: &str, _default: &str) -> Option<String> {
        self.names.lock().pop_front().flatten()
    }

    fn confirm(&self, _message: &str) -> bool {
        false
    }

    fn notify(&self, _message: &str) {}
}

/// Submits to the gate and hands the submission back to the test.
struct Forward {
    gate: DispatchGate,
    submissions: mpsc::UnboundedSender<Submission>,
}

impl DiscoverySink for Forward {
    fn discovered(&self, file: DiscoveredFile) {
        let _ = self.submissions.send(self.gate.submit(file));
    }
}

struct Dirs {
    _tmp: TempDir,
    watch: PathBuf,
    archive: PathBuf,
}

fn dirs() -> Dirs {
    let tmp = TempDir::new().unwrap();
    for name in ["watch", "archive"] {
        fs::create_dir(tmp.path().join(name)).unwrap();
    }
    let watch = fs::canonicalize(tmp.path().join("watch")).unwrap();
    let archive = fs::canonicalize(tmp.path().join("archive")).unwrap();
    Dirs {
        _tmp: tmp,
        watch,
        archive,
    }
}

fn shared(destinations: &[&Path]) -> SharedDestinations {
    Arc::new(RwLock::new(DestinationSet::from_entries(
        destinations.iter().map(|d| d.display().to_string()),
    )))
}

async fn next_outcome(rx: &mut mpsc::UnboundedReceiver<Submission>) -> RouteOutcome {
    let submission = timeout(EVENT_WAIT, rx.recv())
        .await
        .expect("timed out waiting for a discovered file")
        .expect("sink closed");
    match submission {
        Submission::Started(handle) => handle.await.unwrap(),
        Submission::Busy => panic!("gate unexpectedly busy"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_new_file_routed_with_new_name() {
    let dirs = dirs();
    let archive = dirs.archive.display().to_string();
    let prompter = Arc::new(QueuedPrompter::new(Some(archive.as_str()), Some("quarterly")));
    let gate = DispatchGate::new(shared(&[dirs.archive.as_path()]), prompter);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = WatchSession::new(Arc::new(Forward {
        gate: gate.clone(),
        submissions: tx,
    }));
    let root = assert_ok!(session.start(&dirs.watch).await);

    let bytes = b"%PDF-1.7 quarterly figures".to_vec();
    fs::write(root.join("report.PDF"), &bytes).unwrap();

    let target = dirs.archive.join("quarterly.PDF");
    assert_eq!(
        next_outcome(&mut rx).await,
        RouteOutcome::Moved(target.clone())
    );
    assert_eq!(fs::read(&target).unwrap(), bytes);
    assert!(!root.join("report.PDF").exists());
    assert!(!gate.is_busy());
    assert_eq!(gate.stats().moved, 1);

    session.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancelled_rename_leaves_file() {
    let dirs = dirs();
    let archive = dirs.archive.display().to_string();
    let prompter = Arc::new(QueuedPrompter::new(Some(archive.as_str()), None));
    let gate = DispatchGate::new(shared(&[dirs.archive.as_path()]), prompter);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = WatchSession::new(Arc::new(Forward {
        gate: gate.clone(),
        submissions: tx,
    }));
    let root = assert_ok!(session.start(&dirs.watch).await);

    fs::write(root.join("notes.txt"), "draft").unwrap();

    assert_eq!(
        next_outcome(&mut rx).await,
        RouteOutcome::Abandoned(PromptStep::Name)
    );
    assert!(root.join("notes.txt").exists());
    assert_eq!(fs::read_dir(&dirs.archive).unwrap().count(), 0);
    assert!(!gate.is_busy());

    // The gate takes the next file.
    let next = gate.submit(DiscoveredFile::new(root.join("notes.txt")));
    assert!(next.is_started());

    session.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_switch_routes_only_new_directory() {
    let dirs = dirs();
    let other = TempDir::new().unwrap();
    let archive = dirs.archive.display().to_string();
    let prompter = Arc::new(QueuedPrompter::new(Some(archive.as_str()), Some("moved")));
    let gate = DispatchGate::new(shared(&[dirs.archive.as_path()]), prompter);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = WatchSession::new(Arc::new(Forward {
        gate: gate.clone(),
        submissions: tx,
    }));
    let old_root = assert_ok!(session.start(&dirs.watch).await);
    let new_root = assert_ok!(session.switch_to(other.path()).await);

    fs::write(old_root.join("stale.bin"), "x").unwrap();
    fs::write(new_root.join("fresh.bin"), "y").unwrap();

    assert_eq!(
        next_outcome(&mut rx).await,
        RouteOutcome::Moved(dirs.archive.join("moved.bin"))
    );
    assert!(old_root.join("stale.bin").exists());
    assert_eq!(gate.stats().discovered, 1);

    session.stop().await;
}

/// Read console output until `needle` shows up.
async fn read_until(output: &mut DuplexStream, seen: &mut String, needle: &str) {
    let wait = async {
        let mut buf = [0u8; 1024];
        while !seen.contains(needle) {
            let n = output.read(&mut buf).await.unwrap();
            assert!(n > 0, "console closed before {needle:?}");
            seen.push_str(&String::from_utf8_lossy(&buf[..n]));
        }
    };
    timeout(EVENT_WAIT, wait)
        .await
        .unwrap_or_else(|_| panic!("no {needle:?} in console output"));
    seen.clear();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_console_drives_routing() {
    let dirs = dirs();
    let data = TempDir::new().unwrap();
    let config = Config {
        data_dir: data.path().to_path_buf(),
        ..Default::default()
    };
    let store = PathStore::new(&config);
    assert_ok!(store.save_monitored_path(&dirs.watch));
    assert_ok!(store.save_destinations(&DestinationSet::from_entries([dirs
        .archive
        .display()
        .to_string()])));

    let (prompter, requests) = ConsolePrompter::channel();
    let app = App::new(store, Arc::new(prompter));
    let root = assert_ok!(app.start_monitoring().await);

    let (lines, input) = mpsc::unbounded_channel();
    let (writer, mut output) = tokio::io::duplex(64 * 1024);

    let user = async move {
        let mut seen = String::new();
        read_until(&mut output, &mut seen, "ready").await;

        fs::write(root.join("scan.jpeg"), "jpeg").unwrap();
        read_until(&mut output, &mut seen, "choice (").await;
        lines.send("1".to_string()).unwrap();
        read_until(&mut output, &mut seen, "New name").await;
        lines.send("receipt".to_string()).unwrap();
        read_until(&mut output, &mut seen, "Moved to").await;
        lines.send("quit".to_string()).unwrap();
    };

    let (result, ()) = tokio::join!(console::run(&app, requests, input, writer), user);
    assert_ok!(result);

    assert!(dirs.archive.join("receipt.jpeg").exists());
    assert_eq!(app.status().stats.discovered, 1);
    app.stop_monitoring().await;
}
