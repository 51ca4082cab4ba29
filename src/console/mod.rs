//! Line-oriented terminal front end.
//!
//! One task owns the input. While a routing prompt is open the next line
//! answers it; otherwise lines are console commands.

mod commands;
mod prompter;

use std::io::BufRead;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

pub use commands::{Command, HELP};
pub use prompter::{ConsolePrompter, PromptRequest, CANCEL};

use crate::app::App;
use crate::watcher::SessionState;
use crate::Result;

/// Read stdin on a dedicated thread.
///
/// A plain thread rather than `tokio::io::stdin` so a pending read never
/// holds up runtime shutdown.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn_stdin_reader() -> Result<mpsc::UnboundedReceiver<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read stdin");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

/// Run the console until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub async fn run<W>(
    app: &App,
    mut requests: mpsc::UnboundedReceiver<PromptRequest>,
    mut lines: mpsc::UnboundedReceiver<String>,
    mut out: W,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut pending: Option<PromptRequest> = None;
    let mut requests_open = true;

    write(&mut out, "dropsort ready, type 'help' for commands\n").await?;

    loop {
        tokio::select! {
            biased;

            request = requests.recv(), if requests_open && pending.is_none() => match request {
                Some(request @ PromptRequest::Notice(_)) => {
                    write(&mut out, &request.render()).await?;
                }
                Some(request) => {
                    write(&mut out, &request.render()).await?;
                    pending = Some(request);
                }
                None => requests_open = false,
            },

            line = lines.recv() => {
                let Some(line) = line else {
                    if let Some(request) = pending.take() {
                        request.cancel();
                    }
                    break;
                };

                if let Some(request) = pending.take() {
                    if let Some(again) = request.answer(&line) {
                        write(&mut out, "Not one of the options.\n").await?;
                        write(&mut out, &again.render()).await?;
                        pending = Some(again);
                    }
                    continue;
                }

                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        let reply = execute(app, command).await;
                        write(&mut out, &reply).await?;
                    }
                    Err(message) => write(&mut out, &format!("{message}\n")).await?,
                }
            }
        }
    }

    Ok(())
}

async fn write<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.flush().await?;
    Ok(())
}

/// Run a command and describe the result for the user.
async fn execute(app: &App, command: Command) -> String {
    match command {
        Command::Help => HELP.to_string(),
        Command::Status => describe_status(app),
        Command::List => describe_destinations(app),
        Command::Start => match app.start_monitoring().await {
            Ok(path) => format!("Monitoring {}\n", path.display()),
            Err(e) => format!("Could not start monitoring: {e}\n"),
        },
        Command::Stop => {
            app.stop_monitoring().await;
            "Monitoring stopped\n".to_string()
        }
        Command::Path(None) => format!("{}\n", app.monitored_path().display()),
        Command::Path(Some(dir)) => match app.set_monitored_path(&dir).await {
            Ok(path) => format!("Monitoring path changed to: {}\n", path.display()),
            Err(e) => format!("Path not changed: {e}\n"),
        },
        Command::Add(dir) => match app.add_destination(&dir) {
            Ok(_) => format!("Directory added: {dir}\n"),
            Err(e) => format!("Not added: {e}\n"),
        },
        Command::Remove(dir) => match app.remove_destination(&dir) {
            Ok(_) => format!("Directory removed: {dir}\n"),
            Err(e) => format!("Not removed: {e}\n"),
        },
        Command::Empty | Command::Quit => String::new(),
    }
}

/// Human-readable summary of [`App::status`].
#[must_use]
pub fn describe_status(app: &App) -> String {
    let status = app.status();
    let state = match &status.session {
        SessionState::Stopped => format!("stopped ({})", status.monitored_path.display()),
        SessionState::Watching { path } => format!("watching {}", path.display()),
        SessionState::Failed { path, reason } => {
            format!("failed on {}: {reason}", path.display())
        }
    };
    let stats = status.stats;
    format!(
        "Monitoring: {state}\nRouting: {}\nDestinations: {}\n\
         Files: {} discovered, {} moved, {} skipped, {} dropped while busy, {} failed, {} unrouted\n",
        if status.routing { "in progress" } else { "idle" },
        status.destinations.len(),
        stats.discovered,
        stats.moved,
        stats.abandoned,
        stats.dropped,
        stats.failed,
        stats.unrouted,
    )
}

/// Numbered destination list.
#[must_use]
pub fn describe_destinations(app: &App) -> String {
    let destinations = app.destinations();
    if destinations.is_empty() {
        return "No destination directories. Use 'add DIR'.\n".to_string();
    }
    destinations
        .iter()
        .enumerate()
        .map(|(i, d)| format!("  {}) {d}\n", i + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::{DestinationSet, PathStore};
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio::sync::oneshot;

    struct Fixture {
        tmp: TempDir,
        app: App,
        requests: Option<mpsc::UnboundedReceiver<PromptRequest>>,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let config = Config {
                data_dir: tmp.path().join("data"),
                ..Default::default()
            };
            for dir in ["watch", "archive"] {
                fs::create_dir(tmp.path().join(dir)).unwrap();
            }
            let store = PathStore::new(&config);
            store.save_monitored_path(&tmp.path().join("watch")).unwrap();
            store.save_destinations(&DestinationSet::new()).unwrap();

            let (prompter, requests) = ConsolePrompter::channel();
            let app = App::new(store, Arc::new(prompter));
            Self {
                tmp,
                app,
                requests: Some(requests),
            }
        }

        fn dir(&self, name: &str) -> PathBuf {
            fs::canonicalize(self.tmp.path().join(name)).unwrap()
        }

        /// Queue `request` ahead of any input, as if the routing worker had
        /// already asked it.
        fn queue_prompt(&mut self, request: PromptRequest) {
            let (tx, rx) = mpsc::unbounded_channel();
            tx.send(request).unwrap();
            self.requests = Some(rx);
        }

        async fn run(&mut self, input: &[&str]) -> String {
            let (tx, lines) = mpsc::unbounded_channel();
            for line in input {
                tx.send((*line).to_string()).unwrap();
            }
            drop(tx);

            let mut out = Vec::new();
            let requests = self.requests.take().unwrap();
            run(&self.app, requests, lines, &mut out).await.unwrap();
            String::from_utf8(out).unwrap()
        }
    }

    #[tokio::test]
    async fn test_commands_mutate_app() {
        let mut fx = Fixture::new();
        let archive = fx.dir("archive").display().to_string();

        let output = fx
            .run(&[&format!("add {archive}"), "list", "bogus", "quit", "list"])
            .await;

        assert!(output.contains(&format!("Directory added: {archive}")));
        assert!(output.contains("  1) "));
        assert!(output.contains("unknown command 'bogus'"));
        assert_eq!(fx.app.destinations().len(), 1);
        // Nothing after quit runs.
        assert_eq!(output.matches("  1) ").count(), 1);
    }

    #[tokio::test]
    async fn test_path_command_rejects_invalid() {
        let mut fx = Fixture::new();
        let before = fx.app.monitored_path();

        let output = fx.run(&["path /definitely/not/here", "path"]).await;

        assert!(output.contains("Path not changed"));
        assert!(output.contains(&before.display().to_string()));
        assert_eq!(fx.app.monitored_path(), before);
    }

    #[tokio::test]
    async fn test_start_status_stop() {
        let mut fx = Fixture::new();
        let output = fx.run(&["start", "status", "stop", "status"]).await;

        assert!(output.contains("Monitoring: watching"));
        assert!(output.contains("Monitoring stopped"));
        assert!(output.contains("Monitoring: stopped"));
        assert!(!fx.app.is_monitoring());
    }

    #[tokio::test]
    async fn test_line_answers_pending_prompt() {
        let mut fx = Fixture::new();
        let (reply, answer) = oneshot::channel();
        fx.queue_prompt(PromptRequest::Choose {
            label: "Move a.txt to".to_string(),
            options: vec!["/archive".to_string(), "/inbox".to_string()],
            default: Some("/archive".to_string()),
            reply,
        });

        // "2" answers the prompt instead of being parsed as a command.
        let output = fx.run(&["7", "2", "list"]).await;

        assert_eq!(answer.await.unwrap(), Some("/inbox".to_string()));
        assert!(output.contains("Move a.txt to:"));
        assert!(output.contains("Not one of the options."));
        assert!(!output.contains("unknown command"));
        assert!(output.contains("No destination directories"));
    }

    #[tokio::test]
    async fn test_end_of_input_cancels_prompt() {
        let mut fx = Fixture::new();
        let (reply, answer) = oneshot::channel();
        fx.queue_prompt(PromptRequest::Text {
            label: "New name".to_string(),
            default: "report".to_string(),
            reply,
        });

        fx.run(&[]).await;
        assert_eq!(answer.await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_notice_printed() {
        let mut fx = Fixture::new();
        fx.queue_prompt(PromptRequest::Notice("Moved to /archive/a.txt".to_string()));

        let output = fx.run(&[]).await;
        assert!(output.contains("Moved to /archive/a.txt\n"));
    }
}
