//! dropsort - route new downloads into curated directories
//!
//! Entry point for the interactive watcher and its management commands.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use dropsort::config::default_data_dir;
use dropsort::console::{self, ConsolePrompter, PromptRequest};
use dropsort::{init_tracing, App, Config, PathStore};

/// dropsort - route new downloads into curated directories
#[derive(Parser, Debug)]
#[command(name = "dropsort")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the saved monitored path and destinations
    #[arg(short, long, env = "DROPSORT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DROPSORT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "DROPSORT_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the monitored directory and route new files (default)
    Run {
        /// Start with monitoring stopped
        #[arg(long)]
        paused: bool,
    },
    /// Manage destination directories
    #[command(subcommand)]
    Dest(DestCommand),
    /// Show or change the monitored directory
    #[command(subcommand)]
    Path(PathCommand),
    /// Show saved state
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DestCommand {
    /// List destination directories
    List,
    /// Add an existing directory
    Add { dir: String },
    /// Remove a directory
    Remove { dir: String },
}

#[derive(Subcommand, Debug)]
enum PathCommand {
    /// Print the monitored directory
    Show,
    /// Change the monitored directory
    Set { dir: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.log_json);

    let config = Config {
        data_dir: cli.data_dir.unwrap_or_else(default_data_dir),
        log_level: cli.log_level,
        log_json: cli.log_json,
    };

    tracing::debug!(?config, "Configuration loaded");
    config.validate().context("invalid configuration")?;

    let (prompter, requests) = ConsolePrompter::channel();
    let app = App::new(PathStore::new(&config), Arc::new(prompter));

    let result = match cli.command.unwrap_or(Commands::Run { paused: false }) {
        Commands::Run { paused } => return run(&app, requests, paused).await,
        Commands::Dest(command) => dest(&app, command),
        Commands::Path(command) => path(&app, command).await,
        Commands::Status { json } => status(&app, json),
    };
    print_notices(requests);
    result
}

/// Interactive session: watch, prompt, and take console commands until
/// `quit`, end of input or Ctrl-C.
async fn run(
    app: &App,
    requests: mpsc::UnboundedReceiver<PromptRequest>,
    paused: bool,
) -> anyhow::Result<()> {
    tracing::info!("dropsort v{} starting...", env!("CARGO_PKG_VERSION"));

    if !paused {
        // A bad saved path is not fatal; the user can fix it from the console.
        if let Err(e) = app.start_monitoring().await {
            tracing::error!(error = %e, "Could not start monitoring");
            eprintln!("Monitoring not started: {e}. Use 'path DIR' then 'start'.");
        }
    }

    let lines = console::spawn_stdin_reader().context("failed to read stdin")?;

    tokio::select! {
        result = console::run(app, requests, lines, tokio::io::stdout()) => {
            result.context("console failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
        }
    }

    app.stop_monitoring().await;
    tracing::info!("dropsort stopped");
    Ok(())
}

fn dest(app: &App, command: DestCommand) -> anyhow::Result<()> {
    match command {
        DestCommand::List => {}
        DestCommand::Add { dir } => {
            app.add_destination(&dir)
                .with_context(|| format!("could not add {dir}"))?;
        }
        DestCommand::Remove { dir } => {
            app.remove_destination(&dir)
                .with_context(|| format!("could not remove {dir}"))?;
        }
    }
    print!("{}", console::describe_destinations(app));
    Ok(())
}

async fn path(app: &App, command: PathCommand) -> anyhow::Result<()> {
    let path = match command {
        PathCommand::Show => app.monitored_path(),
        PathCommand::Set { dir } => app
            .set_monitored_path(&dir)
            .await
            .with_context(|| format!("could not monitor {dir}"))?,
    };
    println!("{}", path.display());
    Ok(())
}

fn status(app: &App, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&app.status())?);
    } else {
        print!("{}", console::describe_status(app));
    }
    Ok(())
}

/// Flush notices raised while running a management command.
fn print_notices(mut requests: mpsc::UnboundedReceiver<PromptRequest>) {
    while let Ok(request) = requests.try_recv() {
        match request {
            PromptRequest::Notice(message) => eprintln!("{message}"),
            other => other.cancel(),
        }
    }
}
