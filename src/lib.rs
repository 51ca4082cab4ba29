//! dropsort
//!
//! Watches one directory for newly created files and asks, file by file,
//! where each should go and under which name.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod error;
pub mod observability;
pub mod store;
pub mod watcher;

pub use app::{App, Status};
pub use config::Config;
pub use dispatch::{DispatchGate, FileRouter, Prompter, RouteOutcome, Submission};
pub use error::{Error, Result};
pub use observability::init_tracing;
pub use store::{DestinationSet, PathStore};
pub use watcher::{DiscoveredFile, WatchSession};
