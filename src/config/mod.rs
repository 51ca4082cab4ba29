//! Configuration management for dropsort.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables (`DROPSORT_*`)
//! - Built-in defaults (lowest priority)

mod settings;

pub use settings::{default_data_dir, Config};
