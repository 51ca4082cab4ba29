//! Directory watching.
//!
//! This module provides:
//! - A single-directory watch session using notify-rs
//! - Conversion of raw creation events into discovered-file records

mod events;
mod session;

pub use events::{discovered_in, split_extension, DiscoveredFile};
pub use session::{validate_directory, DiscoverySink, SessionState, WatchSession};
