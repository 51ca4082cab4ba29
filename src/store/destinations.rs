//! The ordered, duplicate-free set of destination directories.

use serde::Serialize;

use crate::error::DestinationError;

/// Candidate directories a discovered file may be routed to.
///
/// Entries are kept in canonical form (see [`normalize_destination`]) and in
/// insertion order; the first entry is the default choice when prompting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DestinationSet {
    entries: Vec<String>,
}

impl DestinationSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from raw entries, normalizing them and skipping blanks and
    /// duplicates.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for entry in entries {
            let normalized = normalize_destination(entry.as_ref());
            if !normalized.is_empty() && !set.entries.contains(&normalized) {
                set.entries.push(normalized);
            }
        }
        set
    }

    /// Append a destination. Returns the canonical form that was stored.
    ///
    /// # Errors
    ///
    /// Returns [`DestinationError::Duplicate`] if the destination is already
    /// present.
    pub fn insert(&mut self, raw: &str) -> Result<String, DestinationError> {
        let normalized = normalize_destination(raw);
        if self.entries.contains(&normalized) {
            return Err(DestinationError::Duplicate(normalized));
        }
        self.entries.push(normalized.clone());
        Ok(normalized)
    }

    /// Remove a destination. Returns the canonical form that was removed.
    ///
    /// # Errors
    ///
    /// Returns [`DestinationError::Unknown`] if the destination is not present.
    pub fn remove(&mut self, raw: &str) -> Result<String, DestinationError> {
        let normalized = normalize_destination(raw);
        let Some(index) = self.entries.iter().position(|e| *e == normalized) else {
            return Err(DestinationError::Unknown(normalized));
        };
        Ok(self.entries.remove(index))
    }

    /// Check whether `raw` names a destination in the set.
    #[must_use]
    pub fn contains(&self, raw: &str) -> bool {
        self.entries.contains(&normalize_destination(raw))
    }

    /// The entries in order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.entries
    }

    /// The default choice.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.entries.first().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

/// Canonical form of a destination path.
///
/// Trims whitespace and trailing separators. On platforms whose file systems
/// are case-insensitive by default the path is also lower-cased.
#[must_use]
pub fn normalize_destination(raw: &str) -> String {
    let mut path = raw.trim().to_string();
    while path.len() > 1
        && path.ends_with(|c: char| c == '/' || c == '\\')
        && !is_drive_root(&path)
    {
        path.pop();
    }

    if cfg!(any(windows, target_os = "macos")) {
        path = path.to_lowercase();
    }
    path
}

/// `C:\` and friends keep their separator.
fn is_drive_root(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
