//! Discovered-file records and conversion from raw notify events.

#![allow(clippy::missing_const_for_fn)]

use std::path::{Path, PathBuf};

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind};
use serde::Serialize;

/// A file that appeared in the monitored directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredFile {
    path: PathBuf,
    extension: String,
}

impl DiscoveredFile {
    /// Record a discovered file, deriving its extension from the file name.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = split_extension(&file_name_of(&path)).1.to_string();
        Self { path, extension }
    }

    /// Absolute path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Extension without the dot, empty if the file has none.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// The final path component.
    #[must_use]
    pub fn file_name(&self) -> String {
        file_name_of(&self.path)
    }

    /// File name without the extension; the default for the rename prompt.
    #[must_use]
    pub fn base_name(&self) -> String {
        split_extension(&self.file_name()).0.to_string()
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Split a file name into base name and extension at the last `.`.
///
/// A leading dot (`.bashrc`) or trailing dot (`notes.`) does not start an
/// extension.
#[must_use]
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if dot > 0 && dot < name.len() - 1 => (&name[..dot], &name[dot + 1..]),
        _ => (name, ""),
    }
}

/// Files created directly inside `root` according to `event`.
///
/// Both creation and rename-into-place count as "entry created"; folders and
/// entries outside `root` are skipped. Paths are resolved by file name
/// against `root`.
///
/// Backends that cannot tell the two sides of a rename apart (FSEvents
/// reports `RenameMode::Any`) only yield paths that exist as files.
#[must_use]
pub fn discovered_in(root: &Path, event: &Event) -> Vec<DiscoveredFile> {
    let (paths, must_exist): (&[PathBuf], bool) = match event.kind {
        EventKind::Create(CreateKind::Folder) => return Vec::new(),
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            (&event.paths, false)
        }
        // [from, to]
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            (event.paths.get(1..).unwrap_or_default(), false)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Any)) => (&event.paths, true),
        _ => return Vec::new(),
    };

    paths
        .iter()
        .filter_map(|raw| resolve(root, raw))
        .filter(|path| if must_exist { path.is_file() } else { !path.is_dir() })
        .map(DiscoveredFile::new)
        .collect()
}

fn resolve(root: &Path, raw: &Path) -> Option<PathBuf> {
    let name = raw.file_name()?;
    if raw.is_absolute() && raw.parent() != Some(root) {
        return None;
    }
    Some(root.join(name))
}
