//! Moves a discovered file into its destination under a new name.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::RouteFailure;
use crate::watcher::split_extension;

/// Performs the final move of a routing sequence.
///
/// Never overwrites: an existing target is a failure and leaves both files
/// untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRouter;

impl FileRouter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Move `source` to `destination_dir/new_file_name`.
    ///
    /// Returns the target path on success.
    ///
    /// # Errors
    ///
    /// Returns a [`RouteFailure`] and leaves the file system unchanged if the
    /// name is not a plain file name, the source or destination is missing,
    /// the target exists, or the platform refuses the rename.
    pub fn move_file(
        &self,
        source: &Path,
        destination_dir: &Path,
        new_file_name: &str,
    ) -> Result<PathBuf, RouteFailure> {
        validate_file_name(new_file_name)?;

        if fs::symlink_metadata(source).is_err() {
            return Err(RouteFailure::SourceMissing(source.display().to_string()));
        }

        if !destination_dir.is_dir() {
            return Err(RouteFailure::DestinationMissing(
                destination_dir.display().to_string(),
            ));
        }

        let target = destination_dir.join(new_file_name);
        if fs::symlink_metadata(&target).is_ok() {
            return Err(RouteFailure::TargetExists(target.display().to_string()));
        }

        fs::rename(source, &target).map_err(|e| RouteFailure::Refused {
            reason: e.to_string(),
        })?;

        tracing::info!(
            from = %source.display(),
            to = %target.display(),
            "Moved file"
        );
        Ok(target)
    }
}

/// File name for a renamed file: the user's base name plus the original
/// extension, verbatim.
///
/// `None` if the result would not carry exactly `extension`. That only
/// happens when the original has no extension and `base` brings one.
#[must_use]
pub fn target_file_name(base: &str, extension: &str) -> Option<String> {
    let name = if extension.is_empty() {
        base.to_string()
    } else {
        format!("{base}.{extension}")
    };
    (split_extension(&name).1 == extension).then_some(name)
}

fn validate_file_name(name: &str) -> Result<(), RouteFailure> {
    let invalid = || RouteFailure::InvalidName(name.to_string());

    if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') {
        return Err(invalid());
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid()),
    }
}
