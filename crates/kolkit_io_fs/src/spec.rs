//! Save specification models and top-level error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Existing destination file conflict policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumSaveConflictStrategy {
    /// Replace destination file with the new artifact.
    #[default]
    Overwrite,
    /// Keep destination file and drop the new artifact.
    Skip,
    /// Refuse to save when destination exists.
    Error,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for [`crate::save::DirectorySaveTarget`].
#[derive(Debug, Clone)]
pub struct SpecSaveOptions {
    /// Conflict behavior for destination files.
    pub rule_conflict: EnumSaveConflictStrategy,
    /// Create the destination directory when missing.
    pub if_create_dir: bool,
    /// Do not mutate filesystem; record what would happen.
    pub if_dry_run: bool,
}

impl Default for SpecSaveOptions {
    fn default() -> Self {
        Self {
            rule_conflict: EnumSaveConflictStrategy::Overwrite,
            if_create_dir: true,
            if_dry_run: false,
        }
    }
}

/// One finished export: document bytes plus the file name to save under.
///
/// Handed by value to [`crate::save::trigger_download`], which consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportArtifact {
    /// Serialized document.
    pub bytes: Vec<u8>,
    /// File name including extension; no directory components.
    pub filename: String,
    /// MIME content type of `bytes`.
    pub content_type: String,
}

impl SpecExportArtifact {
    /// Create an artifact.
    pub fn new(
        bytes: Vec<u8>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            content_type: content_type.into(),
        }
    }
}

/// One save failure item with path + error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSaveError {
    /// Destination path that failed.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

/// Errors returned by a [`crate::save::SaveTarget`].
#[derive(Debug, Error)]
pub enum SaveError {
    /// File name is empty, contains separators, reserved or control characters.
    #[error("invalid file name {filename:?}: {reason}")]
    InvalidFilename { filename: String, reason: String },

    /// Destination escapes the target directory.
    #[error("unsafe destination path: {0}")]
    UnsafePath(String),

    /// Destination exists and the conflict policy is `Error`.
    #[error("destination exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// Destination directory is missing or could not be created.
    #[error("failed to initialize destination {}: {source}", path.display())]
    DestinationInitFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O failure while writing or persisting.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SaveError {
    /// Create an InvalidFilename error.
    pub fn invalid_filename(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilename {
            filename: filename.into(),
            reason: reason.into(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SaveError::invalid_filename("a/b.xlsx", "contains path separator");
        assert_eq!(
            err.to_string(),
            "invalid file name \"a/b.xlsx\": contains path separator"
        );

        let err = SaveError::DestinationExists(PathBuf::from("out/kol.xlsx"));
        assert_eq!(err.to_string(), "destination exists: out/kol.xlsx");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let save_err: SaveError = io_err.into();
        assert!(matches!(save_err, SaveError::Io(_)));
    }
}
