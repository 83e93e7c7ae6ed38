//! Save targets and the fire-and-forget download trigger.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::report::{ReportSave, ReportSaveBuilder};
use crate::spec::{EnumSaveConflictStrategy, SaveError, SpecExportArtifact, SpecSaveOptions};
use crate::util::{should_skip_file_conflict, validate_destination_path_safety, validate_filename};

////////////////////////////////////////////////////////////////////////////////
// #region Trait

/// Host capability that persists a finished document under a file name.
pub trait SaveTarget {
    /// Persist `bytes` as `filename`.
    fn save(&mut self, bytes: &[u8], filename: &str) -> Result<(), SaveError>;
}

/// Hand `artifact` to `target` exactly once.
///
/// Failures are logged and otherwise unobserved by the caller.
pub fn trigger_download<T>(target: &mut T, artifact: SpecExportArtifact)
where
    T: SaveTarget + ?Sized,
{
    let SpecExportArtifact {
        bytes,
        filename,
        content_type,
    } = artifact;

    match target.save(&bytes, &filename) {
        Ok(()) => tracing::info!(
            filename = %filename,
            content_type = %content_type,
            bytes = bytes.len(),
            "download delivered"
        ),
        Err(e) => tracing::warn!(
            filename = %filename,
            error = %e,
            "download failed"
        ),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DirectoryTarget

/// Saves artifacts into one directory on the local filesystem.
///
/// Each artifact is first written to a temporary file inside the directory
/// and then renamed into place, so a reader never sees a partial file.
#[derive(Debug)]
pub struct DirectorySaveTarget {
    path_dir: PathBuf,
    options: SpecSaveOptions,
    builder_report: ReportSaveBuilder,
}

impl DirectorySaveTarget {
    /// Target saving into `path_dir` with `options`.
    pub fn new(path_dir: impl Into<PathBuf>, options: SpecSaveOptions) -> Self {
        Self {
            path_dir: path_dir.into(),
            options,
            builder_report: ReportSaveBuilder::default(),
        }
    }

    /// Destination directory.
    pub fn dir(&self) -> &Path {
        &self.path_dir
    }

    /// Counters for every save issued so far.
    pub fn report(&self) -> ReportSave {
        self.builder_report.snapshot()
    }

    /// Final path an artifact named `filename` lands on.
    pub fn derive_destination_path(&self, filename: &str) -> PathBuf {
        self.path_dir.join(filename)
    }

    fn ensure_dir(&self) -> Result<(), SaveError> {
        if self.path_dir.is_dir() {
            return Ok(());
        }
        if !self.options.if_create_dir {
            return Err(SaveError::DestinationInitFailed {
                path: self.path_dir.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "directory does not exist"),
            });
        }
        fs::create_dir_all(&self.path_dir).map_err(|source| SaveError::DestinationInitFailed {
            path: self.path_dir.clone(),
            source,
        })
    }

    fn save_inner(&mut self, bytes: &[u8], filename: &str) -> Result<(), SaveError> {
        validate_filename(filename)?;
        let path_dst = self.derive_destination_path(filename);

        if self.options.if_dry_run {
            self.builder_report
                .add_warning(format!("dry-run: would write {}", path_dst.display()));
            self.builder_report.add_skipped();
            tracing::debug!(path = %path_dst.display(), bytes = bytes.len(), "dry-run save");
            return Ok(());
        }

        self.ensure_dir()?;
        validate_destination_path_safety(&path_dst, &self.path_dir)?;
        if should_skip_file_conflict(&path_dst, self.options.rule_conflict, &mut self.builder_report)? {
            tracing::debug!(path = %path_dst.display(), "destination exists; skipped");
            return Ok(());
        }

        let mut file_tmp = NamedTempFile::new_in(&self.path_dir)?;
        file_tmp.write_all(bytes)?;
        file_tmp.as_file().sync_all()?;

        // The temp file is removed on drop when persisting fails.
        match self.options.rule_conflict {
            EnumSaveConflictStrategy::Error => {
                file_tmp.persist_noclobber(&path_dst).map_err(|e| {
                    if e.error.kind() == io::ErrorKind::AlreadyExists {
                        SaveError::DestinationExists(path_dst.clone())
                    } else {
                        SaveError::Io(e.error)
                    }
                })?;
            }
            EnumSaveConflictStrategy::Overwrite | EnumSaveConflictStrategy::Skip => {
                file_tmp.persist(&path_dst).map_err(|e| SaveError::Io(e.error))?;
            }
        }

        self.builder_report.add_saved(bytes.len());
        tracing::debug!(path = %path_dst.display(), bytes = bytes.len(), "artifact saved");
        Ok(())
    }
}

impl SaveTarget for DirectorySaveTarget {
    fn save(&mut self, bytes: &[u8], filename: &str) -> Result<(), SaveError> {
        self.builder_report.add_requested();
        let result = self.save_inner(bytes, filename);
        if let Err(e) = &result {
            let path_dst = self.derive_destination_path(filename);
            self.builder_report.add_error(path_dst, e.to_string());
        }
        result
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MemoryTarget

/// Collects artifacts in memory, in delivery order.
#[derive(Debug, Default, Clone)]
pub struct MemorySaveTarget {
    pub l_saved: Vec<(String, Vec<u8>)>,
}

impl MemorySaveTarget {
    /// Empty target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of the most recent artifact saved under `filename`.
    pub fn get(&self, filename: &str) -> Option<&[u8]> {
        self.l_saved
            .iter()
            .rev()
            .find(|(c_name, _)| c_name == filename)
            .map(|(_, v_bytes)| v_bytes.as_slice())
    }

    /// Number of artifacts saved.
    pub fn len(&self) -> usize {
        self.l_saved.len()
    }

    /// Whether nothing was saved.
    pub fn is_empty(&self) -> bool {
        self.l_saved.is_empty()
    }
}

impl SaveTarget for MemorySaveTarget {
    fn save(&mut self, bytes: &[u8], filename: &str) -> Result<(), SaveError> {
        validate_filename(filename)?;
        self.l_saved.push((filename.to_string(), bytes.to_vec()));
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn list_dir_names(path: &Path) -> Vec<String> {
        let mut l_names: Vec<String> = fs::read_dir(path)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        l_names.sort();
        l_names
    }

    #[test]
    fn test_directory_target_writes_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let mut target = DirectorySaveTarget::new(dir.path(), SpecSaveOptions::default());

        target.save(b"a,b\n", "kol.csv").unwrap();

        assert_eq!(fs::read(dir.path().join("kol.csv")).unwrap(), b"a,b\n");
        assert_eq!(list_dir_names(dir.path()), vec!["kol.csv"]);
        let report = target.report();
        assert_eq!(report.cnt_requested, 1);
        assert_eq!(report.cnt_saved, 1);
        assert_eq!(report.bytes_written, 4);
    }

    #[test]
    fn test_directory_target_accepts_inner_double_dot() {
        let dir = tempfile::tempdir().unwrap();
        let mut target = DirectorySaveTarget::new(dir.path(), SpecSaveOptions::default());

        target.save(b"x", "kol..v2.xlsx").unwrap();
        assert_eq!(list_dir_names(dir.path()), vec!["kol..v2.xlsx"]);
        assert!(target.save(b"x", "..").is_err());
    }

    #[test]
    fn test_directory_target_creates_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path_out = dir.path().join("nested").join("out");
        let mut target = DirectorySaveTarget::new(&path_out, SpecSaveOptions::default());

        target.save(b"x", "a.xlsx").unwrap();
        assert!(path_out.join("a.xlsx").is_file());
    }

    #[test]
    fn test_directory_target_missing_dir_without_create_fails() {
        let dir = tempfile::tempdir().unwrap();
        let options = SpecSaveOptions {
            if_create_dir: false,
            ..SpecSaveOptions::default()
        };
        let mut target = DirectorySaveTarget::new(dir.path().join("missing"), options);

        assert!(matches!(
            target.save(b"x", "a.csv"),
            Err(SaveError::DestinationInitFailed { .. })
        ));
        assert_eq!(target.report().error_count(), 1);
    }

    #[test]
    fn test_directory_target_conflict_policies() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), b"old").unwrap();

        let mut target = DirectorySaveTarget::new(
            dir.path(),
            SpecSaveOptions {
                rule_conflict: EnumSaveConflictStrategy::Skip,
                ..SpecSaveOptions::default()
            },
        );
        target.save(b"new", "a.csv").unwrap();
        assert_eq!(fs::read(dir.path().join("a.csv")).unwrap(), b"old");
        assert_eq!(target.report().cnt_skipped, 1);

        let mut target = DirectorySaveTarget::new(
            dir.path(),
            SpecSaveOptions {
                rule_conflict: EnumSaveConflictStrategy::Error,
                ..SpecSaveOptions::default()
            },
        );
        assert!(matches!(
            target.save(b"new", "a.csv"),
            Err(SaveError::DestinationExists(_))
        ));

        let mut target = DirectorySaveTarget::new(dir.path(), SpecSaveOptions::default());
        target.save(b"new", "a.csv").unwrap();
        assert_eq!(fs::read(dir.path().join("a.csv")).unwrap(), b"new");
        assert_eq!(list_dir_names(dir.path()), vec!["a.csv"]);
    }

    #[test]
    fn test_directory_target_dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path_out = dir.path().join("out");
        let options = SpecSaveOptions {
            if_dry_run: true,
            ..SpecSaveOptions::default()
        };
        let mut target = DirectorySaveTarget::new(&path_out, options);

        target.save(b"x", "a.csv").unwrap();
        assert!(!path_out.exists());
        let report = target.report();
        assert_eq!(report.cnt_skipped, 1);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_directory_target_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let mut target = DirectorySaveTarget::new(dir.path(), SpecSaveOptions::default());

        assert!(matches!(
            target.save(b"x", "../escape.csv"),
            Err(SaveError::InvalidFilename { .. })
        ));
        assert!(list_dir_names(dir.path()).is_empty());
    }

    #[test]
    fn test_trigger_download_consumes_artifact_and_delivers_once() {
        let mut target = MemorySaveTarget::new();
        let artifact = SpecExportArtifact::new(b"abc".to_vec(), "a.csv", "text/csv");

        trigger_download(&mut target, artifact);

        assert_eq!(target.len(), 1);
        assert_eq!(target.get("a.csv"), Some(&b"abc"[..]));
    }

    #[test]
    fn test_trigger_download_swallows_failure() {
        struct FailingTarget;
        impl SaveTarget for FailingTarget {
            fn save(&mut self, _bytes: &[u8], _filename: &str) -> Result<(), SaveError> {
                Err(io::Error::other("host refused").into())
            }
        }

        let mut target = FailingTarget;
        trigger_download(
            &mut target,
            SpecExportArtifact::new(vec![], "a.csv", "text/csv"),
        );
    }

    #[test]
    fn test_trigger_download_through_trait_object() {
        let mut target = MemorySaveTarget::new();
        let target_dyn: &mut dyn SaveTarget = &mut target;
        trigger_download(
            target_dyn,
            SpecExportArtifact::new(b"1".to_vec(), "b.xlsx", "application/octet-stream"),
        );
        assert_eq!(target.get("b.xlsx"), Some(&b"1"[..]));
    }
}
