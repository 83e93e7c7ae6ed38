//! Stateless helper utilities used by save targets.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::report::ReportSaveBuilder;
use crate::spec::{EnumSaveConflictStrategy, SaveError};

/// Longest accepted file name in bytes.
pub const N_LEN_FILENAME_MAX: usize = 255;

/// Characters rejected in file names: ASCII control, path separators and
/// the characters reserved by common desktop filesystems.
static REGEX_FILENAME_ILLEGAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[\x00-\x1F\x7F<>:"/\\|?*]"#).expect("Invalid file name regex")
});

////////////////////////////////////////////////////////////////////////////////
// #region FilenameValidation

/// Validate that `filename` is a single, portable path component.
pub fn validate_filename(filename: &str) -> Result<(), SaveError> {
    if filename.trim().is_empty() {
        return Err(SaveError::invalid_filename(filename, "file name is empty"));
    }
    if filename.len() > N_LEN_FILENAME_MAX {
        return Err(SaveError::invalid_filename(
            filename,
            format!(
                "file name is {} bytes, limit is {N_LEN_FILENAME_MAX}",
                filename.len()
            ),
        ));
    }
    if filename == "." || filename == ".." {
        return Err(SaveError::invalid_filename(
            filename,
            "file name must not be `.` or `..`",
        ));
    }

    if let Some(m) = REGEX_FILENAME_ILLEGAL.find(filename) {
        let c_reason = match m.as_str() {
            "/" | "\\" => "contains path separator".to_string(),
            c_hit if c_hit.chars().all(char::is_control) => {
                format!("contains control character at byte {}", m.start())
            }
            c_hit => format!("contains reserved character {c_hit:?}"),
        };
        return Err(SaveError::invalid_filename(filename, c_reason));
    }

    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn _absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// Reject destinations that leave `path_dir_root` or write through a symlink.
pub(crate) fn validate_destination_path_safety(
    path_dst: &Path,
    path_dir_root: &Path,
) -> Result<(), SaveError> {
    let path_dir_root_abs = _absolutize_path(path_dir_root);
    let path_dst_abs = _absolutize_path(path_dst);

    let path_parent_dst = path_dst_abs.parent().ok_or_else(|| {
        SaveError::UnsafePath(format!(
            "failed to derive parent directory: {}",
            path_dst.display()
        ))
    })?;
    if !path_dst_abs.starts_with(&path_dir_root_abs) || path_parent_dst != path_dir_root_abs {
        return Err(SaveError::UnsafePath(format!(
            "destination escapes target directory: {} (root={})",
            path_dst.display(),
            path_dir_root.display()
        )));
    }

    match fs::symlink_metadata(&path_dst_abs) {
        Ok(meta_dst) if meta_dst.file_type().is_symlink() => {
            Err(SaveError::UnsafePath(format!(
                "destination is an existing symlink: {}",
                path_dst.display()
            )))
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SaveError::UnsafePath(format!(
            "failed to inspect destination {} ({e})",
            path_dst.display()
        ))),
    }
}

/// Decide whether an existing destination blocks the save.
///
/// Returns `Ok(true)` when the artifact should be skipped, `Ok(false)` when
/// the write may proceed.
pub(crate) fn should_skip_file_conflict(
    path_dst: &Path,
    rule_conflict: EnumSaveConflictStrategy,
    builder_report: &mut ReportSaveBuilder,
) -> Result<bool, SaveError> {
    if !path_dst.exists() {
        return Ok(false);
    }
    if path_dst.is_dir() {
        return Err(SaveError::UnsafePath(format!(
            "destination is a directory: {}",
            path_dst.display()
        )));
    }

    match rule_conflict {
        EnumSaveConflictStrategy::Skip => {
            builder_report.add_skipped();
            Ok(true)
        }
        EnumSaveConflictStrategy::Error => Err(SaveError::DestinationExists(path_dst.to_path_buf())),
        EnumSaveConflictStrategy::Overwrite => Ok(false),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filename_accepts_export_names() {
        assert!(validate_filename("kol_export_2024-01-05T14-03-07.xlsx").is_ok());
        assert!(validate_filename("KOL导出_2024-01-05T14-03-07.csv").is_ok());
        assert!(validate_filename("kol..v2.xlsx").is_ok());
        assert!(validate_filename("..hidden.csv").is_ok());
    }

    #[test]
    fn test_validate_filename_rejects_bad_names() {
        for c_name in ["", "  ", "a/b.csv", "a\\b.csv", ".", "..", "../x.csv", "a:b.csv", "tab\there"] {
            assert!(
                matches!(validate_filename(c_name), Err(SaveError::InvalidFilename { .. })),
                "{c_name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_filename_reason_names_the_problem() {
        let err = validate_filename("a/b.csv").unwrap_err();
        assert!(err.to_string().contains("path separator"));

        let err = validate_filename("bell\u{7}.csv").unwrap_err();
        assert!(err.to_string().contains("control character at byte 4"));
    }

    #[test]
    fn test_validate_filename_length_is_bytes() {
        let c_ok = format!("{}.csv", "a".repeat(N_LEN_FILENAME_MAX - 4));
        assert!(validate_filename(&c_ok).is_ok());

        // 3 bytes per char
        let c_long = "导".repeat(90);
        assert!(validate_filename(&c_long).is_err());
    }

    #[test]
    fn test_validate_destination_path_safety() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_destination_path_safety(&dir.path().join("a.csv"), dir.path()).is_ok());
        assert!(
            validate_destination_path_safety(&dir.path().join("sub").join("a.csv"), dir.path())
                .is_err()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_destination_path_safety_rejects_symlink() {
        let dir = tempfile::tempdir().unwrap();
        let path_real = dir.path().join("real.csv");
        fs::write(&path_real, b"x").unwrap();
        let path_link = dir.path().join("link.csv");
        std::os::unix::fs::symlink(&path_real, &path_link).unwrap();

        assert!(matches!(
            validate_destination_path_safety(&path_link, dir.path()),
            Err(SaveError::UnsafePath(_))
        ));
    }

    #[test]
    fn test_should_skip_file_conflict_policies() {
        let dir = tempfile::tempdir().unwrap();
        let path_dst = dir.path().join("a.csv");
        let mut builder = ReportSaveBuilder::default();

        assert!(
            !should_skip_file_conflict(&path_dst, EnumSaveConflictStrategy::Error, &mut builder)
                .unwrap()
        );

        fs::write(&path_dst, b"old").unwrap();
        assert!(
            !should_skip_file_conflict(&path_dst, EnumSaveConflictStrategy::Overwrite, &mut builder)
                .unwrap()
        );
        assert!(
            should_skip_file_conflict(&path_dst, EnumSaveConflictStrategy::Skip, &mut builder)
                .unwrap()
        );
        assert_eq!(builder.cnt_skipped, 1);
        assert!(matches!(
            should_skip_file_conflict(&path_dst, EnumSaveConflictStrategy::Error, &mut builder),
            Err(SaveError::DestinationExists(_))
        ));
    }
}
