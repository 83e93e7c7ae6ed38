//! Save report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::SpecSaveError;

/// Aggregate counters and diagnostics for one save target.
#[derive(Debug, Default, Clone)]
pub struct ReportSave {
    /// Number of save requests received.
    pub cnt_requested: u64,
    /// Number of artifacts committed to their final path.
    pub cnt_saved: u64,
    /// Number of artifacts skipped by conflict strategy or dry-run.
    pub cnt_skipped: u64,
    /// Total bytes committed.
    pub bytes_written: u64,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
    /// Per-artifact failures.
    pub errors: Vec<SpecSaveError>,
}

impl ReportSave {
    /// Number of collected hard errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_requested".to_string(), self.cnt_requested);
        dict_counts.insert("cnt_saved".to_string(), self.cnt_saved);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("bytes_written".to_string(), self.bytes_written);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} requested={} saved={} skipped={} bytes={} errors={} warnings={}",
            self.cnt_requested,
            self.cnt_saved,
            self.cnt_skipped,
            self.bytes_written,
            self.error_count(),
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportSave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[SAVE]"))
    }
}

/// Mutable accumulator for save statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportSaveBuilder {
    /// See [`ReportSave::cnt_requested`].
    pub cnt_requested: u64,
    /// See [`ReportSave::cnt_saved`].
    pub cnt_saved: u64,
    /// See [`ReportSave::cnt_skipped`].
    pub cnt_skipped: u64,
    /// See [`ReportSave::bytes_written`].
    pub bytes_written: u64,
    /// See [`ReportSave::errors`].
    pub errors: Vec<SpecSaveError>,
    /// See [`ReportSave::warnings`].
    pub warnings: Vec<String>,
}

impl ReportSaveBuilder {
    /// Increment requested count by one.
    pub fn add_requested(&mut self) {
        self.cnt_requested += 1;
    }

    /// Record one committed artifact of `n_bytes`.
    pub fn add_saved(&mut self, n_bytes: usize) {
        self.cnt_saved += 1;
        self.bytes_written += n_bytes as u64;
    }

    /// Increment skipped count by one.
    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Add one path-scoped error.
    pub fn add_error(&mut self, path: std::path::PathBuf, exception: String) {
        self.errors.push(SpecSaveError { path, exception });
    }

    /// Snapshot the current state as an immutable report.
    pub fn snapshot(&self) -> ReportSave {
        self.clone().build()
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportSave {
        ReportSave {
            cnt_requested: self.cnt_requested,
            cnt_saved: self.cnt_saved,
            cnt_skipped: self.cnt_skipped,
            bytes_written: self.bytes_written,
            errors: self.errors,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ReportSave, ReportSaveBuilder};

    #[test]
    fn report_save_to_dict_and_format() {
        let mut builder = ReportSaveBuilder::default();
        builder.add_requested();
        builder.add_requested();
        builder.add_saved(128);
        builder.add_skipped();
        builder.add_warning("dry-run".to_string());

        let report: ReportSave = builder.build();
        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_requested"], 2);
        assert_eq!(dict_counts["cnt_saved"], 1);
        assert_eq!(dict_counts["cnt_skipped"], 1);
        assert_eq!(dict_counts["bytes_written"], 128);
        assert_eq!(dict_counts["cnt_errors"], 0);
        assert_eq!(dict_counts["cnt_warnings"], 1);

        let txt = report.format("[SAVE]");
        assert_eq!(
            txt,
            "[SAVE] requested=2 saved=1 skipped=1 bytes=128 errors=0 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }
}
