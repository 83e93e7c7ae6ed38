//! Command bodies; `main` only parses arguments and prints.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use kolkit_export::{
    EnumExportKind, EnumLocale, Kol, SpecExportConfig, SpecExportPlan, escape_csv_value,
    export_records,
};
use kolkit_io_fs::{DirectorySaveTarget, ReportSave};
use serde_json::Value;
use tracing::{debug, info_span};

/// Inputs of `kolkit export`, after argument parsing.
#[derive(Debug, Clone, Default)]
pub struct SpecExportRequest {
    pub path_input: PathBuf,
    pub path_config: Option<PathBuf>,
    pub path_output_dir: Option<PathBuf>,
    pub kind: Option<EnumExportKind>,
    pub filename: Option<String>,
    pub locale: Option<EnumLocale>,
}

/// Result of one `kolkit export` run.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub filename: String,
    pub path_dir: PathBuf,
    pub report: ReportSave,
}

impl ExportOutcome {
    /// The host may fail after the artifact was issued; the report is the only trace.
    pub fn has_errors(&self) -> bool {
        self.report.error_count() > 0
    }
}

/// Config file (or defaults) with command-line overrides applied.
pub fn load_config(
    path_config: Option<&Path>,
    locale: Option<EnumLocale>,
    kind: Option<EnumExportKind>,
    path_output_dir: Option<&Path>,
) -> Result<SpecExportConfig> {
    let mut config = match path_config {
        Some(path) => SpecExportConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => SpecExportConfig::default(),
    };
    if let Some(locale) = locale {
        config.format.locale = locale;
    }
    if let Some(kind) = kind {
        config.output.kind = kind;
    }
    if let Some(path) = path_output_dir {
        config.output.dir = path.to_path_buf();
    }
    Ok(config)
}

/// Load config, map the input records and save the document into the output directory.
pub fn run_export(request: &SpecExportRequest, now: &DateTime<Utc>) -> Result<ExportOutcome> {
    let span = info_span!("export", input = %request.path_input.display());
    let _guard = span.enter();

    let config = load_config(
        request.path_config.as_deref(),
        request.locale,
        request.kind,
        request.path_output_dir.as_deref(),
    )?;
    let plan = SpecExportPlan::from_config(&config).context("build export plan")?;

    let content = fs::read_to_string(&request.path_input)
        .with_context(|| format!("read {}", request.path_input.display()))?;

    let mut target = DirectorySaveTarget::new(&config.output.dir, config.derive_save_options());
    let filename_override = request.filename.as_deref();

    let filename = if config.has_custom_columns() {
        let l_records: Vec<Value> =
            serde_json::from_str(&content).context("parse input as a JSON array of objects")?;
        debug!(records = l_records.len(), "input parsed");
        export_records(&l_records, &plan, &mut target, filename_override, now)?
    } else {
        let l_records: Vec<Kol> =
            serde_json::from_str(&content).context("parse input as a JSON array of KOL records")?;
        debug!(records = l_records.len(), "input parsed");
        export_records(&l_records, &plan, &mut target, filename_override, now)?
    };

    Ok(ExportOutcome {
        filename,
        path_dir: target.dir().to_path_buf(),
        report: target.report(),
    })
}

/// One `label<TAB>key<TAB>kind<TAB>width` line per active column.
pub fn run_columns(path_config: Option<&Path>, locale: Option<EnumLocale>) -> Result<Vec<String>> {
    let config = load_config(path_config, locale, None, None)?;
    let plan = SpecExportPlan::from_config(&config)?;
    Ok(plan
        .columns
        .iter()
        .map(|col| format!("{}\t{}\t{}\t{}", col.label, col.key, col.kind, col.width))
        .collect())
}

/// Escape each value as one CSV field.
pub fn run_escape<S: AsRef<str>>(values: &[S]) -> Vec<String> {
    values
        .iter()
        .map(|v| escape_csv_value(Some(v.as_ref())))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn derive_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 14, 3, 7).unwrap()
    }

    #[test]
    fn test_run_escape() {
        assert_eq!(
            run_escape(&["plain", "hi, there", "say \"x\""]),
            vec!["plain", "\"hi, there\"", "\"say \"\"x\"\"\""]
        );
    }

    #[test]
    fn test_run_columns_preset() {
        let l_lines = run_columns(None, Some(EnumLocale::EnUs)).unwrap();
        assert_eq!(l_lines.len(), 17);
        assert_eq!(l_lines[0], "Username\tusername\ttext\t20");
        assert_eq!(l_lines[4], "Status\tstatus\tlabel(status)\t12");
    }

    #[test]
    fn test_run_export_kol_records() {
        let dir = tempfile::tempdir().unwrap();
        let path_input = dir.path().join("kols.json");
        fs::write(
            &path_input,
            json!([{
                "id": 1,
                "username": "alice",
                "displayName": "Alice",
                "followerCount": 1000,
                "contentCategory": "web3",
                "status": "new",
                "createdAt": "2024-01-05T14:03:07Z",
                "updatedAt": "2024-01-05T14:03:07Z"
            }])
            .to_string(),
        )
        .unwrap();

        let path_out = dir.path().join("out");
        let request = SpecExportRequest {
            path_input,
            path_output_dir: Some(path_out.clone()),
            kind: Some(EnumExportKind::Csv),
            ..SpecExportRequest::default()
        };
        let outcome = run_export(&request, &derive_now()).unwrap();

        assert_eq!(outcome.filename, "kol_export_2024-01-05T14-03-07.csv");
        assert!(!outcome.has_errors());
        assert_eq!(outcome.report.cnt_saved, 1);
        let c_text = fs::read_to_string(path_out.join(&outcome.filename)).unwrap();
        assert!(c_text.contains("\"alice\",\"Alice\",\"1,000\""));
    }

    #[test]
    fn test_run_export_rejects_malformed_input() {
        let dir = tempfile::tempdir().unwrap();
        let path_input = dir.path().join("bad.json");
        fs::write(&path_input, "{not json").unwrap();

        let request = SpecExportRequest {
            path_input,
            path_output_dir: Some(dir.path().to_path_buf()),
            ..SpecExportRequest::default()
        };
        assert!(run_export(&request, &derive_now()).is_err());
    }
}
