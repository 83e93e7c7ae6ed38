//! Export pipeline: records → formatted rows → document → save target.

use chrono::{DateTime, Utc};
use kolkit_io_fs::{SaveTarget, SpecExportArtifact, trigger_download, validate_filename};
use kolkit_io_xlsx::{
    SpecBinaryDocument, SpecSheetColumn, SpecWorkbookOptions, build_sheet, build_workbook,
};
use polars::prelude::DataFrame;

use crate::conf::{EnumExportKind, SpecExportConfig};
use crate::delimited::{SpecCsvOptions, write_csv_document};
use crate::error::Result;
use crate::fmt::{EnumLocale, SpecFormatContext};
use crate::frame::map_dataframe;
use crate::kol::{
    C_SHEET_NAME_KOL, derive_kol_columns, derive_kol_filename_prefix, derive_kol_label_catalog,
};
use crate::mapper::{
    SpecExportColumn, SpecFormattedRow, SpecMapContext, map_records, validate_columns,
};
use crate::naming::derive_export_filename;
use crate::record::Record;

////////////////////////////////////////////////////////////////////////////////
// #region Plan

/// Validated, reusable description of one kind of export.
///
/// Built once; every export call borrows it immutably.
#[derive(Debug, Clone)]
pub struct SpecExportPlan {
    pub columns: Vec<SpecExportColumn>,
    pub context: SpecMapContext,
    pub kind: EnumExportKind,
    pub sheet_name: String,
    pub filename_prefix: String,
    pub csv_options: SpecCsvOptions,
    pub workbook_options: SpecWorkbookOptions,
}

impl SpecExportPlan {
    /// Plan with default output settings; fails when `columns` cannot map.
    pub fn new(columns: Vec<SpecExportColumn>, context: SpecMapContext) -> Result<Self> {
        validate_columns(&columns, &context.catalog)?;
        Ok(Self {
            columns,
            context,
            kind: EnumExportKind::Xlsx,
            sheet_name: C_SHEET_NAME_KOL.to_string(),
            filename_prefix: derive_kol_filename_prefix(EnumLocale::EnUs).to_string(),
            csv_options: SpecCsvOptions::default(),
            workbook_options: SpecWorkbookOptions::default(),
        })
    }

    /// The seventeen-column KOL export for `locale`.
    pub fn derive_kol(locale: EnumLocale) -> Result<Self> {
        let context = SpecMapContext {
            format: SpecFormatContext::new(locale),
            catalog: derive_kol_label_catalog(locale),
        };
        Ok(Self::new(derive_kol_columns(locale), context)?
            .with_filename_prefix(derive_kol_filename_prefix(locale)))
    }

    /// Plan described by a loaded configuration.
    pub fn from_config(config: &SpecExportConfig) -> Result<Self> {
        let context = SpecMapContext {
            format: config.derive_format_context()?,
            catalog: config.derive_label_catalog(),
        };
        Ok(Self::new(config.derive_columns()?, context)?
            .with_kind(config.output.kind)
            .with_sheet_name(config.output.sheet_name.clone())
            .with_filename_prefix(config.derive_filename_prefix())
            .with_csv_options(config.derive_csv_options()))
    }

    /// Set the output document type.
    pub fn with_kind(mut self, kind: EnumExportKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set the worksheet name (sanitized when written).
    pub fn with_sheet_name(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = sheet_name.into();
        self
    }

    /// Set the file name prefix used by [`Self::derive_filename`].
    pub fn with_filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filename_prefix = prefix.into();
        self
    }

    /// Set CSV quoting, BOM and delimiter.
    pub fn with_csv_options(mut self, options: SpecCsvOptions) -> Self {
        self.csv_options = options;
        self
    }

    /// Set workbook formats and document properties.
    pub fn with_workbook_options(mut self, options: SpecWorkbookOptions) -> Self {
        self.workbook_options = options;
        self
    }

    /// Column labels in order.
    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.label.as_str()).collect()
    }

    /// Column labels and width hints for the spreadsheet writer.
    pub fn sheet_columns(&self) -> Vec<SpecSheetColumn> {
        self.columns
            .iter()
            .map(SpecExportColumn::to_sheet_column)
            .collect()
    }

    /// Map records through this plan's columns and context.
    pub fn map_records<I, R>(&self, records: I) -> Result<Vec<SpecFormattedRow>>
    where
        I: IntoIterator<Item = R>,
        R: Record,
    {
        map_records(records, &self.columns, &self.context)
    }

    /// Map every row of `df` through this plan's columns and context.
    pub fn map_dataframe(&self, df: &DataFrame) -> Result<Vec<SpecFormattedRow>> {
        map_dataframe(df, &self.columns, &self.context)
    }

    /// `<prefix>_<timestamp>.<ext>` for this plan's document kind.
    pub fn derive_filename(&self, now: &DateTime<Utc>) -> String {
        derive_export_filename(&self.filename_prefix, self.kind.extension(), now)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Documents

/// Single-sheet workbook from already formatted rows.
pub fn export_rows_to_xlsx(
    rows: Vec<SpecFormattedRow>,
    plan: &SpecExportPlan,
) -> Result<SpecBinaryDocument> {
    let sheet = build_sheet(
        plan.sheet_name.clone(),
        plan.sheet_columns(),
        rows.into_iter().map(SpecFormattedRow::into_cells),
    )?;
    Ok(build_workbook(&[sheet], &plan.workbook_options)?)
}

/// CSV document from already formatted rows.
pub fn export_rows_to_csv(rows: &[SpecFormattedRow], plan: &SpecExportPlan) -> Result<Vec<u8>> {
    write_csv_document(
        &plan.header(),
        rows.iter()
            .map(|row| row.cells.iter().map(String::as_str)),
        &plan.csv_options,
    )
}

/// Map `records` and build a single-sheet workbook.
pub fn export_records_to_xlsx<I, R>(records: I, plan: &SpecExportPlan) -> Result<SpecBinaryDocument>
where
    I: IntoIterator<Item = R>,
    R: Record,
{
    export_rows_to_xlsx(plan.map_records(records)?, plan)
}

/// Map `records` and build a CSV document.
pub fn export_records_to_csv<I, R>(records: I, plan: &SpecExportPlan) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: Record,
{
    export_rows_to_csv(&plan.map_records(records)?, plan)
}

/// Render rows as the plan's document kind.
pub fn render_rows(rows: Vec<SpecFormattedRow>, plan: &SpecExportPlan) -> Result<Vec<u8>> {
    match plan.kind {
        EnumExportKind::Xlsx => Ok(export_rows_to_xlsx(rows, plan)?.into_bytes()),
        EnumExportKind::Csv => export_rows_to_csv(&rows, plan),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Delivery

/// Hand formatted rows to `target` and return the issued file name.
///
/// Delivery itself is fire-and-forget: host failures are logged by
/// [`trigger_download`], not returned.
pub fn deliver_rows<T>(
    rows: Vec<SpecFormattedRow>,
    plan: &SpecExportPlan,
    target: &mut T,
    filename_override: Option<&str>,
    now: &DateTime<Utc>,
) -> Result<String>
where
    T: SaveTarget + ?Sized,
{
    let filename = match filename_override {
        Some(c_name) => c_name.to_string(),
        None => plan.derive_filename(now),
    };
    validate_filename(&filename)?;

    let n_rows = rows.len();
    let v_bytes = render_rows(rows, plan)?;
    tracing::info!(
        filename = %filename,
        kind = ?plan.kind,
        rows = n_rows,
        bytes = v_bytes.len(),
        "export issued"
    );

    trigger_download(
        target,
        SpecExportArtifact::new(v_bytes, filename.clone(), plan.kind.content_type()),
    );
    Ok(filename)
}

/// Map, render and deliver `records` in one call.
pub fn export_records<I, R, T>(
    records: I,
    plan: &SpecExportPlan,
    target: &mut T,
    filename_override: Option<&str>,
    now: &DateTime<Utc>,
) -> Result<String>
where
    I: IntoIterator<Item = R>,
    R: Record,
    T: SaveTarget + ?Sized,
{
    deliver_rows(plan.map_records(records)?, plan, target, filename_override, now)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use kolkit_io_fs::MemorySaveTarget;
    use serde_json::json;

    use super::*;
    use crate::error::ExportError;

    fn derive_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 14, 3, 7).unwrap()
    }

    #[test]
    fn test_plan_rejects_invalid_columns() {
        let err = SpecExportPlan::new(vec![], SpecMapContext::default()).unwrap_err();
        assert!(matches!(err, ExportError::InvalidColumnSpec { .. }));
    }

    #[test]
    fn test_kol_plan_filename() {
        let plan = SpecExportPlan::derive_kol(EnumLocale::ZhCn)
            .unwrap()
            .with_kind(EnumExportKind::Csv);
        assert_eq!(plan.derive_filename(&derive_now()), "KOL导出_2024-01-05T14-03-07.csv");
        assert_eq!(plan.header().len(), 17);
    }

    #[test]
    fn test_export_records_delivers_to_target() {
        let plan = SpecExportPlan::derive_kol(EnumLocale::EnUs).unwrap();
        let records: Vec<serde_json::Value> = vec![];
        let mut target = MemorySaveTarget::new();

        let filename = export_records(&records, &plan, &mut target, None, &derive_now()).unwrap();

        assert_eq!(filename, "kol_export_2024-01-05T14-03-07.xlsx");
        assert!(target.get(&filename).unwrap().starts_with(b"PK"));
    }

    #[test]
    fn test_workbook_options_reach_the_document() {
        let plan = SpecExportPlan::derive_kol(EnumLocale::EnUs)
            .unwrap()
            .with_sheet_name("Partners")
            .with_workbook_options(SpecWorkbookOptions {
                author: Some("outreach".to_string()),
                ..SpecWorkbookOptions::default()
            });
        let records: Vec<serde_json::Value> = vec![];

        let v_default = export_records_to_xlsx(&records, &SpecExportPlan::derive_kol(EnumLocale::EnUs).unwrap())
            .unwrap();
        let v_custom = export_records_to_xlsx(&records, &plan).unwrap();
        assert_ne!(v_default, v_custom);
    }

    #[test]
    fn test_export_records_rejects_bad_override_before_delivery() {
        let plan = SpecExportPlan::derive_kol(EnumLocale::EnUs).unwrap();
        let mut target = MemorySaveTarget::new();
        let records: Vec<serde_json::Value> = vec![];

        let err = export_records(&records, &plan, &mut target, Some("../x.xlsx"), &derive_now())
            .unwrap_err();
        assert!(matches!(err, ExportError::Save(_)));
        assert!(target.is_empty());
    }

    #[test]
    fn test_mapping_error_delivers_nothing() {
        let plan = SpecExportPlan::derive_kol(EnumLocale::EnUs).unwrap();
        let mut target = MemorySaveTarget::new();
        let records = vec![json!({"username": "alice"})];

        assert!(export_records(&records, &plan, &mut target, None, &derive_now()).is_err());
        assert!(target.is_empty());
    }
}
