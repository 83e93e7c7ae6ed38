//! Record → formatted row projection driven by a column specification.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use kolkit_io_xlsx::SpecSheetColumn;

use crate::error::{ExportError, Result};
use crate::fmt::{
    SpecFormatContext, SpecLabelTable, format_count, format_flag, format_number, format_timestamp,
    lookup_label, parse_timestamp,
};
use crate::record::{EnumFieldValue, Record};

////////////////////////////////////////////////////////////////////////////////
// #region ColumnSpec

/// How a column renders its field and what a missing field becomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumColumnKind {
    /// Required text; scalars render plainly.
    Text,
    /// Text, `""` when missing.
    OptionalText,
    /// Grouped integer, `"0"` when missing.
    Count,
    /// Decimal without grouping, `""` when missing.
    Number,
    /// Locale yes/no, "no" when missing.
    Flag,
    /// Required enumerated value mapped through the named label table.
    Label { table: String },
    /// Required locale date-time.
    Timestamp,
    /// Locale date-time, `""` when missing.
    OptionalTimestamp,
}

impl EnumColumnKind {
    /// Config name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::OptionalText => "optional_text",
            Self::Count => "count",
            Self::Number => "number",
            Self::Flag => "flag",
            Self::Label { .. } => "label",
            Self::Timestamp => "timestamp",
            Self::OptionalTimestamp => "optional_timestamp",
        }
    }
}

impl fmt::Display for EnumColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label { table } => write!(f, "label({table})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// One output column: header label, width hint, source key and rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecExportColumn {
    pub label: String,
    pub width: u16,
    pub key: String,
    pub kind: EnumColumnKind,
}

impl SpecExportColumn {
    /// Create a column.
    pub fn new(
        label: impl Into<String>,
        width: u16,
        key: impl Into<String>,
        kind: EnumColumnKind,
    ) -> Self {
        Self {
            label: label.into(),
            width,
            key: key.into(),
            kind,
        }
    }

    /// Label and width hint for the spreadsheet writer.
    pub fn to_sheet_column(&self) -> SpecSheetColumn {
        SpecSheetColumn::new(self.label.clone(), self.width)
    }
}

/// Label tables by name, loaded once and passed by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecLabelCatalog {
    pub tables: BTreeMap<String, SpecLabelTable>,
}

impl SpecLabelCatalog {
    /// Empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Self::insert`].
    pub fn with_table(mut self, table: SpecLabelTable) -> Self {
        self.insert(table);
        self
    }

    /// Add `table`, replacing one with the same name.
    pub fn insert(&mut self, table: SpecLabelTable) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Table `name`; absent tables are [`ExportError::MissingLabelTable`].
    pub fn get(&self, name: &str) -> Result<&SpecLabelTable> {
        self.tables
            .get(name)
            .ok_or_else(|| ExportError::MissingLabelTable {
                table: name.to_string(),
            })
    }

    /// Overlay labels onto table `name`, creating it when absent.
    pub fn merge(&mut self, name: &str, overrides: &BTreeMap<String, String>) {
        self.tables
            .entry(name.to_string())
            .or_insert_with(|| SpecLabelTable::new(name, Vec::<(String, String)>::new()))
            .merge(overrides);
    }
}

/// Everything a column needs besides the record itself.
#[derive(Debug, Clone, Default)]
pub struct SpecMapContext {
    pub format: SpecFormatContext,
    pub catalog: SpecLabelCatalog,
}

/// Formatted cells of one record, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFormattedRow {
    pub cells: Vec<String>,
}

impl SpecFormattedRow {
    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the row has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Value under `label`, looked up through the row's column specification.
    pub fn get<'a>(&'a self, columns: &[SpecExportColumn], label: &str) -> Option<&'a str> {
        columns
            .iter()
            .position(|col| col.label == label)
            .and_then(|n_idx| self.cells.get(n_idx))
            .map(String::as_str)
    }

    /// `(label, value)` pairs in column order.
    pub fn iter_labeled<'a>(
        &'a self,
        columns: &'a [SpecExportColumn],
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        columns
            .iter()
            .zip(self.cells.iter())
            .map(|(col, value)| (col.label.as_str(), value.as_str()))
    }

    /// Take the cells.
    pub fn into_cells(self) -> Vec<String> {
        self.cells
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Validation

/// Reject column lists that could never map a record.
pub fn validate_columns(columns: &[SpecExportColumn], catalog: &SpecLabelCatalog) -> Result<()> {
    if columns.is_empty() {
        return Err(ExportError::invalid_column_spec(
            "at least one column is required",
        ));
    }

    let mut set_labels = BTreeSet::new();
    for (n_idx, column) in columns.iter().enumerate() {
        if column.label.trim().is_empty() {
            return Err(ExportError::invalid_column_spec(format!(
                "column {n_idx} has an empty label"
            )));
        }
        if column.key.trim().is_empty() {
            return Err(ExportError::invalid_column_spec(format!(
                "column {:?} has an empty key",
                column.label
            )));
        }
        if !set_labels.insert(column.label.as_str()) {
            return Err(ExportError::invalid_column_spec(format!(
                "duplicate column label {:?}",
                column.label
            )));
        }
        if let EnumColumnKind::Label { table } = &column.kind {
            catalog.get(table)?;
        }
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Mapping

/// Project one record onto `columns`.
///
/// Field errors carry row index 0; [`map_records`] attaches the real index.
pub fn map_record<R>(
    record: &R,
    columns: &[SpecExportColumn],
    context: &SpecMapContext,
) -> Result<SpecFormattedRow>
where
    R: Record + ?Sized,
{
    let cells = columns
        .iter()
        .map(|column| map_cell(record.field(&column.key), column, context))
        .collect::<Result<Vec<_>>>()?;
    Ok(SpecFormattedRow { cells })
}

/// Project every record, failing on the first malformed one.
pub fn map_records<I, R>(
    records: I,
    columns: &[SpecExportColumn],
    context: &SpecMapContext,
) -> Result<Vec<SpecFormattedRow>>
where
    I: IntoIterator<Item = R>,
    R: Record,
{
    let mut l_rows = Vec::new();
    for (n_row, record) in records.into_iter().enumerate() {
        l_rows.push(map_record(&record, columns, context).map_err(|e| e.at_row(n_row))?);
    }
    tracing::debug!(rows = l_rows.len(), cols = columns.len(), "records mapped");
    Ok(l_rows)
}

fn map_cell(
    value: EnumFieldValue<'_>,
    column: &SpecExportColumn,
    context: &SpecMapContext,
) -> Result<String> {
    let locale = context.format.locale;
    match (&column.kind, value) {
        (
            EnumColumnKind::Text | EnumColumnKind::Label { .. } | EnumColumnKind::Timestamp,
            EnumFieldValue::Missing,
        ) => Err(ExportError::MissingField {
            row: 0,
            key: column.key.clone(),
        }),

        (EnumColumnKind::Text | EnumColumnKind::OptionalText, value) => Ok(render_plain(value)),

        (EnumColumnKind::Count, EnumFieldValue::Missing) => Ok("0".to_string()),
        (EnumColumnKind::Count, EnumFieldValue::Integer(n)) => Ok(format_count(n, locale)),
        (EnumColumnKind::Count, EnumFieldValue::Number(v))
            if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 =>
        {
            Ok(format_count(v as i64, locale))
        }
        (EnumColumnKind::Count, EnumFieldValue::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(|n| format_count(n, locale))
            .map_err(|_| mismatch(column, "integer", format!("text {s:?}"))),

        (EnumColumnKind::Number, EnumFieldValue::Missing) => Ok(String::new()),
        (EnumColumnKind::Number, EnumFieldValue::Integer(n)) => Ok(n.to_string()),
        (EnumColumnKind::Number, EnumFieldValue::Number(v)) => Ok(format_number(v)),
        (EnumColumnKind::Number, EnumFieldValue::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(format_number)
            .map_err(|_| mismatch(column, "number", format!("text {s:?}"))),

        (EnumColumnKind::Flag, EnumFieldValue::Missing) => Ok(format_flag(false, locale).to_string()),
        (EnumColumnKind::Flag, EnumFieldValue::Flag(b)) => Ok(format_flag(b, locale).to_string()),
        (EnumColumnKind::Flag, EnumFieldValue::Integer(n)) => {
            Ok(format_flag(n != 0, locale).to_string())
        }
        (EnumColumnKind::Flag, EnumFieldValue::Text(s)) => match s.trim() {
            "true" => Ok(format_flag(true, locale).to_string()),
            "false" => Ok(format_flag(false, locale).to_string()),
            _ => Err(mismatch(column, "flag", format!("text {s:?}"))),
        },

        (EnumColumnKind::Label { table }, EnumFieldValue::Text(s)) => {
            let table = context.catalog.get(table)?;
            lookup_label(&s, table)
                .map(str::to_string)
                .map_err(|e| e.at_key(&column.key))
        }

        (EnumColumnKind::OptionalTimestamp, EnumFieldValue::Missing) => Ok(String::new()),
        (EnumColumnKind::OptionalTimestamp, EnumFieldValue::Text(s)) if s.trim().is_empty() => {
            Ok(String::new())
        }
        (
            EnumColumnKind::Timestamp | EnumColumnKind::OptionalTimestamp,
            EnumFieldValue::Timestamp(ts),
        ) => Ok(format_timestamp(&ts, &context.format)),
        (
            EnumColumnKind::Timestamp | EnumColumnKind::OptionalTimestamp,
            EnumFieldValue::Text(s),
        ) => parse_timestamp(&s)
            .map(|ts| format_timestamp(&ts, &context.format))
            .map_err(|e| e.at_key(&column.key)),

        (kind, value) => Err(mismatch(column, kind.as_str(), value.kind_name().to_string())),
    }
}

fn render_plain(value: EnumFieldValue<'_>) -> String {
    match value {
        EnumFieldValue::Missing => String::new(),
        EnumFieldValue::Text(s) => s.into_owned(),
        EnumFieldValue::Integer(n) => n.to_string(),
        EnumFieldValue::Number(v) => format_number(v),
        EnumFieldValue::Flag(b) => b.to_string(),
        EnumFieldValue::Timestamp(ts) => ts.to_rfc3339(),
    }
}

fn mismatch(column: &SpecExportColumn, expected: &'static str, actual: String) -> ExportError {
    ExportError::FieldTypeMismatch {
        row: 0,
        key: column.key.clone(),
        expected,
        actual,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
