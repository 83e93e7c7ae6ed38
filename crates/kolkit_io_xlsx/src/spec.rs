//! Shared XLSX specification models and errors.

use chrono::NaiveDateTime;
use rust_xlsxwriter::XlsxError;
use thiserror::Error;

use crate::conf::{C_EXT_XLSX, C_MIME_XLSX, derive_default_created_at, derive_default_xlsx_formats};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification translated into a `rust_xlsxwriter::Format`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,

    /// Background fill color.
    pub bg_color: Option<String>,
    /// Font color.
    pub font_color: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
            bg_color: other.bg_color.clone().or_else(|| self.bg_color.clone()),
            font_color: other.font_color.clone().or_else(|| self.font_color.clone()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetSpecification

/// One column of a sheet: header label plus width hint in character units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetColumn {
    /// Header text.
    pub label: String,
    /// Width hint; presentation only.
    pub width: u16,
}

impl SpecSheetColumn {
    /// Create a column from label and width hint.
    pub fn new(label: impl Into<String>, width: u16) -> Self {
        Self {
            label: label.into(),
            width,
        }
    }
}

/// In-memory sheet handle: header derived from `columns`, then `rows`.
///
/// Every row has exactly `columns.len()` cells; [`crate::writer::build_sheet`]
/// enforces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheet {
    /// Requested sheet name (sanitized when written).
    pub name: String,
    /// Ordered column specification.
    pub columns: Vec<SpecSheetColumn>,
    /// Data rows of display strings, in column order.
    pub rows: Vec<Vec<String>>,
}

impl SpecSheet {
    /// Header labels in column order.
    pub fn header(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.label.as_str()).collect()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of data rows (header excluded).
    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Workbook-wide options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecWorkbookOptions {
    /// Body cell format.
    pub fmt_text: SpecCellFormat,
    /// Header cell format.
    pub fmt_header: SpecCellFormat,
    /// Freeze the header row.
    pub if_freeze_header: bool,
    /// Creation timestamp written into document properties.
    pub created_at: NaiveDateTime,
    /// Optional document author.
    pub author: Option<String>,
}

impl Default for SpecWorkbookOptions {
    fn default() -> Self {
        let dict_fmt = derive_default_xlsx_formats();
        Self {
            fmt_text: dict_fmt.get("text").cloned().unwrap_or_default(),
            fmt_header: dict_fmt.get("header").cloned().unwrap_or_default(),
            if_freeze_header: true,
            created_at: derive_default_created_at(),
            author: None,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region OutputSpecification

/// Serialized workbook bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecBinaryDocument {
    bytes: Vec<u8>,
}

impl SpecBinaryDocument {
    /// Wrap serialized workbook bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Raw document bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take ownership of the bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// OOXML spreadsheet content type.
    pub fn content_type(&self) -> &'static str {
        C_MIME_XLSX
    }

    /// File extension without dot.
    pub fn extension(&self) -> &'static str {
        C_EXT_XLSX
    }

    /// Document size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the document is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Concrete sheet part emitted to workbook (after Excel-limit slicing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetSlice {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Inclusive source row start.
    pub row_start_inclusive: usize,
    /// Exclusive source row end.
    pub row_end_exclusive: usize,
}

/// Per-sheet write report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheet slices produced by the write call.
    pub sheets: Vec<SpecSheetSlice>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Errors raised while building sheets or serializing a workbook.
#[derive(Debug, Error)]
pub enum XlsxWriteError {
    /// Underlying `rust_xlsxwriter` failure.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),

    /// A data row does not match the column specification width.
    #[error("sheet {sheet:?} row {row}: expected {expected} cells, got {actual}")]
    RowWidthMismatch {
        sheet: String,
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Column labels are not unique.
    #[error("duplicate column labels detected: {0}")]
    DuplicateColumns(String),

    /// Column specification is empty or too wide.
    #[error("invalid column specification: {0}")]
    InvalidColumns(String),

    /// Row/column index does not fit Excel's index types.
    #[error("{0}")]
    IndexOverflow(String),

    /// `build_workbook` called without any sheet.
    #[error("workbook must contain at least one sheet")]
    EmptyWorkbook,

    /// Invalid workbook option.
    #[error("invalid workbook option: {0}")]
    InvalidOption(String),
}

/// Result alias for XLSX operations.
pub type Result<T> = std::result::Result<T, XlsxWriteError>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
