//! Plain-text delimited export: single-field escaping and CSV documents.

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

/// UTF-8 byte order mark; spreadsheet tools use it to detect the encoding.
pub const C_BOM_UTF8: &str = "\u{feff}";
/// Content type of an exported CSV document.
pub const C_MIME_CSV: &str = "text/csv;charset=utf-8";
/// File extension of a CSV document (without dot).
pub const C_EXT_CSV: &str = "csv";

////////////////////////////////////////////////////////////////////////////////
// #region FieldEscaping

/// Escape one raw field for a comma-delimited line.
///
/// `None` and `""` become `""`. Every `"` is doubled, then the value is
/// wrapped in quotes when it contains `,`, `\n` or `"`. Apply once per raw
/// field; re-escaping an escaped value is not supported.
pub fn escape_csv_value(value: Option<&str>) -> String {
    let Some(c_value) = value.filter(|v| !v.is_empty()) else {
        return String::new();
    };

    let c_escaped = c_value.replace('"', "\"\"");
    if c_escaped.contains([',', '\n', '"']) {
        format!("\"{c_escaped}\"")
    } else {
        c_escaped
    }
}

/// Escape each value and join with `,`. No line terminator is appended.
pub fn render_csv_line<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .map(|v| escape_csv_value(Some(v.as_ref())))
        .collect::<Vec<_>>()
        .join(",")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Document

/// Field quoting policy for [`write_csv_document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumCsvQuote {
    /// Quote every field, header included.
    #[default]
    All,
    /// Quote only fields that need it.
    Necessary,
}

/// CSV document options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecCsvOptions {
    pub rule_quote: EnumCsvQuote,
    pub if_bom: bool,
    pub delimiter: u8,
}

impl Default for SpecCsvOptions {
    fn default() -> Self {
        Self {
            rule_quote: EnumCsvQuote::All,
            if_bom: true,
            delimiter: b',',
        }
    }
}

/// Render a header row plus data rows as a `\n`-terminated CSV document.
///
/// Every row must have as many fields as `header`.
pub fn write_csv_document<I, R, S>(header: &[S], rows: I, options: &SpecCsvOptions) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = S>,
    S: AsRef<[u8]>,
{
    let quote_style = match options.rule_quote {
        EnumCsvQuote::All => csv::QuoteStyle::Always,
        EnumCsvQuote::Necessary => csv::QuoteStyle::Necessary,
    };

    let mut v_out = Vec::new();
    if options.if_bom {
        v_out.extend_from_slice(C_BOM_UTF8.as_bytes());
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .quote_style(quote_style)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(v_out);

    writer.write_record(header)?;
    let mut n_rows = 0usize;
    for row in rows {
        writer.write_record(row)?;
        n_rows += 1;
    }
    tracing::debug!(rows = n_rows, cols = header.len(), "csv document rendered");

    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
