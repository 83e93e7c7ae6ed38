//! XLSX writer kernel that turns in-memory sheets into workbook bytes.

use std::borrow::Cow;
use std::collections::BTreeSet;

use chrono::{Datelike, Timelike};
use rust_xlsxwriter::{
    DocProperties, ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook, Worksheet,
};

use crate::conf::N_LEN_EXCEL_SHEET_NAME_MAX;
use crate::spec::{
    Result, SpecBinaryDocument, SpecCellFormat, SpecSheet, SpecSheetColumn, SpecSheetSlice,
    SpecWorkbookOptions, SpecXlsxReport, XlsxWriteError,
};
use crate::util::{
    cast_col_num, cast_row_num, clamp_column_width, plan_sheet_slices, sanitize_sheet_name,
    truncate_cell_value, validate_columns,
};

/// Build a sheet handle from a column specification and display rows.
///
/// The header is derived from `columns` labels; every row must carry exactly
/// one cell per column, in column order.
pub fn build_sheet<I>(
    name: impl Into<String>,
    columns: Vec<SpecSheetColumn>,
    rows: I,
) -> Result<SpecSheet>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let name = name.into();
    validate_columns(&columns)?;

    let n_width = columns.len();
    let mut l_rows = Vec::new();
    for (n_idx_row, row) in rows.into_iter().enumerate() {
        if row.len() != n_width {
            return Err(XlsxWriteError::RowWidthMismatch {
                sheet: name,
                row: n_idx_row,
                expected: n_width,
                actual: row.len(),
            });
        }
        l_rows.push(row);
    }

    Ok(SpecSheet {
        name,
        columns,
        rows: l_rows,
    })
}

/// Serialize one or more sheets into an OOXML workbook.
pub fn build_workbook(
    sheets: &[SpecSheet],
    options: &SpecWorkbookOptions,
) -> Result<SpecBinaryDocument> {
    if sheets.is_empty() {
        return Err(XlsxWriteError::EmptyWorkbook);
    }

    let mut writer = XlsxWriter::new(options.clone())?;
    for sheet in sheets {
        writer.write_sheet(sheet)?;
    }
    writer.finish()
}

/// Stateful workbook writer.
///
/// The workbook is buffered in memory until [`Self::finish`] consumes the
/// writer and returns the serialized document.
pub struct XlsxWriter {
    workbook: Workbook,
    fmt_text: Format,
    fmt_header: Format,
    if_freeze_header: bool,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
}

impl XlsxWriter {
    /// Create a writer with document properties pinned from `options`.
    pub fn new(options: SpecWorkbookOptions) -> Result<Self> {
        let mut workbook = Workbook::new();
        workbook.set_properties(&derive_doc_properties(&options)?);

        Ok(Self {
            workbook,
            fmt_text: derive_rust_xlsx_format(&options.fmt_text),
            fmt_header: derive_rust_xlsx_format(&options.fmt_header),
            if_freeze_header: options.if_freeze_header,
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
        })
    }

    /// Per-sheet write reports collected so far.
    pub fn report(&self) -> &[SpecXlsxReport] {
        &self.l_reports
    }

    /// Number of worksheets written so far (after row-limit slicing).
    pub fn sheet_count(&self) -> usize {
        self.set_sheet_names_existing.len()
    }

    /// Write one sheet; sheets taller than Excel's row limit are split.
    pub fn write_sheet(&mut self, sheet: &SpecSheet) -> Result<()> {
        validate_columns(&sheet.columns)?;

        let mut report = SpecXlsxReport::default();
        let l_sheet_parts =
            plan_sheet_slices(sheet.height(), &sanitize_sheet_name(&sheet.name, "_"), &mut report);
        for c_warning in &report.warnings {
            tracing::warn!(sheet = %sheet.name, "{c_warning}");
        }

        for sheet_slice in l_sheet_parts {
            let sheet_name_unique = self.derive_unique_sheet_name(&sheet_slice.sheet_name);
            let worksheet = self.workbook.add_worksheet();
            worksheet.set_name(&sheet_name_unique)?;

            write_header(worksheet, &sheet.columns, &self.fmt_header)?;
            if self.if_freeze_header {
                worksheet.set_freeze_panes(1, 0)?;
            }
            for (n_idx_col, column) in sheet.columns.iter().enumerate() {
                worksheet.set_column_width(cast_col_num(n_idx_col)?, clamp_column_width(column.width))?;
            }

            let l_rows_slice =
                &sheet.rows[sheet_slice.row_start_inclusive..sheet_slice.row_end_exclusive];
            for (n_row_local, row) in l_rows_slice.iter().enumerate() {
                if row.len() != sheet.width() {
                    return Err(XlsxWriteError::RowWidthMismatch {
                        sheet: sheet.name.clone(),
                        row: sheet_slice.row_start_inclusive + n_row_local,
                        expected: sheet.width(),
                        actual: row.len(),
                    });
                }
                for (n_idx_col, value) in row.iter().enumerate() {
                    let c_value = match truncate_cell_value(value) {
                        Some(c_cut) => {
                            let c_warning = format!(
                                "Excel cell limit: sheet {sheet_name_unique:?} row {} column {:?} \
                                 truncated from {} characters.",
                                sheet_slice.row_start_inclusive + n_row_local,
                                sheet.columns[n_idx_col].label,
                                value.chars().count()
                            );
                            tracing::warn!(sheet = %sheet.name, "{c_warning}");
                            report.warn(c_warning);
                            Cow::Owned(c_cut)
                        }
                        None => Cow::Borrowed(value.as_str()),
                    };
                    write_cell_with_format(
                        worksheet,
                        1 + n_row_local,
                        n_idx_col,
                        &c_value,
                        &self.fmt_text,
                    )?;
                }
            }

            tracing::debug!(
                sheet = %sheet_name_unique,
                rows = l_rows_slice.len(),
                cols = sheet.width(),
                "worksheet written"
            );

            report.sheets.push(SpecSheetSlice {
                sheet_name: sheet_name_unique,
                row_start_inclusive: sheet_slice.row_start_inclusive,
                row_end_exclusive: sheet_slice.row_end_exclusive,
            });
        }

        self.l_reports.push(report);
        Ok(())
    }

    /// Serialize the workbook. Consumes the writer.
    pub fn finish(mut self) -> Result<SpecBinaryDocument> {
        if self.set_sheet_names_existing.is_empty() {
            return Err(XlsxWriteError::EmptyWorkbook);
        }
        let v_bytes = self.workbook.save_to_buffer()?;
        Ok(SpecBinaryDocument::new(v_bytes))
    }

    /// Excel compares sheet names case-insensitively; the set holds lowercased keys.
    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if self.set_sheet_names_existing.insert(name.to_lowercase()) {
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if self.set_sheet_names_existing.insert(candidate.to_lowercase()) {
                return candidate;
            }
            n_idx += 1;
        }
    }
}

fn derive_doc_properties(options: &SpecWorkbookOptions) -> Result<DocProperties> {
    let dt = options.created_at;
    let n_year = u16::try_from(dt.year())
        .map_err(|_| XlsxWriteError::InvalidOption(format!("created_at year: {}", dt.year())))?;
    let excel_dt = ExcelDateTime::from_ymd(n_year, dt.month() as u8, dt.day() as u8)?.and_hms(
        dt.hour() as u16,
        dt.minute() as u8,
        dt.second(),
    )?;

    let mut properties = DocProperties::new().set_creation_datetime(&excel_dt);
    if let Some(c_author) = &options.author {
        properties = properties.set_author(c_author.as_str());
    }
    Ok(properties)
}

fn write_header(
    worksheet: &mut Worksheet,
    columns: &[SpecSheetColumn],
    fmt_header: &Format,
) -> Result<()> {
    for (col_idx, column) in columns.iter().enumerate() {
        write_cell_with_format(worksheet, 0, col_idx, &column.label, fmt_header)?;
    }
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &str,
    format: &Format,
) -> Result<()> {
    if value.is_empty() {
        worksheet.write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)?;
    } else {
        worksheet.write_string_with_format(
            cast_row_num(row_idx)?,
            cast_col_num(col_idx)?,
            value,
            format,
        )?;
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = &spec.font_color {
        format = format.set_font_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "justify" => Some(FormatAlign::Justify),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}
