//! Stateless helper utilities used by the XLSX writer kernel.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{
    N_LEN_EXCEL_CELL_MAX, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, N_WIDTH_EXCEL_COLUMN_MAX,
    TUP_EXCEL_ILLEGAL,
};
use crate::spec::{Result, SpecSheetColumn, SpecSheetSlice, SpecXlsxReport, XlsxWriteError};

////////////////////////////////////////////////////////////////////////////////
// #region ColumnValidation

/// Validate that `columns` is non-empty, fits Excel and has unique labels.
pub fn validate_columns(columns: &[SpecSheetColumn]) -> Result<()> {
    if columns.is_empty() {
        return Err(XlsxWriteError::InvalidColumns(
            "at least one column is required".to_string(),
        ));
    }
    if columns.len() > N_NCOLS_EXCEL_MAX {
        return Err(XlsxWriteError::InvalidColumns(format!(
            "{} columns exceed Excel limit of {N_NCOLS_EXCEL_MAX}",
            columns.len()
        )));
    }

    let l_labels: Vec<&str> = columns.iter().map(|col| col.label.as_str()).collect();
    validate_unique_labels(&l_labels)
}

/// Validate that `labels` has no duplicated names.
pub fn validate_unique_labels(labels: &[&str]) -> Result<()> {
    if labels.len() == labels.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_label) in labels.iter().enumerate() {
        dict_pos.entry(c_label).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_label, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!("{c_label:?} x{} at indices {:?}", l_pos.len(), l_pos))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(XlsxWriteError::DuplicateColumns(c_msg))
}

/// Clamp a width hint into Excel's accepted `1..=255` range.
pub fn clamp_column_width(width: u16) -> f64 {
    f64::from(width.clamp(1, N_WIDTH_EXCEL_COLUMN_MAX))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    // Excel rejects names that begin or end with an apostrophe.
    c_name = c_name.trim().trim_matches('\'').trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Split a sheet's data rows into Excel-compliant sheet slices.
///
/// Every slice repeats the single header row, so each holds at most
/// `N_NROWS_EXCEL_MAX - 1` data rows.
pub fn plan_sheet_slices(
    height_data: usize,
    sheet_name: &str,
    report: &mut SpecXlsxReport,
) -> Vec<SpecSheetSlice> {
    plan_sheet_slices_with_limit(height_data, N_NROWS_EXCEL_MAX - 1, sheet_name, report)
}

pub(crate) fn plan_sheet_slices_with_limit(
    height_data: usize,
    n_rows_data_max: usize,
    sheet_name: &str,
    report: &mut SpecXlsxReport,
) -> Vec<SpecSheetSlice> {
    let n_rows_data_max = usize::max(1, n_rows_data_max);

    let mut l_row_slices = Vec::new();
    let mut n_row_start = 0;
    while n_row_start < height_data {
        let n_row_end = usize::min(height_data, n_row_start + n_rows_data_max);
        l_row_slices.push((n_row_start, n_row_end));
        n_row_start = n_row_end;
    }

    if l_row_slices.is_empty() {
        l_row_slices.push((0, 0));
    }

    let n_parts_total = l_row_slices.len();
    let l_sheet_parts: Vec<SpecSheetSlice> = l_row_slices
        .into_iter()
        .enumerate()
        .map(|(n_idx, (row_start, row_end))| SpecSheetSlice {
            sheet_name: if n_parts_total == 1 {
                sheet_name.to_string()
            } else {
                create_sheet_identifier(sheet_name, n_idx + 1)
            },
            row_start_inclusive: row_start,
            row_end_exclusive: row_end,
        })
        .collect();

    if n_parts_total > 1 {
        report.warn(format!(
            "Excel row limit overflow: sheet {sheet_name:?} split into {n_parts_total} sheets."
        ));
    }

    l_sheet_parts
}

/// Create suffixed sheet name (`base_1`, `base_2`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx_1based: usize) -> String {
    let c_sheet_name_suffix = format!("_{part_idx_1based}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

/// Cut `value` to Excel's per-cell character limit.
///
/// Returns `None` when the value already fits.
pub fn truncate_cell_value(value: &str) -> Option<String> {
    match value.char_indices().nth(N_LEN_EXCEL_CELL_MAX) {
        Some((n_byte_end, _)) => Some(value[..n_byte_end].to_string()),
        None => None,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region IndexCasting

pub(crate) fn cast_row_num(value: usize) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| XlsxWriteError::IndexOverflow(format!("row index overflow: {value}")))
}

pub(crate) fn cast_col_num(value: usize) -> Result<u16> {
    u16::try_from(value)
        .map_err(|_| XlsxWriteError::IndexOverflow(format!("column index overflow: {value}")))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
