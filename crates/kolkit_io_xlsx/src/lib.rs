//! `kolkit_io_xlsx` v1:
//! Spreadsheet writer kernel for tabular exports.
//!
//! Modules:
//! - `conf`   : constants and default presets
//! - `spec`   : sheet/workbook models, options, errors
//! - `util`   : pure helper functions
//! - `writer` : sheet builder and workbook serializer
pub mod conf;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_EXT_XLSX, C_MIME_XLSX, N_LEN_EXCEL_CELL_MAX, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX,
    N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
pub use spec::{
    SpecBinaryDocument, SpecCellFormat, SpecSheet, SpecSheetColumn, SpecSheetSlice,
    SpecWorkbookOptions, SpecXlsxReport, XlsxWriteError,
};
pub use util::{
    create_sheet_identifier, plan_sheet_slices, sanitize_sheet_name, truncate_cell_value,
};
pub use writer::{XlsxWriter, build_sheet, build_workbook};
