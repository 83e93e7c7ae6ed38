//! `kolkit_export` v1:
//! Record export pipeline for KOL outreach data.
//!
//! Modules:
//! - `fmt`       : locale-aware counts, flags, timestamps, label lookup
//! - `delimited` : CSV field escaping and CSV documents
//! - `record`    : `Record` trait over JSON objects
//! - `mapper`    : column specification and record → row projection
//! - `kol`       : KOL record, label catalogs, column preset
//! - `frame`     : polars `DataFrame` rows as records
//! - `conf`      : TOML configuration
//! - `naming`    : timestamped export file names
//! - `export`    : export plan, document rendering, delivery
//! - `error`     : error type
pub mod conf;
pub mod delimited;
pub mod error;
pub mod export;
pub mod fmt;
pub mod frame;
pub mod kol;
pub mod mapper;
pub mod naming;
pub mod record;

pub use conf::{EnumExportKind, SpecColumnConfig, SpecExportConfig};
pub use delimited::{EnumCsvQuote, SpecCsvOptions, escape_csv_value, render_csv_line, write_csv_document};
pub use error::{ExportError, Result};
pub use export::{
    SpecExportPlan, deliver_rows, export_records, export_records_to_csv, export_records_to_xlsx,
    export_rows_to_csv, export_rows_to_xlsx, render_rows,
};
pub use fmt::{
    EnumLocale, SpecFormatContext, SpecLabelTable, format_count, format_flag, format_number,
    format_timestamp, lookup_label, parse_timestamp,
};
pub use frame::{FrameRecord, map_dataframe, read_dataframe_from_ipc_bytes};
pub use kol::{
    EnumContentCategory, EnumKolStatus, Kol, derive_kol_columns, derive_kol_filename_prefix,
    derive_kol_label_catalog,
};
pub use mapper::{
    EnumColumnKind, SpecExportColumn, SpecFormattedRow, SpecLabelCatalog, SpecMapContext,
    map_record, map_records, validate_columns,
};
pub use naming::{derive_export_filename, derive_filename_timestamp};
pub use record::{EnumFieldValue, Record};
