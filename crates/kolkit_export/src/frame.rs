//! polars `DataFrame` rows as export records.

use std::borrow::Cow;
use std::io::Cursor;

use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};

use crate::error::Result;
use crate::mapper::{SpecExportColumn, SpecFormattedRow, SpecMapContext, map_record};
use crate::record::{EnumFieldValue, Record};

/// One row of a `DataFrame`; column names are the field keys.
#[derive(Debug, Clone, Copy)]
pub struct FrameRecord<'a> {
    df: &'a DataFrame,
    n_row: usize,
}

impl<'a> FrameRecord<'a> {
    /// Row `n_row` of `df`.
    pub fn new(df: &'a DataFrame, n_row: usize) -> Self {
        Self { df, n_row }
    }

    /// Row index within the frame.
    pub fn row_index(&self) -> usize {
        self.n_row
    }
}

impl Record for FrameRecord<'_> {
    fn field(&self, key: &str) -> EnumFieldValue<'_> {
        let Ok(column) = self.df.column(key) else {
            return EnumFieldValue::Missing;
        };
        column
            .get(self.n_row)
            .map_or(EnumFieldValue::Missing, derive_field_value_from_any_value)
    }
}

fn derive_field_value_from_any_value(value: AnyValue<'_>) -> EnumFieldValue<'_> {
    match value {
        AnyValue::Null => EnumFieldValue::Missing,
        AnyValue::Boolean(val) => EnumFieldValue::Flag(val),
        AnyValue::String(val) => EnumFieldValue::Text(Cow::Borrowed(val)),
        AnyValue::StringOwned(val) => EnumFieldValue::Text(Cow::Owned(val.to_string())),
        AnyValue::UInt8(val) => EnumFieldValue::Integer(i64::from(val)),
        AnyValue::UInt16(val) => EnumFieldValue::Integer(i64::from(val)),
        AnyValue::UInt32(val) => EnumFieldValue::Integer(i64::from(val)),
        AnyValue::UInt64(val) => i64::try_from(val)
            .map_or(EnumFieldValue::Number(val as f64), EnumFieldValue::Integer),
        AnyValue::Int8(val) => EnumFieldValue::Integer(i64::from(val)),
        AnyValue::Int16(val) => EnumFieldValue::Integer(i64::from(val)),
        AnyValue::Int32(val) => EnumFieldValue::Integer(i64::from(val)),
        AnyValue::Int64(val) => EnumFieldValue::Integer(val),
        AnyValue::Float32(val) => EnumFieldValue::Number(f64::from(val)),
        AnyValue::Float64(val) => EnumFieldValue::Number(val),
        other => EnumFieldValue::Text(Cow::Owned(other.to_string())),
    }
}

/// Map every row of `df` onto `columns`.
pub fn map_dataframe(
    df: &DataFrame,
    columns: &[SpecExportColumn],
    context: &SpecMapContext,
) -> Result<Vec<SpecFormattedRow>> {
    let mut l_rows = Vec::with_capacity(df.height());
    for n_row in 0..df.height() {
        let record = FrameRecord::new(df, n_row);
        l_rows.push(map_record(&record, columns, context).map_err(|e| e.at_row(n_row))?);
    }
    tracing::debug!(rows = l_rows.len(), cols = columns.len(), "dataframe mapped");
    Ok(l_rows)
}

/// Decode an Arrow IPC payload.
pub fn read_dataframe_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<DataFrame> {
    Ok(IpcReader::new(Cursor::new(v_ipc_df)).finish()?)
}
