//! Error types for record export.

use thiserror::Error;

use kolkit_io_fs::SaveError;
use kolkit_io_xlsx::XlsxWriteError;

/// Errors raised while mapping, building or delivering an export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Enumerated value has no entry in its label table.
    #[error("{}no label for value {value:?} in table {table:?}", derive_location_prefix(.row, .key))]
    UnknownLabel {
        row: Option<usize>,
        key: Option<String>,
        table: String,
        value: String,
    },

    /// Column references a label table that was never configured.
    #[error("label table {table:?} is not configured")]
    MissingLabelTable { table: String },

    /// Required field is absent from a record.
    #[error("record {row} is missing required field {key:?}")]
    MissingField { row: usize, key: String },

    /// Field value has the wrong shape for its column.
    #[error("record {row} field {key:?}: expected {expected}, got {actual}")]
    FieldTypeMismatch {
        row: usize,
        key: String,
        expected: &'static str,
        actual: String,
    },

    /// Timestamp text could not be parsed.
    #[error("{}invalid timestamp: {value:?}", derive_location_prefix(.row, .key))]
    InvalidTimestamp {
        row: Option<usize>,
        key: Option<String>,
        value: String,
    },

    /// Column specification is unusable.
    #[error("invalid column specification: {message}")]
    InvalidColumnSpec { message: String },

    /// Configuration could not be read or interpreted.
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error(transparent)]
    Xlsx(#[from] XlsxWriteError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Create an UnknownLabel error.
    pub fn unknown_label(table: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnknownLabel {
            row: None,
            key: None,
            table: table.into(),
            value: value.into(),
        }
    }

    /// Create an InvalidTimestamp error.
    pub fn invalid_timestamp(value: impl Into<String>) -> Self {
        Self::InvalidTimestamp {
            row: None,
            key: None,
            value: value.into(),
        }
    }

    /// Create an InvalidColumnSpec error.
    pub fn invalid_column_spec(message: impl Into<String>) -> Self {
        Self::InvalidColumnSpec {
            message: message.into(),
        }
    }

    /// Create a Config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Attach a record index to a field-level error raised without one.
    pub(crate) fn at_row(self, n_row: usize) -> Self {
        match self {
            Self::MissingField { key, .. } => Self::MissingField { row: n_row, key },
            Self::FieldTypeMismatch {
                key,
                expected,
                actual,
                ..
            } => Self::FieldTypeMismatch {
                row: n_row,
                key,
                expected,
                actual,
            },
            Self::UnknownLabel {
                key, table, value, ..
            } => Self::UnknownLabel {
                row: Some(n_row),
                key,
                table,
                value,
            },
            Self::InvalidTimestamp { key, value, .. } => Self::InvalidTimestamp {
                row: Some(n_row),
                key,
                value,
            },
            other => other,
        }
    }

    /// Attach the field key to a value error raised by a standalone formatter.
    pub(crate) fn at_key(self, c_key: &str) -> Self {
        match self {
            Self::UnknownLabel {
                row,
                key: None,
                table,
                value,
            } => Self::UnknownLabel {
                row,
                key: Some(c_key.to_string()),
                table,
                value,
            },
            Self::InvalidTimestamp {
                row,
                key: None,
                value,
            } => Self::InvalidTimestamp {
                row,
                key: Some(c_key.to_string()),
                value,
            },
            other => other,
        }
    }
}

fn derive_location_prefix(row: &Option<usize>, key: &Option<String>) -> String {
    match (row, key) {
        (Some(n_row), Some(c_key)) => format!("record {n_row} field {c_key:?}: "),
        (Some(n_row), None) => format!("record {n_row}: "),
        (None, Some(c_key)) => format!("field {c_key:?}: "),
        (None, None) => String::new(),
    }
}

/// Result type for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExportError::unknown_label("status", "archived");
        assert_eq!(
            err.to_string(),
            "no label for value \"archived\" in table \"status\""
        );

        let err = ExportError::MissingField {
            row: 3,
            key: "username".to_string(),
        };
        assert_eq!(err.to_string(), "record 3 is missing required field \"username\"");
    }

    #[test]
    fn test_at_row_rewrites_field_errors_only() {
        let err = ExportError::MissingField {
            row: 0,
            key: "createdAt".to_string(),
        }
        .at_row(7);
        assert!(matches!(err, ExportError::MissingField { row: 7, .. }));

        let err = ExportError::config("bad").at_row(7);
        assert!(matches!(err, ExportError::Config { .. }));
    }

    #[test]
    fn test_value_errors_are_located() {
        let err = ExportError::invalid_timestamp("yesterday")
            .at_key("createdAt")
            .at_row(4);
        assert!(matches!(
            err,
            ExportError::InvalidTimestamp { row: Some(4), key: Some(ref k), .. } if k == "createdAt"
        ));
        assert_eq!(
            err.to_string(),
            "record 4 field \"createdAt\": invalid timestamp: \"yesterday\""
        );

        let err = ExportError::unknown_label("status", "archived")
            .at_key("status")
            .at_row(12);
        assert_eq!(
            err.to_string(),
            "record 12 field \"status\": no label for value \"archived\" in table \"status\""
        );
    }

    #[test]
    fn test_save_error_is_transparent() {
        let err: ExportError = SaveError::invalid_filename("a/b", "contains path separator").into();
        assert_eq!(
            err.to_string(),
            "invalid file name \"a/b\": contains path separator"
        );
    }
}
