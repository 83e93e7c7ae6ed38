//! TOML export configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use kolkit_io_fs::{EnumSaveConflictStrategy, SpecSaveOptions};
use kolkit_io_xlsx::{C_EXT_XLSX, C_MIME_XLSX};
use serde::{Deserialize, Serialize};

use crate::delimited::{C_EXT_CSV, C_MIME_CSV, EnumCsvQuote, SpecCsvOptions};
use crate::error::{ExportError, Result};
use crate::fmt::{EnumLocale, SpecFormatContext};
use crate::kol::{
    C_SHEET_NAME_KOL, derive_kol_columns, derive_kol_filename_prefix, derive_kol_label_catalog,
};
use crate::mapper::{EnumColumnKind, SpecExportColumn, SpecLabelCatalog};

////////////////////////////////////////////////////////////////////////////////
// #region Enums

/// Output document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumExportKind {
    #[default]
    Xlsx,
    Csv,
}

impl EnumExportKind {
    /// File extension without dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => C_EXT_XLSX,
            Self::Csv => C_EXT_CSV,
        }
    }

    /// Content type handed to the save target.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Xlsx => C_MIME_XLSX,
            Self::Csv => C_MIME_CSV,
        }
    }
}

impl std::str::FromStr for EnumExportKind {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            _ => Err(ExportError::config(format!(
                "unsupported export kind {s:?}, expected xlsx or csv"
            ))),
        }
    }
}

/// `output.conflict` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnumConflictConfig {
    #[default]
    Overwrite,
    Skip,
    Error,
}

impl From<EnumConflictConfig> for EnumSaveConflictStrategy {
    fn from(value: EnumConflictConfig) -> Self {
        match value {
            EnumConflictConfig::Overwrite => Self::Overwrite,
            EnumConflictConfig::Skip => Self::Skip,
            EnumConflictConfig::Error => Self::Error,
        }
    }
}

/// `kind` values of a `[[columns]]` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumColumnKindConfig {
    Text,
    OptionalText,
    Count,
    Number,
    Flag,
    Label,
    Timestamp,
    OptionalTimestamp,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Sections

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecExportConfig {
    pub format: SpecFormatConfig,
    pub output: SpecOutputConfig,
    pub csv: SpecCsvConfig,
    /// Label overrides per table, merged over the locale preset.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, BTreeMap<String, String>>,
    /// Custom columns; empty means the KOL preset.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<SpecColumnConfig>,
}

/// `[format]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecFormatConfig {
    pub locale: EnumLocale,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utc_offset_minutes: Option<i32>,
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecOutputConfig {
    pub dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename_prefix: Option<String>,
    pub kind: EnumExportKind,
    pub sheet_name: String,
    pub conflict: EnumConflictConfig,
    pub create_dir: bool,
}

impl Default for SpecOutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("exports"),
            filename_prefix: None,
            kind: EnumExportKind::Xlsx,
            sheet_name: C_SHEET_NAME_KOL.to_string(),
            conflict: EnumConflictConfig::Overwrite,
            create_dir: true,
        }
    }
}

/// `[csv]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecCsvConfig {
    pub quote_all: bool,
    pub bom: bool,
}

impl Default for SpecCsvConfig {
    fn default() -> Self {
        Self {
            quote_all: true,
            bom: true,
        }
    }
}

fn default_column_width() -> u16 {
    12
}

/// One `[[columns]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecColumnConfig {
    pub label: String,
    #[serde(default = "default_column_width")]
    pub width: u16,
    pub key: String,
    pub kind: EnumColumnKindConfig,
    /// Label table name; required when `kind = "label"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

impl SpecColumnConfig {
    /// Resolve into a column; `label` kinds require `table`.
    pub fn to_column(&self) -> Result<SpecExportColumn> {
        let kind = match self.kind {
            EnumColumnKindConfig::Text => EnumColumnKind::Text,
            EnumColumnKindConfig::OptionalText => EnumColumnKind::OptionalText,
            EnumColumnKindConfig::Count => EnumColumnKind::Count,
            EnumColumnKindConfig::Number => EnumColumnKind::Number,
            EnumColumnKindConfig::Flag => EnumColumnKind::Flag,
            EnumColumnKindConfig::Timestamp => EnumColumnKind::Timestamp,
            EnumColumnKindConfig::OptionalTimestamp => EnumColumnKind::OptionalTimestamp,
            EnumColumnKindConfig::Label => {
                let table = self.table.clone().ok_or_else(|| {
                    ExportError::config(format!(
                        "column {:?} has kind \"label\" but no table",
                        self.label
                    ))
                })?;
                EnumColumnKind::Label { table }
            }
        };
        Ok(SpecExportColumn::new(
            self.label.clone(),
            self.width,
            self.key.clone(),
            kind,
        ))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Loading

impl SpecExportConfig {
    /// Parse TOML text; every section falls back to its defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ExportError::config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ExportError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), locale = %config.format.locale, "config loaded");
        Ok(config)
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ExportError::config(e.to_string()))
    }

    /// Whether `[[columns]]` replaces the KOL preset.
    pub fn has_custom_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Locale with the configured UTC offset, or the locale default.
    pub fn derive_format_context(&self) -> Result<SpecFormatContext> {
        let ctx = SpecFormatContext::new(self.format.locale);
        match self.format.utc_offset_minutes {
            Some(n_minutes) => ctx.with_utc_offset_minutes(n_minutes),
            None => Ok(ctx),
        }
    }

    /// Locale preset tables with `[labels.*]` overrides applied.
    pub fn derive_label_catalog(&self) -> SpecLabelCatalog {
        let mut catalog = derive_kol_label_catalog(self.format.locale);
        for (c_table, dict_overrides) in &self.labels {
            catalog.merge(c_table, dict_overrides);
        }
        catalog
    }

    /// Custom columns, or the KOL preset for the configured locale.
    pub fn derive_columns(&self) -> Result<Vec<SpecExportColumn>> {
        if self.columns.is_empty() {
            return Ok(derive_kol_columns(self.format.locale));
        }
        self.columns.iter().map(SpecColumnConfig::to_column).collect()
    }

    /// Configured prefix, or the KOL prefix for the locale.
    pub fn derive_filename_prefix(&self) -> String {
        self.output
            .filename_prefix
            .clone()
            .unwrap_or_else(|| derive_kol_filename_prefix(self.format.locale).to_string())
    }

    /// CSV writer options from `[csv]`.
    pub fn derive_csv_options(&self) -> SpecCsvOptions {
        SpecCsvOptions {
            rule_quote: if self.csv.quote_all {
                EnumCsvQuote::All
            } else {
                EnumCsvQuote::Necessary
            },
            if_bom: self.csv.bom,
            ..SpecCsvOptions::default()
        }
    }

    /// Save target options from `[output]`.
    pub fn derive_save_options(&self) -> SpecSaveOptions {
        SpecSaveOptions {
            rule_conflict: self.output.conflict.into(),
            if_create_dir: self.output.create_dir,
            ..SpecSaveOptions::default()
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SpecExportConfig::default();
        assert_eq!(config.format.locale, EnumLocale::EnUs);
        assert_eq!(config.output.kind, EnumExportKind::Xlsx);
        assert_eq!(config.output.dir, PathBuf::from("exports"));
        assert!(config.csv.quote_all);
        assert_eq!(config.derive_columns().unwrap().len(), 17);
        assert_eq!(config.derive_filename_prefix(), "kol_export");
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = SpecExportConfig::default();
        let c_toml = config.to_toml_string().unwrap();
        assert!(c_toml.contains("[format]"));
        assert!(c_toml.contains("[output]"));

        let config2 = SpecExportConfig::from_toml_str(&c_toml).unwrap();
        assert_eq!(config, config2);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = SpecExportConfig::from_toml_str(
            r#"
[format]
locale = "zh-CN"

[output]
kind = "csv"
conflict = "skip"

[labels.status]
new = "新"
"#,
        )
        .unwrap();

        assert_eq!(config.output.sheet_name, "KOL");
        assert_eq!(config.derive_filename_prefix(), "KOL导出");
        assert_eq!(
            config.derive_save_options().rule_conflict,
            EnumSaveConflictStrategy::Skip
        );

        let catalog = config.derive_label_catalog();
        assert_eq!(catalog.get("status").unwrap().labels["new"], "新");
        assert_eq!(catalog.get("status").unwrap().labels["contacted"], "已联系");

        let ctx = config.derive_format_context().unwrap();
        assert_eq!(ctx.utc_offset.local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn test_custom_columns() {
        let config = SpecExportConfig::from_toml_str(
            r#"
[[columns]]
label = "Username"
width = 20
key = "username"
kind = "text"

[[columns]]
label = "Status"
key = "status"
kind = "label"
table = "status"
"#,
        )
        .unwrap();

        assert!(config.has_custom_columns());
        let columns = config.derive_columns().unwrap();
        assert_eq!(columns[1].width, 12);
        assert_eq!(
            columns[1].kind,
            EnumColumnKind::Label {
                table: "status".to_string()
            }
        );
    }

    #[test]
    fn test_label_column_without_table_is_config_error() {
        let config = SpecExportConfig::from_toml_str(
            r#"
[[columns]]
label = "Status"
key = "status"
kind = "label"
"#,
        )
        .unwrap();
        assert!(matches!(config.derive_columns(), Err(ExportError::Config { .. })));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for c_toml in [
            "[format]\nlocale = \"fr-FR\"",
            "[output]\nkind = \"pdf\"",
            "[[columns]]\nlabel = \"A\"\nkey = \"a\"\nkind = \"money\"",
            "not toml at all [",
        ] {
            assert!(
                matches!(
                    SpecExportConfig::from_toml_str(c_toml),
                    Err(ExportError::Config { .. })
                ),
                "{c_toml:?}"
            );
        }
    }

    #[test]
    fn test_utc_offset_override() {
        let config =
            SpecExportConfig::from_toml_str("[format]\nlocale = \"zh-CN\"\nutc_offset_minutes = 0")
                .unwrap();
        assert_eq!(
            config.derive_format_context().unwrap().utc_offset.local_minus_utc(),
            0
        );
    }

    #[test]
    fn test_export_kind_parse() {
        assert_eq!("CSV".parse::<EnumExportKind>().unwrap(), EnumExportKind::Csv);
        assert_eq!(EnumExportKind::Xlsx.extension(), "xlsx");
        assert!("pdf".parse::<EnumExportKind>().is_err());
    }
}
