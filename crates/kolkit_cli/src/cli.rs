//! Command-line argument definitions for `kolkit`.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use kolkit_export::{EnumExportKind, EnumLocale};

use kolkit_cli::logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "kolkit",
    version,
    about = "Export KOL outreach records as spreadsheets or CSV"
)]
/// Top-level `kolkit` arguments.
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,
}

/// `kolkit` subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Export a JSON array of records to a file.
    Export(ExportArgs),

    /// Print the active column specification.
    Columns(ColumnsArgs),

    /// Print each value through the CSV field escaper.
    Escape {
        #[arg(value_name = "VALUE", required = true)]
        values: Vec<String>,
    },
}

/// Arguments of `kolkit export`.
#[derive(Parser)]
pub struct ExportArgs {
    /// JSON file holding an array of records.
    #[arg(long = "input", short = 'i', value_name = "FILE")]
    pub input: PathBuf,

    /// TOML export configuration.
    #[arg(long = "config", short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Destination directory (overrides `output.dir`).
    #[arg(long = "output-dir", short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    #[arg(long = "kind", value_enum)]
    pub kind: Option<KindArg>,

    /// Exact file name instead of `<prefix>_<timestamp>.<ext>`.
    #[arg(long = "filename", value_name = "NAME")]
    pub filename: Option<String>,

    #[arg(long = "locale", value_enum)]
    pub locale: Option<LocaleArg>,
}

/// Arguments of `kolkit columns`.
#[derive(Parser)]
pub struct ColumnsArgs {
    #[arg(long = "config", short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long = "locale", value_enum)]
    pub locale: Option<LocaleArg>,
}

/// Output document type.
#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Xlsx,
    Csv,
}

impl From<KindArg> for EnumExportKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Xlsx => Self::Xlsx,
            KindArg::Csv => Self::Csv,
        }
    }
}

/// Display locale; BCP-47 tags with short aliases.
#[derive(Clone, Copy, ValueEnum)]
pub enum LocaleArg {
    #[value(name = "en-US", alias = "en")]
    EnUs,
    #[value(name = "zh-CN", alias = "zh")]
    ZhCn,
    #[value(name = "de-DE", alias = "de")]
    DeDe,
}

impl From<LocaleArg> for EnumLocale {
    fn from(value: LocaleArg) -> Self {
        match value {
            LocaleArg::EnUs => Self::EnUs,
            LocaleArg::ZhCn => Self::ZhCn,
            LocaleArg::DeDe => Self::DeDe,
        }
    }
}

/// Log output format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
}
