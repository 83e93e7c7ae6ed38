//! `kolkit` command-line host.

use std::io::{self, IsTerminal};

use chrono::Utc;
use clap::Parser;
use kolkit_cli::commands::{SpecExportRequest, run_columns, run_escape, run_export};
use kolkit_cli::logging::{LogConfig, init_logging};

mod cli;

use crate::cli::{Cli, Command};

fn main() {
    let cli = Cli::parse();
    let log_config = LogConfig::from_verbosity(cli.verbose)
        .with_format(cli.log_format.into())
        .with_ansi(io::stderr().is_terminal());
    init_logging(&log_config);

    let exit_code = match cli.command {
        Command::Export(args) => {
            let request = SpecExportRequest {
                path_input: args.input,
                path_config: args.config,
                path_output_dir: args.output_dir,
                kind: args.kind.map(Into::into),
                filename: args.filename,
                locale: args.locale.map(Into::into),
            };
            match run_export(&request, &Utc::now()) {
                Ok(outcome) => {
                    println!("{}", outcome.path_dir.join(&outcome.filename).display());
                    eprintln!("{}", outcome.report);
                    for err in &outcome.report.errors {
                        eprintln!("error: {}: {}", err.path.display(), err.exception);
                    }
                    if outcome.has_errors() { 1 } else { 0 }
                }
                Err(error) => {
                    eprintln!("error: {error:#}");
                    1
                }
            }
        }
        Command::Columns(args) => {
            match run_columns(args.config.as_deref(), args.locale.map(Into::into)) {
                Ok(l_lines) => {
                    for c_line in l_lines {
                        println!("{c_line}");
                    }
                    0
                }
                Err(error) => {
                    eprintln!("error: {error:#}");
                    1
                }
            }
        }
        Command::Escape { values } => {
            for c_value in run_escape(&values) {
                println!("{c_value}");
            }
            0
        }
    };
    std::process::exit(exit_code);
}
