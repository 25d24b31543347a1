//! Implementation of the `luma check` command.

use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use clap::Args;
use luma::{Dialect, Engine, Syntax};
use miette::{Report, Result};
use owo_colors::{OwoColorize, Stream};
use serde::Serialize;
use tracing::debug;

use crate::output::table::{format_check_table, CheckRow};
use crate::output::{LumaDiagnostic, UnknownFilterWarning};

/// Arguments for the check command.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Template files to check.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Template dialect: auto, native or jinja.
    #[arg(long, default_value = "auto")]
    pub syntax: Syntax,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// JSON report for one file.
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    dialect: Option<String>,
    error: Option<Problem>,
    warnings: Vec<Problem>,
}

#[derive(Debug, Serialize)]
struct Problem {
    message: String,
    line: Option<usize>,
    column: Option<usize>,
}

/// What checking one file found.
enum Outcome {
    Unreadable(String),
    Invalid {
        source: String,
        dialect: Dialect,
        error: luma::Error,
    },
    Valid {
        source: String,
        template: luma::CompiledTemplate,
    },
}

fn check_file(engine: &Engine, path: &Path) -> Outcome {
    let source = match read_to_string(path) {
        Ok(source) => source,
        Err(e) => return Outcome::Unreadable(e.to_string()),
    };
    debug!(file = %path.display(), "checking template");
    match engine.compile(&source) {
        Ok(template) => Outcome::Valid { source, template },
        Err(error) => {
            let dialect = engine.syntax().resolve(&source);
            Outcome::Invalid {
                source,
                dialect,
                error,
            }
        }
    }
}

/// Run the check command.
pub fn run_check(args: CheckArgs) -> Result<i32> {
    let engine = Engine::builder().syntax(args.syntax).build();
    let mut exit_code = exitcode::OK;
    let mut reports = Vec::new();
    let mut rows = Vec::new();

    for path in &args.files {
        let file = path.display().to_string();
        let outcome = check_file(&engine, path);
        let code = match &outcome {
            Outcome::Unreadable(_) => exitcode::NOINPUT,
            Outcome::Invalid { .. } => exitcode::DATAERR,
            Outcome::Valid { .. } => exitcode::OK,
        };
        if exit_code == exitcode::OK {
            exit_code = code;
        }

        if args.json {
            reports.push(file_report(file, &outcome));
        } else {
            rows.push(print_outcome(path, file, &outcome));
        }
    }

    if args.json {
        let text = serde_json::to_string_pretty(&reports)
            .map_err(|e| miette::miette!("cannot serialize report: {e}"))?;
        println!("{text}");
    } else {
        println!("{}", format_check_table(&rows));
    }
    Ok(exit_code)
}

/// Print diagnostics for one file and return its summary row.
fn print_outcome(path: &Path, file: String, outcome: &Outcome) -> CheckRow {
    match outcome {
        Outcome::Unreadable(message) => {
            eprintln!("Cannot read {file}: {message}");
            CheckRow {
                file,
                dialect: "-".to_string(),
                status: "unreadable"
                    .if_supports_color(Stream::Stdout, |s| s.red())
                    .to_string(),
            }
        }
        Outcome::Invalid {
            source,
            dialect,
            error,
        } => {
            let diagnostic = LumaDiagnostic::from_error(path, source, error);
            eprintln!("{:?}", Report::new(diagnostic));
            CheckRow {
                file,
                dialect: dialect.to_string(),
                status: "error"
                    .if_supports_color(Stream::Stdout, |s| s.red())
                    .to_string(),
            }
        }
        Outcome::Valid { source, template } => {
            for unknown in template.unknown_filters() {
                let warning = UnknownFilterWarning::new(path, source, unknown);
                eprintln!("{:?}", Report::new(warning));
            }
            let status = match template.unknown_filters().len() {
                0 => "ok".if_supports_color(Stream::Stdout, |s| s.green()).to_string(),
                n => format!("{n} warning(s)")
                    .if_supports_color(Stream::Stdout, |s| s.yellow())
                    .to_string(),
            };
            CheckRow {
                file,
                dialect: template.dialect().to_string(),
                status,
            }
        }
    }
}

fn file_report(file: String, outcome: &Outcome) -> FileReport {
    match outcome {
        Outcome::Unreadable(message) => FileReport {
            file,
            dialect: None,
            error: Some(Problem {
                message: message.clone(),
                line: None,
                column: None,
            }),
            warnings: Vec::new(),
        },
        Outcome::Invalid { dialect, error, .. } => {
            let position = error.position();
            FileReport {
                file,
                dialect: Some(dialect.to_string()),
                error: Some(Problem {
                    message: error.message(),
                    line: position.map(|p| p.line),
                    column: position.map(|p| p.column),
                }),
                warnings: Vec::new(),
            }
        }
        Outcome::Valid { template, .. } => FileReport {
            file,
            dialect: Some(template.dialect().to_string()),
            error: None,
            warnings: template
                .unknown_filters()
                .iter()
                .map(|unknown| Problem {
                    message: format!("unknown filter '{}'", unknown.name),
                    line: Some(unknown.position.line),
                    column: Some(unknown.position.column),
                })
                .collect(),
        },
    }
}
