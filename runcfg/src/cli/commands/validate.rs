//! `validate` command
//!
//! Loads each file and reports every error found. Warnings are emitted by
//! the loader through `tracing`; with `--strict` they also fail the file.
//! A file that cannot be read is reported like any other failure and the
//! remaining files are still checked.

use std::path::Path;

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::cli::commands::build_loader;
use crate::config::ConfigLoader;
use crate::error::{ConfigError, RunCfgError, ValidationIssue};

/// Outcome for one file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    /// Path as given on the command line
    pub path: String,
    /// Whether the file passed
    pub valid: bool,
    /// Failure that stopped validation before schema checks ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal: Option<String>,
    /// Schema errors
    pub errors: Vec<ValidationIssue>,
    /// Warnings
    pub warnings: Vec<ValidationIssue>,
}

/// Totals across all files.
#[derive(Debug, Serialize)]
pub struct Summary {
    /// Number of files checked
    pub total: usize,
    /// Number of files that passed
    pub valid: usize,
    /// Number of files that failed
    pub invalid: usize,
}

/// Full `validate` report, as printed with `--format json`.
#[derive(Debug, Serialize)]
pub struct Report {
    /// Per-file outcomes in argument order
    pub files: Vec<FileReport>,
    /// Totals
    pub summary: Summary,
}

/// Validate configuration files.
///
/// # Errors
///
/// Returns an I/O error if any file could not be read, otherwise
/// [`RunCfgError::ValidationFailed`] if any file fails. Every file is
/// reported first.
pub fn run(args: &ValidateArgs, quiet: bool) -> Result<(), RunCfgError> {
    let loader = build_loader(&args.loader);

    let mut files = Vec::with_capacity(args.files.len());
    let mut unreadable = 0;
    for path in &args.files {
        tracing::info!(file = %path.display(), "validating configuration");
        match std::fs::read_to_string(path) {
            Ok(source) => files.push(check(&loader, path, &source, args.strict)),
            Err(e) => {
                unreadable += 1;
                files.push(unreadable_report(path, &e));
            }
        }
    }

    let invalid = files.iter().filter(|f| !f.valid).count();
    let report = Report {
        summary: Summary {
            total: files.len(),
            valid: files.len() - invalid,
            invalid,
        },
        files,
    };

    match args.format {
        OutputFormat::Human => print_human(&report, args.strict, quiet),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    if unreadable > 0 {
        return Err(RunCfgError::Io(std::io::Error::other(format!(
            "{unreadable} file(s) could not be read"
        ))));
    }
    if invalid > 0 {
        return Err(RunCfgError::ValidationFailed { count: invalid });
    }
    Ok(())
}

fn unreadable_report(path: &Path, error: &std::io::Error) -> FileReport {
    FileReport {
        path: path.display().to_string(),
        valid: false,
        fatal: Some(format!("I/O error: {error}")),
        errors: Vec::new(),
        warnings: Vec::new(),
    }
}

/// Loads one document and classifies the outcome.
#[must_use]
pub fn check(loader: &ConfigLoader, path: &Path, source: &str, strict: bool) -> FileReport {
    let path = path.display().to_string();
    match loader.load(source) {
        Ok(result) => FileReport {
            path,
            valid: !strict || result.warnings.is_empty(),
            fatal: None,
            errors: Vec::new(),
            warnings: result.warnings,
        },
        Err(ConfigError::Validation { errors }) => FileReport {
            path,
            valid: false,
            fatal: None,
            errors,
            warnings: Vec::new(),
        },
        Err(e) => FileReport {
            path,
            valid: false,
            fatal: Some(e.to_string()),
            errors: Vec::new(),
            warnings: Vec::new(),
        },
    }
}

fn print_human(report: &Report, strict: bool, quiet: bool) {
    for file in &report.files {
        if let Some(fatal) = &file.fatal {
            eprintln!("{}: {fatal}", file.path);
        }
        for issue in &file.errors {
            eprintln!("{}: {issue}", file.path);
        }
        if strict {
            for issue in &file.warnings {
                eprintln!("{}: {issue}", file.path);
            }
        }
        if file.valid && !quiet {
            match file.warnings.len() {
                0 => println!("{}: valid", file.path),
                n => println!("{}: valid ({n} warning(s))", file.path),
            }
        }
    }
}
