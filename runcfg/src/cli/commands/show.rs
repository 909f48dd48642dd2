//! `show` command
//!
//! Prints a validated configuration in normalized form: top-level sections
//! and shared stage parameters in schema order, stages in execution order.

use crate::cli::args::{DocumentFormat, ShowArgs};
use crate::cli::commands::{build_loader, read_document};
use crate::config::RunConfig;
use crate::error::RunCfgError;

/// Print a normalized configuration.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, a config error if it
/// does not load, or a serialization error if rendering fails.
pub fn run(args: &ShowArgs) -> Result<(), RunCfgError> {
    let source = read_document(&args.file)?;
    let loaded = build_loader(&args.loader).load(&source)?;
    print!("{}", render(&loaded.config, args.format)?);
    Ok(())
}

/// Renders a configuration in the requested format.
///
/// # Errors
///
/// Returns an error if serialization fails, e.g. a forwarded parameter
/// uses a non-string key and JSON output was requested.
pub fn render(config: &RunConfig, format: DocumentFormat) -> Result<String, RunCfgError> {
    Ok(match format {
        DocumentFormat::Yaml => config.to_yaml()?,
        DocumentFormat::Json => {
            let mut json = serde_json::to_string_pretty(config)?;
            json.push('\n');
            json
        }
    })
}
