//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod completions;
pub mod show;
pub mod validate;
pub mod version;

use std::path::Path;

use crate::cli::args::{Cli, Commands, LoaderArgs};
use crate::config::{ConfigLoader, LoaderOptions};
use crate::error::RunCfgError;

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub fn dispatch(cli: Cli) -> Result<(), RunCfgError> {
    match cli.command {
        Commands::Validate(args) => validate::run(&args, cli.quiet),
        Commands::Show(args) => show::run(&args),
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Builds a loader with the default allow-list extended by `--known-callback`.
fn build_loader(args: &LoaderArgs) -> ConfigLoader {
    let mut options = LoaderOptions::default();
    for name in &args.known_callbacks {
        if !options.known_callbacks.contains(name) {
            options.known_callbacks.push(name.clone());
        }
    }
    ConfigLoader::new(options)
}

/// Reads a configuration document from disk.
fn read_document(path: &Path) -> Result<String, RunCfgError> {
    std::fs::read_to_string(path).map_err(|e| {
        RunCfgError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {e}", path.display()),
        ))
    })
}
