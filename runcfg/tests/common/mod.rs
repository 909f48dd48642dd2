//! Shared integration-test helpers for running the `runcfg` binary and
//! locating fixture documents.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

/// Absolute path to a file under `tests/fixtures/`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Reads a fixture document into a string.
#[allow(clippy::missing_panics_doc)]
pub fn fixture(name: &str) -> String {
    let path = fixture_path(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
}

/// Runs the `runcfg` binary with `args` and waits for it to exit.
///
/// Color is disabled so stderr assertions are stable.
#[allow(clippy::missing_panics_doc)]
pub fn run_command(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_runcfg"))
        .args(args)
        .env_remove("RUNCFG_LOG_LEVEL")
        .env("RUNCFG_COLOR", "never")
        .output()
        .expect("failed to spawn runcfg")
}

/// Stdout of a finished command as UTF-8 text.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Stderr of a finished command as UTF-8 text.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
