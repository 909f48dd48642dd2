//! Command-line interface for `runcfg`.

pub mod args;
pub mod commands;
