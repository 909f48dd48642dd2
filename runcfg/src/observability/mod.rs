//! Observability module
//!
//! Logging setup for the `runcfg` binary. The library itself only emits
//! `tracing` events.

pub mod logging;

pub use crate::cli::args::LogFormat;
pub use logging::init_logging;
