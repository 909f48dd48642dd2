//! Configuration module
//!
//! Handles parsing and validation of training-run documents into the typed
//! schema from `runcfg-core`.

pub mod loader;
pub mod validation;

pub use loader::{ConfigLimits, ConfigLoader, DEFAULT_KNOWN_CALLBACKS, LoadResult, LoaderOptions};
pub use runcfg_core::config::schema;
pub use schema::*;
pub use validation::{ValidationResult, Validator, suggest};
