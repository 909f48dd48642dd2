//! `runcfg` core: schema and error types
//!
//! This crate provides the typed training-run configuration and the error
//! types shared between the loader and anything consuming its output.

pub mod config;
pub mod error;
