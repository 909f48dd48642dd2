//! Configuration schema for training-run documents.

pub mod schema;

pub use schema::*;
