//! `runcfg` - loader and validator for training-run configuration
//!
//! Parses a YAML training-run document (model, data, criterion, optimizer
//! and an ordered list of stages with callbacks), validates it in a single
//! pass that collects every problem, and returns an immutable typed
//! [`RunConfig`](config::RunConfig).
//!
//! ```no_run
//! use runcfg::config::ConfigLoader;
//!
//! let text = std::fs::read_to_string("config.yml").unwrap();
//! match ConfigLoader::with_defaults().load(&text) {
//!     Ok(loaded) => println!("{} stage(s)", loaded.config.stages.stage_list.len()),
//!     Err(e) => {
//!         for issue in e.issues() {
//!             eprintln!("{issue}");
//!         }
//!     }
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
