//! Configuration loader
//!
//! This module implements the configuration loading pipeline:
//! 1. Size check and BOM stripping (on raw text)
//! 2. YAML parsing into a generic tree
//! 3. Validation, building the typed config in the same pass
//! 4. Freeze with `Arc`
//!
//! The loader performs no I/O. Callers read the document and pass its text.

use crate::config::schema::{LOSS_CALLBACK, LR_FINDER_CALLBACK, OPTIMIZER_CALLBACK, RunConfig};
use crate::config::validation::Validator;
use crate::error::{ConfigError, ValidationIssue};

use serde_yaml::Value;
use std::sync::Arc;

/// Callback tags accepted without a warning by default.
pub const DEFAULT_KNOWN_CALLBACKS: [&str; 10] = [
    LOSS_CALLBACK,
    OPTIMIZER_CALLBACK,
    LR_FINDER_CALLBACK,
    "SchedulerCallback",
    "CheckpointCallback",
    "EarlyStoppingCallback",
    "AccuracyCallback",
    "Logger",
    "TensorboardLogger",
    "InferCallback",
];

// ============================================================================
// Public API
// ============================================================================

/// Options for the configuration loader.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Callback tags the caller's framework knows about. Other tags load
    /// fine but produce an `UnknownCallback` warning.
    pub known_callbacks: Vec<String>,

    /// Limits for configuration size.
    pub limits: ConfigLimits,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            known_callbacks: DEFAULT_KNOWN_CALLBACKS
                .iter()
                .map(ToString::to_string)
                .collect(),
            limits: ConfigLimits::default(),
        }
    }
}

/// Limits for configuration size to prevent resource exhaustion.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum document size in bytes.
    pub max_config_size: usize,

    /// Maximum number of named stages.
    pub max_stages: usize,

    /// Maximum number of callbacks in a single stage.
    pub max_callbacks: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_config_size: env_or("RUNCFG_MAX_CONFIG_SIZE", 10 * 1024 * 1024),
            max_stages: env_or("RUNCFG_MAX_STAGES", 100),
            max_callbacks: env_or("RUNCFG_MAX_CALLBACKS", 100),
        }
    }
}

/// Result of loading a configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    /// The loaded and validated configuration.
    pub config: Arc<RunConfig>,

    /// Warnings encountered during loading.
    pub warnings: Vec<ValidationIssue>,
}

/// Configuration loader.
///
/// Stateless apart from its options, so a single loader can serve any
/// number of threads.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a new configuration loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a new configuration loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Returns the loader's options.
    #[must_use]
    pub const fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Parses and validates a document, returning the frozen configuration.
    ///
    /// Identical input always yields an identical result.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The document exceeds the size limit
    /// - YAML parsing fails, or the document is empty
    /// - Validation finds one or more errors (all of them are returned)
    pub fn load(&self, source: &str) -> Result<LoadResult, ConfigError> {
        let limit = self.options.limits.max_config_size;
        if source.len() > limit {
            return Err(ConfigError::TooLarge {
                size: source.len(),
                limit,
            });
        }

        // Handle UTF-8 BOM
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);

        tracing::debug!(bytes = source.len(), "parsing configuration");
        let root = parse(source)?;

        let mut validator = Validator::new(&self.options);
        let result = validator.validate(&root);

        let Some(config) = result.config else {
            tracing::debug!(errors = result.errors.len(), "configuration rejected");
            return Err(ConfigError::Validation {
                errors: result.errors,
            });
        };

        for warning in &result.warnings {
            tracing::warn!(path = %warning.path, "{}", warning.message);
        }
        tracing::debug!(
            stages = config.stages.stage_list.len(),
            warnings = result.warnings.len(),
            "configuration loaded"
        );

        Ok(LoadResult {
            config: Arc::new(config),
            warnings: result.warnings,
        })
    }
}

/// Structural parse. Fails on malformed or empty documents.
fn parse(source: &str) -> Result<Value, ConfigError> {
    let root: Value = serde_yaml::from_str(source).map_err(|e| {
        let location = e.location();
        ConfigError::Syntax {
            line: location.as_ref().map(|l| l.line()),
            column: location.as_ref().map(|l| l.column()),
            message: e.to_string(),
        }
    })?;

    if root.is_null() {
        return Err(ConfigError::Syntax {
            line: None,
            column: None,
            message: "document is empty".to_string(),
        });
    }

    Ok(root)
}

/// Reads an environment variable override, falling back to `default`.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Tests
// ============================================================================
