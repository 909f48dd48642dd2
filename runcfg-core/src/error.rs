//! Core error types for `runcfg`
//!
//! Syntax and validation error types shared across the workspace.

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
///
/// A load is all-or-nothing: any of these means no configuration was
/// produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The document is not well-formed YAML.
    #[error("syntax error{}: {message}", format_location(*line, *column))]
    Syntax {
        /// Line number where the error occurred (1-based, if available)
        line: Option<usize>,
        /// Column number where the error occurred (1-based, if available)
        column: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// The document parsed but violates the schema.
    #[error("validation failed with {} error(s)", errors.len())]
    Validation {
        /// Every violation found, in rule order
        errors: Vec<ValidationIssue>,
    },

    /// The document exceeds the configured size limit.
    #[error("document is {size} bytes, limit is {limit} bytes")]
    TooLarge {
        /// Document size in bytes
        size: usize,
        /// Maximum accepted size in bytes
        limit: usize,
    },
}

impl ConfigError {
    /// Returns the collected validation issues, or an empty slice for
    /// errors raised before validation ran.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Validation { errors } => errors,
            Self::Syntax { .. } | Self::TooLarge { .. } => &[],
        }
    }
}

fn format_location(line: Option<usize>, column: Option<usize>) -> String {
    match (line, column) {
        (Some(l), Some(c)) => format!(" at line {l}, column {c}"),
        (Some(l), None) => format!(" at line {l}"),
        _ => String::new(),
    }
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found while checking a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Dotted path to the problematic field (e.g. `stages.stage1.state_params.n_epochs`)
    pub path: String,
    /// The constraint that was violated
    pub message: String,
    /// The offending value, rendered as YAML, when one was present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Which rule produced the issue
    pub kind: IssueKind,
    /// Severity level of the issue
    pub severity: Severity,
}

impl ValidationIssue {
    /// Creates an error-level issue.
    pub fn error(kind: IssueKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            value: None,
            kind,
            severity: Severity::Error,
        }
    }

    /// Creates a warning-level issue.
    pub fn warning(kind: IssueKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(kind, path, message)
        }
    }

    /// Attaches the offending value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Returns `true` for error-level issues.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)?;
        if let Some(value) = &self.value {
            write!(f, " (got {value})")?;
        }
        Ok(())
    }
}

/// The rule that produced a [`ValidationIssue`].
///
/// Variants are declared in the order the rules are applied; errors are
/// reported sorted by this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A required key is absent
    MissingField,
    /// A value has the wrong YAML type
    TypeMismatch,
    /// A required string is empty
    EmptyValue,
    /// A number is outside its allowed range
    OutOfRange,
    /// No named stage is present under `stages`
    NoStages,
    /// A callback tag is not in the caller's allow-list
    UnknownCallback,
    /// A collection exceeds a configured size limit
    LimitExceeded,
    /// A section contains a key the schema does not know
    UnknownKey,
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Prevents the configuration from being produced
    Error,
    /// Reported, but does not block loading
    Warning,
}
