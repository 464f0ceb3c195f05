//! Structured error types shared across HMEX crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`HmexError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (paths, parameter values, column names).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates a new error payload with the provided code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry to the payload.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Adds the offending path as context.
    pub fn with_path(self, path: &Path) -> Self {
        self.with_context("path", path.display().to_string())
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the HMEX pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum HmexError {
    /// Invalid or unrecognised configuration values.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// An upstream artefact expected on disk is absent.
    #[error("missing input: {0}")]
    MissingInput(ErrorInfo),
    /// A simulation log disagrees with the configured observable set.
    #[error("inconsistent observables: {0}")]
    InconsistentObservables(ErrorInfo),
    /// The external simulation runner failed, timed out or was cancelled.
    #[error("runner error: {0}")]
    Runner(ErrorInfo),
    /// Least-squares fitting failures.
    #[error("fit error: {0}")]
    Fit(ErrorInfo),
    /// Numerically invalid inputs or outputs.
    #[error("numeric error: {0}")]
    Numeric(ErrorInfo),
    /// Table shape and fixed-width format errors.
    #[error("table error: {0}")]
    Table(ErrorInfo),
    /// Filesystem errors.
    #[error("io error: {0}")]
    Io(ErrorInfo),
    /// Serialization and schema errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            write!(f, " | context: [")?;
            for (idx, (key, value)) in self.context.iter().enumerate() {
                if idx > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " | hint: {hint}")?;
        }
        Ok(())
    }
}

impl HmexError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            HmexError::Config(info)
            | HmexError::MissingInput(info)
            | HmexError::InconsistentObservables(info)
            | HmexError::Runner(info)
            | HmexError::Fit(info)
            | HmexError::Numeric(info)
            | HmexError::Table(info)
            | HmexError::Io(info)
            | HmexError::Serde(info) => info,
        }
    }

    /// Builds a filesystem error tagged with the offending path.
    pub fn io(code: &str, path: &Path, err: impl ToString) -> Self {
        HmexError::Io(ErrorInfo::new(code, err.to_string()).with_path(path))
    }

    /// Builds a missing-input error naming the expected path.
    pub fn missing(code: &str, path: &Path) -> Self {
        HmexError::MissingInput(
            ErrorInfo::new(code, format!("file not found: {}", path.display())).with_path(path),
        )
    }

    /// Builds a configuration error.
    pub fn config(code: &str, message: impl Into<String>) -> Self {
        HmexError::Config(ErrorInfo::new(code, message))
    }
}
