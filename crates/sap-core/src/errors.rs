//! Structured error types shared across SAP² crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine readable detail carried by every [`SapError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (method identifiers, paths, sizes, etc.).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Optional hint that may help the caller resolve the issue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload with a dotted `code` such as `sap_matrix.duplicate_method`.
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

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for the SAP² pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum SapError {
    /// Malformed matrix, duplicate method identifiers, invalid thresholds or run configuration.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Unreadable or malformed transcript input.
    #[error("transcript error: {0}")]
    Transcript(ErrorInfo),
    /// Fault reported by a decoder while processing a channel.
    #[error("decode error: {0}")]
    Decode(ErrorInfo),
    /// References to methods or channels that the run never declared.
    #[error("consistency error: {0}")]
    Consistency(ErrorInfo),
    /// Serialization, schema and filesystem errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        let context = self
            .context
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>();
        if !context.is_empty() {
            write!(f, " ({})", context.join(", "))?;
        }
        match &self.hint {
            Some(hint) => write!(f, "; hint: {hint}"),
            None => Ok(()),
        }
    }
}

impl SapError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            SapError::Config(info)
            | SapError::Transcript(info)
            | SapError::Decode(info)
            | SapError::Consistency(info)
            | SapError::Serde(info) => info,
        }
    }

    /// Wire name of the error family.
    pub fn family(&self) -> &'static str {
        match self {
            SapError::Config(_) => "config",
            SapError::Transcript(_) => "transcript",
            SapError::Decode(_) => "decode",
            SapError::Consistency(_) => "consistency",
            SapError::Serde(_) => "serde",
        }
    }

    /// True for errors raised before any evaluation starts.
    pub fn is_fatal_at_load(&self) -> bool {
        matches!(self, SapError::Config(_) | SapError::Transcript(_))
    }

    /// Shorthand for a decoder fault without additional context.
    pub fn decode(code: impl Into<String>, message: impl Into<String>) -> Self {
        SapError::Decode(ErrorInfo::new(code, message))
    }

    /// Wraps an I/O failure on `path` into a serde-family error.
    pub fn io(code: &str, path: &std::path::Path, err: impl ToString) -> Self {
        SapError::Serde(
            ErrorInfo::new(code, err.to_string()).with_context("path", path.display().to_string()),
        )
    }
}
