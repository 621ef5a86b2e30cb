//! Structured error types shared across the search crates.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured payload attached to every [`SearchError`] variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine readable error code.
    pub code: String,
    /// Human readable diagnostic message.
    pub message: String,
    /// Contextual key value pairs (correlation ids, tags, sizes, etc.).
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
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    /// Sets a human readable hint for remediation.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Canonical error type for dispatch, enumeration and transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum SearchError {
    /// An envelope or snapshot could not be decoded.
    #[error("decode error: {0}")]
    Decode(ErrorInfo),
    /// A generator was asked for a combination after it ran out.
    #[error("exhausted: {0}")]
    Exhausted(ErrorInfo),
    /// The generator protocol was violated by its caller.
    #[error("contract violation: {0}")]
    Contract(ErrorInfo),
    /// Publishing or receiving failed at the bus boundary.
    #[error("transport error: {0}")]
    Transport(ErrorInfo),
    /// No matching result arrived before the deadline.
    #[error("timeout: {0}")]
    Timeout(ErrorInfo),
    /// Hypergraph structural errors.
    #[error("graph error: {0}")]
    Graph(ErrorInfo),
    /// Configuration and registration errors.
    #[error("config error: {0}")]
    Config(ErrorInfo),
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

impl SearchError {
    /// Returns a reference to the payload describing the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            SearchError::Decode(info)
            | SearchError::Exhausted(info)
            | SearchError::Contract(info)
            | SearchError::Transport(info)
            | SearchError::Timeout(info)
            | SearchError::Graph(info)
            | SearchError::Config(info) => info,
        }
    }

    /// Returns the stable machine readable code of the payload.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Whether a session may retry the failed step with fresh state.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SearchError::Decode(_) | SearchError::Transport(_) | SearchError::Timeout(_)
        )
    }

    /// Adds a context entry to the payload, whatever the family.
    pub fn with_context(self, key: impl Into<String>, value: impl ToString) -> Self {
        self.map_info(|info| info.with_context(key, value))
    }

    /// Sets the remediation hint, whatever the family.
    pub fn with_hint(self, hint: impl Into<String>) -> Self {
        self.map_info(|info| info.with_hint(hint))
    }

    fn map_info(self, f: impl FnOnce(ErrorInfo) -> ErrorInfo) -> Self {
        match self {
            SearchError::Decode(info) => SearchError::Decode(f(info)),
            SearchError::Exhausted(info) => SearchError::Exhausted(f(info)),
            SearchError::Contract(info) => SearchError::Contract(f(info)),
            SearchError::Transport(info) => SearchError::Transport(f(info)),
            SearchError::Timeout(info) => SearchError::Timeout(f(info)),
            SearchError::Graph(info) => SearchError::Graph(f(info)),
            SearchError::Config(info) => SearchError::Config(f(info)),
        }
    }
}
