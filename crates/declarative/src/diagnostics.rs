//! User-facing diagnostics
//!
//! Reconciliation never returns engine errors to the caller directly; they
//! are converted into (summary, detail) pairs here so drivers can print them
//! without matching on [`Error`].

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// A single user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    /// Attribute the message is about, e.g. `items[0].quantity`
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn at(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attribute) => write!(f, "{} ({}): {}", self.summary, attribute, self.detail),
            None => write!(f, "{}: {}", self.summary, self.detail),
        }
    }
}

impl From<&Error> for Diagnostic {
    fn from(err: &Error) -> Self {
        let summary = match err {
            Error::InvalidSchema { .. } => "Invalid schema",
            Error::UnknownType(_) => "Unknown resource type",
            Error::DuplicateType(_) => "Duplicate resource type",
            Error::InvalidTarget(_) => "Invalid target",
            Error::TypeMismatch { .. } => "Type mismatch",
            Error::SchemaViolation { .. } => "Schema violation",
            Error::ImmutableAttribute { .. } => "Immutable attribute",
            Error::RemoteOperation { .. } => "Remote operation failed",
            Error::InvalidTransition { .. } => "Invalid lifecycle transition",
        };
        let diagnostic = Self::error(summary, err.to_string());
        match err {
            Error::InvalidSchema { path, .. }
            | Error::TypeMismatch { path, .. }
            | Error::SchemaViolation { path, .. }
            | Error::ImmutableAttribute { path }
                if !path.is_root() =>
            {
                diagnostic.at(path.to_string())
            }
            _ => diagnostic,
        }
    }
}

impl From<Error> for Diagnostic {
    fn from(err: Error) -> Self {
        Self::from(&err)
    }
}

/// Ordered collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: impl Into<Diagnostic>) {
        self.0.push(diagnostic.into());
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Error> for Diagnostics {
    fn from(err: Error) -> Self {
        Self(vec![Diagnostic::from(&err)])
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::AttributePath;
    use crate::error::Operation;

    #[test]
    fn test_from_error_carries_path() {
        let err = Error::ImmutableAttribute {
            path: AttributePath::attribute("id"),
        };
        let diagnostic = Diagnostic::from(&err);
        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.summary, "Immutable attribute");
        assert_eq!(diagnostic.attribute.as_deref(), Some("id"));
        assert_eq!(diagnostic.detail, err.to_string());
    }

    #[test]
    fn test_remote_failure_summary() {
        let err = Error::remote(Operation::Delete, Some("7"), anyhow::anyhow!("timeout"));
        let diagnostic = Diagnostic::from(err);
        assert_eq!(diagnostic.summary, "Remote operation failed");
        assert!(diagnostic.detail.contains("Delete"));
        assert!(diagnostic.detail.contains('7'));
        assert!(diagnostic.attribute.is_none());
    }

    #[test]
    fn test_has_errors() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::warning("Drift", "quantity changed remotely"));
        assert!(!diagnostics.has_errors());
        diagnostics.push(Error::UnknownType("hashicups_tea".into()));
        assert!(diagnostics.has_errors());
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::error("Type mismatch", "expected int64").at("quantity");
        assert_eq!(diagnostic.to_string(), "Type mismatch (quantity): expected int64");
    }
}
