//! Error types for the reconciliation engine
//!
//! Registration errors (`InvalidSchema`, `DuplicateType`) are fatal at
//! start-up. Everything else is scoped to a single reconciliation and is
//! turned into a [`Diagnostic`](crate::diagnostics::Diagnostic) at the
//! reconciliation boundary.

use crate::document::AttributePath;
use crate::lifecycle::LifecycleState;
use crate::value::ValueKind;
use std::fmt;
use thiserror::Error;

/// Remote operation that the lifecycle controller invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "Create",
            Self::Read => "Read",
            Self::Update => "Update",
            Self::Delete => "Delete",
        };
        f.write_str(name)
    }
}

/// Errors raised by the engine
#[derive(Debug, Error)]
pub enum Error {
    /// Schema rejected at registration time
    #[error("invalid schema for '{type_name}' at {path}: {reason}")]
    InvalidSchema {
        type_name: String,
        path: AttributePath,
        reason: String,
    },

    /// Type name was never registered
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// Type name registered twice
    #[error("type already registered: {0}")]
    DuplicateType(String),

    /// Target filter is neither `type` nor `type.name`
    #[error("invalid target '{0}', expected `type` or `type.name`")]
    InvalidTarget(String),

    /// Value is of a different kind than requested
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: AttributePath,
        expected: ValueKind,
        found: ValueKind,
    },

    /// Document does not conform to its schema
    #[error("schema violation at {path}: {reason}")]
    SchemaViolation { path: AttributePath, reason: String },

    /// Caller attempted to change an attribute that cannot change
    #[error("attribute {path} cannot be changed")]
    ImmutableAttribute { path: AttributePath },

    /// Remote API call failed; the instance did not advance
    #[error("{operation} failed{}: {cause:#}", id_suffix(.id))]
    RemoteOperation {
        operation: Operation,
        id: Option<String>,
        #[source]
        cause: anyhow::Error,
    },

    /// Operation not valid for the instance's current lifecycle state
    #[error("cannot {operation} a resource in state {state}")]
    InvalidTransition {
        state: LifecycleState,
        operation: &'static str,
    },
}

fn id_suffix(id: &Option<String>) -> String {
    id.as_ref()
        .map(|id| format!(" for id {id}"))
        .unwrap_or_default()
}

impl Error {
    /// Build a schema violation at `path`
    pub fn violation(path: &AttributePath, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// Build a remote operation failure
    pub fn remote(operation: Operation, id: Option<&str>, cause: anyhow::Error) -> Self {
        Self::RemoteOperation {
            operation,
            id: id.map(ToString::to_string),
            cause,
        }
    }

    /// Whether the error happened at registration (process start) time
    pub fn is_registration_error(&self) -> bool {
        matches!(self, Self::InvalidSchema { .. } | Self::DuplicateType(_))
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_operation_display() {
        let err = Error::remote(
            Operation::Delete,
            Some("7"),
            anyhow::anyhow!("connection reset"),
        );
        assert_eq!(err.to_string(), "Delete failed for id 7: connection reset");

        let err = Error::remote(Operation::Create, None, anyhow::anyhow!("timeout"));
        assert_eq!(err.to_string(), "Create failed: timeout");
    }

    #[test]
    fn test_remote_operation_keeps_source() {
        let err = Error::remote(Operation::Read, Some("1"), anyhow::anyhow!("boom"));
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("boom"));
    }

    #[test]
    fn test_registration_errors() {
        assert!(Error::DuplicateType("x".into()).is_registration_error());
        assert!(!Error::UnknownType("x".into()).is_registration_error());
    }
}
