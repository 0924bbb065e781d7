//! Error types for `resourceful-rest-tools`.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// A single problem found while validating caller-supplied fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    /// A required field was absent (or explicitly `null`).
    Missing,
    /// A field was present but had the wrong JSON type.
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
}

/// Every validation problem for one payload, reported together.
///
/// Validation never fails on the first issue: callers get the complete list
/// of missing and mistyped fields in a single report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    issues: Vec<(String, FieldProblem)>,
}

impl ValidationReport {
    pub fn missing(&mut self, field: &str) {
        self.issues.push((field.to_string(), FieldProblem::Missing));
    }

    pub fn wrong_type(&mut self, field: &str, expected: &'static str, found: &'static str) {
        self.issues
            .push((field.to_string(), FieldProblem::WrongType { expected, found }));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn issues(&self) -> &[(String, FieldProblem)] {
        &self.issues
    }

    /// Convert the report into a `Result`: `Ok(())` when no issues were
    /// recorded, otherwise `Err(RestToolsError::Validation)`.
    ///
    /// # Errors
    ///
    /// Returns `RestToolsError::Validation` carrying `self` when the report
    /// is non-empty.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(RestToolsError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, problem)) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            match problem {
                FieldProblem::Missing => write!(f, "missing required field '{field}'")?,
                FieldProblem::WrongType { expected, found } => {
                    write!(f, "field '{field}' expects {expected}, got {found}")?;
                }
            }
        }
        Ok(())
    }
}

/// Main error type for the REST tool runtime.
///
/// Everything a dispatched operation can fail with is captured here; the
/// server boundary converts these into structured tool results rather than
/// letting them escape as protocol faults.
#[derive(Error, Debug)]
pub enum RestToolsError {
    /// Configuration errors (invalid base URL, duplicate names, bad schema).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or missing caller input; never reaches the network.
    #[error("Invalid input: {0}")]
    Validation(ValidationReport),

    /// Lookup miss in the profile registry.
    #[error("Unknown API profile: {0}")]
    UnknownProfile(String),

    /// Lookup miss in the tool catalog.
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    /// A path template placeholder could not be resolved.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// No HTTP response was obtained (connect failure, timeout, DNS).
    #[error("HTTP transport error: {0}")]
    Transport(String),

    /// A non-2xx response that is not a domain-legitimate outcome.
    #[error("HTTP error! status: {status}")]
    Http {
        status: u16,
        /// Best-effort parsed response body, kept for diagnosis.
        body: Option<Value>,
    },
}

/// Result type alias for REST tool operations.
pub type Result<T> = std::result::Result<T, RestToolsError>;
