//! Shared error definitions for tool primitives.

use std::fmt::{self, Display, Formatter};

use thiserror::Error;

use crate::ParameterType;

/// Result alias used throughout the toolcall crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// Tool descriptor failed validation.
    #[error("invalid tool descriptor: {reason}")]
    InvalidDescriptor {
        /// Human-readable reason for rejection.
        reason: String,
    },
}

/// Arguments supplied for a tool did not satisfy its declared inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid arguments for tool `{tool}`: {}", join_issues(.issues))]
pub struct SchemaError {
    tool: String,
    issues: Vec<SchemaIssue>,
}

impl SchemaError {
    /// Creates a schema error for the given tool.
    #[must_use]
    pub fn new(tool: impl Into<String>, issues: Vec<SchemaIssue>) -> Self {
        Self {
            tool: tool.into(),
            issues,
        }
    }

    /// Name of the tool whose schema rejected the arguments.
    #[must_use]
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Individual problems found, in parameter order.
    #[must_use]
    pub fn issues(&self) -> &[SchemaIssue] {
        &self.issues
    }

    /// Names of the fields that were missing or invalid.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.issues.iter().filter_map(SchemaIssue::field)
    }
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaIssue {
    /// The argument payload was not a JSON object.
    NotAnObject {
        /// JSON kind that was supplied instead.
        found: &'static str,
    },
    /// A required parameter was absent or `null`.
    Missing {
        /// Parameter name.
        name: String,
    },
    /// A parameter was supplied with a value of the wrong type.
    WrongType {
        /// Parameter name.
        name: String,
        /// Declared parameter type.
        expected: ParameterType,
        /// JSON kind that was supplied.
        found: &'static str,
    },
}

impl SchemaIssue {
    /// Parameter the issue refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::NotAnObject { .. } => None,
            Self::Missing { name } | Self::WrongType { name, .. } => Some(name),
        }
    }
}

impl Display for SchemaIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject { found } => {
                write!(f, "arguments must be a JSON object, got {found}")
            }
            Self::Missing { name } => write!(f, "missing required parameter `{name}`"),
            Self::WrongType {
                name,
                expected,
                found,
            } => write!(f, "parameter `{name}` must be {expected}, got {found}"),
        }
    }
}

fn join_issues(issues: &[SchemaIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
