//! Core shared types for agent-invocable tools.

#![warn(missing_docs, clippy::pedantic)]

mod descriptor;
mod error;
mod invocation;
mod manifest;

/// Tool descriptors, parameter schemas, and argument validation.
pub use descriptor::{OutputType, ParameterSpec, ParameterType, ToolDescriptor, ValidatedArguments};
/// Error types and result alias shared across the workspace.
pub use error::{Error, Result, SchemaError, SchemaIssue};
/// A single agent-issued tool call and its identifier.
pub use invocation::{Invocation, InvocationId};
/// Tool listing offered to the agent's planning step.
pub use manifest::ToolManifest;
