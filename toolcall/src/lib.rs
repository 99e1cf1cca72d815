//! Schema-validated tool invocation for language-model agents.
//!
//! This facade bundles the workspace crates behind feature flags and offers a
//! one-call bootstrap that wires configuration, tracing, the registry, and the
//! `shell` tool into a ready [`ToolInvoker`].

#![warn(missing_docs, clippy::pedantic)]

/// Descriptors, invocations, manifests, and schema errors.
pub use toolcall_primitives as primitives;

/// Registry and invoker.
pub use toolcall_tools as tools;

/// Command adapter and `shell` tool (enabled by `exec` feature).
#[cfg(feature = "exec")]
pub use toolcall_exec as exec;

/// Configuration loading (enabled by `config` feature).
#[cfg(feature = "config")]
pub use toolcall_config as config;

/// Tracing setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use toolcall_telemetry as telemetry;

pub use toolcall_primitives::{Invocation, ToolDescriptor, ToolManifest};
pub use toolcall_tools::{InvokerOptions, Tool, ToolError, ToolInvoker, ToolRegistry};

#[cfg(feature = "config")]
mod bootstrap;

#[cfg(feature = "config")]
pub use bootstrap::{bootstrap, build_invoker, build_registry};
