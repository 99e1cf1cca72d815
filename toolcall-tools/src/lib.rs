//! Tool registration and invocation.
//!
//! [`registry`] holds the name-keyed table of descriptors and executors built
//! at startup; [`invoker`] validates agent arguments, dispatches to the
//! executor, and folds every outcome into text the agent can read.

#![warn(missing_docs, clippy::pedantic)]

pub mod invoker;
pub mod registry;

pub use invoker::{InvocationOutcome, InvocationState, InvokerOptions, ToolInvoker};
pub use registry::{Tool, ToolError, ToolHandle, ToolRegistry, ToolResult};
