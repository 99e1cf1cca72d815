//! Command execution for agent tool calls.
//!
//! [`command`] runs a command line through the host interpreter with a
//! deadline and bounded output capture; [`shell`] exposes it to agents as the
//! `shell` tool.

#![warn(missing_docs, clippy::pedantic)]

pub mod command;
pub mod shell;

mod output;

pub use command::{CommandAdapter, CommandConfig, CommandError, CommandResult, ExecutionResult, RunOptions};
pub use output::normalize;
pub use shell::ShellTool;
