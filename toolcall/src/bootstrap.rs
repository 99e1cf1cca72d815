//! Startup wiring from configuration to a ready invoker.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use toolcall_config::ToolcallConfig;
use toolcall_exec::{CommandAdapter, ShellTool};
use toolcall_tools::{InvokerOptions, ToolInvoker, ToolRegistry};
use tracing::{debug, info};

/// Builds a registry containing the `shell` tool configured from `config`.
///
/// Callers may register further tools before sharing the registry.
///
/// # Errors
///
/// Returns an error if the command settings are invalid.
pub fn build_registry(config: &ToolcallConfig) -> anyhow::Result<ToolRegistry> {
    let adapter = CommandAdapter::new(config.command.clone())
        .context("failed to configure command adapter")?;
    let mut registry = ToolRegistry::new();
    ShellTool::new(adapter)
        .register(&mut registry)
        .context("failed to register shell tool")?;
    Ok(registry)
}

/// Builds an invoker over [`build_registry`] with verbose mode taken from
/// `config`.
///
/// # Errors
///
/// Returns an error if the command settings are invalid.
pub fn build_invoker(config: &ToolcallConfig) -> anyhow::Result<ToolInvoker> {
    let registry = Arc::new(build_registry(config)?);
    info!(tools = ?registry.names().collect::<Vec<_>>(), verbose = config.verbose, "tool invoker ready");
    Ok(ToolInvoker::with_options(
        registry,
        InvokerOptions::verbose(config.verbose),
    ))
}

/// Resolves configuration (optional file plus `TOOLCALL_*` overrides),
/// installs tracing, and builds the invoker.
///
/// An already-installed global subscriber is left in place.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or is invalid.
pub fn bootstrap(config_path: Option<&Path>) -> anyhow::Result<ToolInvoker> {
    let config = ToolcallConfig::resolve(config_path)?;
    if let Err(err) = toolcall_telemetry::init_tracing(config.verbose, &config.telemetry) {
        debug!(error = %err, "keeping existing tracing subscriber");
    }
    build_invoker(&config)
}
