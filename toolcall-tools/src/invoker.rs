//! Invocation pipeline: lookup, validation, execution, and text normalization.
//!
//! [`ToolInvoker`] is the only surface the agent runtime talks to. Every call
//! resolves to a `String`; unknown tools, schema violations, command failures,
//! timeouts, and even executor panics come back as diagnostics rather than
//! errors, because the agent consumes tool responses as conversation context.

use std::any::Any;
use std::fmt::{self, Display, Formatter};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use serde_json::Value;
use toolcall_primitives::{Invocation, InvocationId};
use tracing::{Instrument, debug, info, info_span, trace, warn};

use crate::registry::{ToolError, ToolRegistry, ToolResult};

/// Construction-time switches for [`ToolInvoker`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InvokerOptions {
    /// Log arguments and results at `info` instead of `debug`.
    pub verbose: bool,
}

impl InvokerOptions {
    /// Returns options with verbose logging toggled.
    #[must_use]
    pub const fn verbose(verbose: bool) -> Self {
        Self { verbose }
    }
}

/// Stage an invocation is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvocationState {
    /// Nothing in flight.
    Idle,
    /// Resolving the tool and checking arguments.
    Validating,
    /// Executor running.
    Executing,
    /// Executor returned output.
    Succeeded,
    /// Lookup, validation, or execution failed.
    Failed,
}

/// Structured result of one dispatch, before it is flattened to text.
#[derive(Debug)]
pub enum InvocationOutcome {
    /// The tool produced output.
    Succeeded {
        /// Text returned by the tool.
        output: String,
    },
    /// Something went wrong at any stage.
    Failed {
        /// What went wrong.
        error: ToolError,
        /// Extra guidance appended to the diagnostic.
        hint: Option<String>,
    },
}

impl InvocationOutcome {
    /// Returns `true` for [`InvocationOutcome::Succeeded`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Terminal state reached by the invocation.
    #[must_use]
    pub const fn state(&self) -> InvocationState {
        match self {
            Self::Succeeded { .. } => InvocationState::Succeeded,
            Self::Failed { .. } => InvocationState::Failed,
        }
    }

    /// Returns the error for failed invocations.
    #[must_use]
    pub const fn error(&self) -> Option<&ToolError> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    /// Flattens the outcome into the text handed back to the agent.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Succeeded { output } => output,
            failed @ Self::Failed { .. } => failed.to_string(),
        }
    }
}

impl Display for InvocationOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded { output } => f.write_str(output),
            Self::Failed { error, hint: None } => write!(f, "{error}"),
            Self::Failed {
                error,
                hint: Some(hint),
            } => write!(f, "{error}. {hint}"),
        }
    }
}

/// Validates agent arguments, dispatches to executors, and normalizes
/// outcomes to text.
#[derive(Clone, Debug)]
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
    options: InvokerOptions,
}

impl ToolInvoker {
    /// Creates an invoker over a fully populated registry.
    #[must_use]
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self::with_options(registry, InvokerOptions::default())
    }

    /// Creates an invoker with explicit options.
    #[must_use]
    pub fn with_options(registry: Arc<ToolRegistry>, options: InvokerOptions) -> Self {
        Self { registry, options }
    }

    /// Returns the registry backing this invoker.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Returns the configured options.
    #[must_use]
    pub const fn options(&self) -> InvokerOptions {
        self.options
    }

    /// Invokes `name` with `arguments`, always returning text.
    pub async fn call(&self, name: &str, arguments: Value) -> String {
        self.dispatch(Invocation::new(name, arguments))
            .await
            .into_text()
    }

    /// Invokes `name` with the raw JSON argument string emitted by a model.
    pub async fn call_raw(&self, name: &str, raw_arguments: &str) -> String {
        match Invocation::from_raw(name, raw_arguments) {
            Ok(invocation) => self.dispatch(invocation).await.into_text(),
            Err(err) => {
                warn!(tool = %name, error = %err, "tool arguments are not valid JSON");
                format!("Invalid arguments for tool `{name}`: could not parse JSON arguments: {err}")
            }
        }
    }

    /// Runs [`ToolInvoker::call`] to completion on a private single-threaded
    /// runtime, blocking the current thread.
    ///
    /// Intended for synchronous hosts. Inside an async context use
    /// [`ToolInvoker::call`]; calling this from a runtime thread returns a
    /// diagnostic instead of blocking the executor.
    pub fn call_blocking(&self, name: &str, arguments: Value) -> String {
        if tokio::runtime::Handle::try_current().is_ok() {
            return format!(
                "Tool failed: `{name}` was invoked synchronously from inside an async runtime"
            );
        }

        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(self.call(name, arguments)),
            Err(err) => {
                warn!(tool = %name, error = %err, "failed to build blocking runtime");
                format!("Tool failed: could not start runtime for `{name}`: {err}")
            }
        }
    }

    /// Dispatches an invocation, returning its structured outcome.
    pub async fn dispatch(&self, invocation: Invocation) -> InvocationOutcome {
        let span = info_span!(
            "tool_invocation",
            invocation_id = %invocation.id(),
            tool = %invocation.tool_name(),
        );
        self.dispatch_inner(invocation).instrument(span).await
    }

    async fn dispatch_inner(&self, invocation: Invocation) -> InvocationOutcome {
        let started = Instant::now();
        if self.options.verbose {
            info!(arguments = %invocation.arguments(), "invoking tool");
        } else {
            debug!(arguments = %invocation.arguments(), "invoking tool");
        }

        let outcome = match self.execute(&invocation).await {
            Ok(output) => InvocationOutcome::Succeeded { output },
            Err(error) => {
                let hint = self.hint_for(&error);
                InvocationOutcome::Failed { error, hint }
            }
        };

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        transition(invocation.id(), outcome.state());
        match &outcome {
            InvocationOutcome::Succeeded { output } if self.options.verbose => {
                info!(elapsed_ms, output = %output, "tool succeeded");
            }
            InvocationOutcome::Succeeded { output } => {
                debug!(elapsed_ms, output_bytes = output.len(), "tool succeeded");
            }
            InvocationOutcome::Failed { error, .. } if is_operational(error) => {
                warn!(elapsed_ms, error = %error, "tool failed");
            }
            InvocationOutcome::Failed { error, .. } if self.options.verbose => {
                info!(elapsed_ms, error = %error, "tool failed");
            }
            InvocationOutcome::Failed { error, .. } => {
                debug!(elapsed_ms, error = %error, "tool failed");
            }
        }
        transition(invocation.id(), InvocationState::Idle);

        outcome
    }

    async fn execute(&self, invocation: &Invocation) -> ToolResult<String> {
        transition(invocation.id(), InvocationState::Validating);
        let handle = self.registry.lookup(invocation.tool_name())?;
        let arguments = handle.descriptor().validate(invocation.arguments())?;

        transition(invocation.id(), InvocationState::Executing);
        AssertUnwindSafe(handle.invoke(arguments))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(ToolError::failed(format!(
                    "tool panicked: {}",
                    panic_message(panic.as_ref())
                )))
            })
    }

    fn hint_for(&self, error: &ToolError) -> Option<String> {
        match error {
            ToolError::UnknownTool { .. } if self.registry.is_empty() => {
                Some("No tools are registered".to_owned())
            }
            ToolError::UnknownTool { .. } => Some(format!(
                "Available tools: {}",
                self.registry.names().collect::<Vec<_>>().join(", ")
            )),
            _ => None,
        }
    }
}

fn transition(id: InvocationId, state: InvocationState) {
    trace!(invocation_id = %id, state = ?state, "invocation state");
}

const fn is_operational(error: &ToolError) -> bool {
    matches!(
        error,
        ToolError::Environment { .. } | ToolError::Timeout { .. } | ToolError::Failed { .. }
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}
