//! Name-keyed table of tool descriptors and executors.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use toolcall_primitives::{SchemaError, ToolDescriptor, ToolManifest, ValidatedArguments};

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Trait implemented by tool executors.
///
/// Executors receive arguments that already passed the tool's descriptor and
/// return the text handed back to the agent.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Runs the tool's side effect.
    async fn invoke(&self, arguments: ValidatedArguments) -> ToolResult<String>;
}

#[async_trait]
impl<F, Fut> Tool for F
where
    F: Send + Sync + Fn(ValidatedArguments) -> Fut,
    Fut: Future<Output = ToolResult<String>> + Send,
{
    async fn invoke(&self, arguments: ValidatedArguments) -> ToolResult<String> {
        (self)(arguments).await
    }
}

/// Registered descriptor paired with its executor.
#[derive(Clone)]
pub struct ToolHandle {
    descriptor: ToolDescriptor,
    executor: Arc<dyn Tool>,
}

impl ToolHandle {
    /// Returns the tool's descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    /// Returns the tool's executor.
    #[must_use]
    pub fn executor(&self) -> &Arc<dyn Tool> {
        &self.executor
    }

    /// Executes the underlying tool implementation with validated arguments.
    ///
    /// # Errors
    ///
    /// Propagates whatever [`ToolError`] the executor returns.
    pub async fn invoke(&self, arguments: ValidatedArguments) -> ToolResult<String> {
        self.executor.invoke(arguments).await
    }
}

impl std::fmt::Debug for ToolHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolHandle")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Registry that stores tool implementations keyed by name.
///
/// Populate it at startup through `&mut self`, then share it behind an
/// [`Arc`]; lookups after that point are plain reads and need no locking.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<ToolHandle>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("registered", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool implementation under its descriptor's name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateTool`] if the name is already present.
    pub fn register<T>(&mut self, descriptor: ToolDescriptor, tool: T) -> ToolResult<()>
    where
        T: Tool + 'static,
    {
        self.register_shared(descriptor, Arc::new(tool))
    }

    /// Registers an executor that is already shared elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateTool`] if the name is already present.
    pub fn register_shared(
        &mut self,
        descriptor: ToolDescriptor,
        executor: Arc<dyn Tool>,
    ) -> ToolResult<()> {
        let name = descriptor.name().to_owned();
        if self.index.contains_key(&name) {
            return Err(ToolError::DuplicateTool { name });
        }

        tracing::debug!(tool = %name, "registered tool");
        self.index.insert(name, self.tools.len());
        self.tools.push(ToolHandle {
            descriptor,
            executor,
        });
        Ok(())
    }

    /// Returns the handle registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] when no tool has that name.
    pub fn lookup(&self, name: &str) -> ToolResult<&ToolHandle> {
        self.get(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_owned(),
        })
    }

    /// Returns the handle registered under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolHandle> {
        self.index.get(name).map(|&slot| &self.tools[slot])
    }

    /// Returns registered tool names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|handle| handle.descriptor.name())
    }

    /// Returns the descriptors offered to the agent, in registration order.
    #[must_use]
    pub fn manifest(&self) -> ToolManifest {
        ToolManifest::new(
            self.tools
                .iter()
                .map(|handle| handle.descriptor.clone())
                .collect(),
        )
    }

    /// Returns the number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Errors produced by tool registration and invocation.
///
/// The `Display` form of each variant is the diagnostic the agent reads.
#[derive(Debug, Error)]
pub enum ToolError {
    /// A tool descriptor could not be built.
    #[error(transparent)]
    Descriptor(#[from] toolcall_primitives::Error),

    /// Tool name collided with an existing registration.
    #[error("tool `{name}` is already registered")]
    DuplicateTool {
        /// Name of the offending tool.
        name: String,
    },

    /// Requested tool does not exist.
    #[error("Unknown tool: `{name}`")]
    UnknownTool {
        /// Name of the missing tool.
        name: String,
    },

    /// Arguments did not satisfy the tool's declared inputs.
    #[error(transparent)]
    InvalidArguments(#[from] SchemaError),

    /// The command ran but exited with a nonzero status.
    #[error("Command failed: {}", failure_detail(.exit_code, .stderr))]
    Execution {
        /// Process exit status, `-1` when terminated by a signal.
        exit_code: i32,
        /// Trimmed standard error.
        stderr: String,
    },

    /// The command could not be started.
    #[error("Command could not be started: {reason}")]
    Environment {
        /// Human-readable cause (not found, permission denied, ...).
        reason: String,
    },

    /// The command exceeded its deadline and was killed.
    #[error("Command timed out after {}s", .timeout.as_secs_f64())]
    Timeout {
        /// Deadline that was exceeded.
        timeout: Duration,
    },

    /// A non-command tool reported a failure.
    #[error("Tool failed: {reason}")]
    Failed {
        /// Human-readable error returned by the tool implementation.
        reason: String,
    },
}

impl ToolError {
    /// Creates a generic failure from the supplied reason.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Creates an environment error from the supplied reason.
    #[must_use]
    pub fn environment(reason: impl Into<String>) -> Self {
        Self::Environment {
            reason: reason.into(),
        }
    }
}

fn failure_detail(exit_code: &i32, stderr: &str) -> String {
    if stderr.is_empty() {
        format!("exited with status {exit_code}")
    } else {
        stderr.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use toolcall_primitives::{ParameterSpec, ParameterType};

    fn descriptor(name: &str) -> ToolDescriptor {
        ToolDescriptor::new(name, "Echo incoming message")
            .and_then(|d| {
                d.with_input(
                    "message",
                    ParameterSpec::required(ParameterType::String, "Text to echo"),
                )
            })
            .unwrap()
    }

    async fn echo(arguments: ValidatedArguments) -> ToolResult<String> {
        Ok(arguments.str("message").unwrap_or_default().to_owned())
    }

    #[tokio::test]
    async fn register_and_lookup_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(descriptor("echo"), echo).unwrap();

        let handle = registry.lookup("echo").unwrap();
        assert_eq!(handle.descriptor().name(), "echo");

        let arguments = handle
            .descriptor()
            .validate(&json!({ "message": "hello" }))
            .unwrap();
        assert_eq!(handle.invoke(arguments).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn closures_are_tools() {
        let mut registry = ToolRegistry::new();
        registry
            .register(descriptor("shout"), |arguments: ValidatedArguments| async move {
                Ok::<_, ToolError>(arguments.str("message").unwrap_or_default().to_uppercase())
            })
            .unwrap();

        let handle = registry.lookup("shout").unwrap();
        let arguments = handle
            .descriptor()
            .validate(&json!({ "message": "hi" }))
            .unwrap();
        assert_eq!(handle.invoke(arguments).await.unwrap(), "HI");
    }

    #[test]
    fn duplicate_registration_errors() {
        let mut registry = ToolRegistry::new();
        registry.register(descriptor("echo"), echo).unwrap();

        let err = registry
            .register(descriptor("echo"), echo)
            .expect_err("duplicate registration should fail");

        assert!(matches!(err, ToolError::DuplicateTool { name } if name == "echo"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unknown_tool_errors() {
        let registry = ToolRegistry::new();
        let err = registry
            .lookup("missing")
            .expect_err("unknown tool should error");

        assert!(matches!(err, ToolError::UnknownTool { name } if name == "missing"));
    }

    #[test]
    fn manifest_keeps_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(descriptor("zeta"), echo).unwrap();
        registry.register(descriptor("alpha"), echo).unwrap();
        registry.register(descriptor("mid"), echo).unwrap();

        let manifest = registry.manifest();
        assert_eq!(manifest.names().collect::<Vec<_>>(), ["zeta", "alpha", "mid"]);
        assert_eq!(format!("{registry:?}"), r#"ToolRegistry { registered: ["zeta", "alpha", "mid"] }"#);
    }

    #[test]
    fn diagnostics_read_as_text() {
        let err = ToolError::Execution {
            exit_code: 2,
            stderr: "ls: cannot access 'nope'".into(),
        };
        assert_eq!(err.to_string(), "Command failed: ls: cannot access 'nope'");

        let err = ToolError::Execution {
            exit_code: 1,
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "Command failed: exited with status 1");

        let err = ToolError::Timeout {
            timeout: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "Command timed out after 5s");

        let err = ToolError::environment("sh: not found");
        assert_eq!(err.to_string(), "Command could not be started: sh: not found");
    }
}
