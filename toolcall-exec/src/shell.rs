//! The `shell` tool: agent-facing wrapper around [`CommandAdapter`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use toolcall_primitives::{
    ParameterSpec, ParameterType, SchemaError, SchemaIssue, ToolDescriptor, ValidatedArguments,
};
use toolcall_tools::{Tool, ToolError, ToolRegistry, ToolResult};

use crate::command::{CommandAdapter, CommandError, ExecutionResult, RunOptions};

const COMMAND: &str = "command";
const WORKING_DIR: &str = "working_dir";
const TIMEOUT: &str = "timeout";

/// Runs agent-supplied command lines through the host shell.
#[derive(Clone, Debug)]
pub struct ShellTool {
    adapter: Arc<CommandAdapter>,
}

impl ShellTool {
    /// Name the tool is registered under.
    pub const NAME: &'static str = "shell";

    /// Wraps an adapter.
    #[must_use]
    pub fn new(adapter: CommandAdapter) -> Self {
        Self {
            adapter: Arc::new(adapter),
        }
    }

    /// Returns the adapter used to run commands.
    #[must_use]
    pub fn adapter(&self) -> &CommandAdapter {
        &self.adapter
    }

    /// Describes the tool for the agent manifest.
    ///
    /// # Errors
    ///
    /// Only fails if the static parameter table is malformed.
    pub fn descriptor() -> toolcall_primitives::Result<ToolDescriptor> {
        ToolDescriptor::new(
            Self::NAME,
            "Execute a shell command and return its standard output. \
             Commands must be non-interactive: pass flags such as `-y` or \
             `-interaction=nonstopmode` instead of waiting for input.",
        )?
        .with_input(
            COMMAND,
            ParameterSpec::required(ParameterType::String, "Shell command line to execute"),
        )?
        .with_input(
            WORKING_DIR,
            ParameterSpec::optional(
                ParameterType::String,
                "Directory to run in; relative paths resolve against the tool's base directory",
            ),
        )?
        .with_input(
            TIMEOUT,
            ParameterSpec::optional(
                ParameterType::Integer,
                "Timeout in seconds; capped by the configured maximum",
            ),
        )
    }

    /// Registers the tool under [`ShellTool::NAME`].
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateTool`] if a `shell` tool already exists.
    pub fn register(self, registry: &mut ToolRegistry) -> ToolResult<()> {
        registry.register(Self::descriptor()?, self)
    }

    /// The interpreter started, so any nonzero status (including the shell's
    /// own 126/127) is a command failure.
    fn classify(&self, result: ExecutionResult) -> ToolResult<String> {
        let limit = self.adapter.config().max_output_bytes;
        match result.exit_code {
            0 => Ok(annotate(result.stdout, result.stdout_truncated, limit)),
            exit_code => Err(ToolError::Execution {
                exit_code,
                stderr: annotate(result.stderr, result.stderr_truncated, limit),
            }),
        }
    }
}

fn command_failure(err: CommandError) -> ToolError {
    match err {
        CommandError::Timeout { timeout } => ToolError::Timeout { timeout },
        err @ (CommandError::Spawn { .. } | CommandError::WorkingDirectory { .. }) => {
            ToolError::environment(err.to_string())
        }
        err @ (CommandError::Io { .. } | CommandError::Configuration { .. }) => {
            ToolError::failed(err.to_string())
        }
    }
}

#[async_trait]
impl Tool for ShellTool {
    async fn invoke(&self, arguments: ValidatedArguments) -> ToolResult<String> {
        let command = arguments.str(COMMAND).unwrap_or_default();
        if command.trim().is_empty() {
            return Err(SchemaError::new(
                Self::NAME,
                vec![SchemaIssue::Missing {
                    name: COMMAND.into(),
                }],
            )
            .into());
        }

        let mut options = RunOptions::default();
        if let Some(dir) = arguments.str(WORKING_DIR) {
            options = options.with_working_dir(dir);
        }
        if let Some(secs) = arguments.u64(TIMEOUT) {
            options = options.with_timeout(Duration::from_secs(secs.max(1)));
        }

        match self.adapter.run_with(command, options).await {
            Ok(result) => self.classify(result),
            Err(err) => Err(command_failure(err)),
        }
    }
}

fn annotate(text: String, truncated: bool, limit: usize) -> String {
    if truncated {
        format!("{text}\n[output truncated at {limit} bytes]")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};

    use crate::command::CommandConfig;

    fn tool(config: CommandConfig) -> ShellTool {
        ShellTool::new(CommandAdapter::new(config).unwrap())
    }

    fn arguments(value: &Value) -> ValidatedArguments {
        ShellTool::descriptor().unwrap().validate(value).unwrap()
    }

    #[test]
    fn descriptor_declares_every_parameter_read() {
        let descriptor = ShellTool::descriptor().unwrap();
        for name in [COMMAND, WORKING_DIR, TIMEOUT] {
            assert!(descriptor.inputs().contains_key(name), "missing {name}");
        }
        assert!(descriptor.inputs()[COMMAND].is_required());
        assert!(!descriptor.inputs()[WORKING_DIR].is_required());
        assert!(!descriptor.inputs()[TIMEOUT].is_required());
    }

    #[test]
    fn register_rejects_second_shell() {
        let mut registry = ToolRegistry::new();
        tool(CommandConfig::default()).register(&mut registry).unwrap();
        let err = tool(CommandConfig::default())
            .register(&mut registry)
            .expect_err("duplicate");
        assert!(matches!(err, ToolError::DuplicateTool { name } if name == "shell"));
    }

    #[tokio::test]
    async fn blank_command_is_rejected_before_running() {
        let err = tool(CommandConfig::default())
            .invoke(arguments(&json!({ "command": "   " })))
            .await
            .expect_err("blank");
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn success_returns_trimmed_stdout() {
        let output = tool(CommandConfig::default())
            .invoke(arguments(&json!({ "command": "echo hello" })))
            .await
            .unwrap();
        assert_eq!(output, "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_reports_stderr() {
        let err = tool(CommandConfig::default())
            .invoke(arguments(&json!({ "command": "echo nope 1>&2; exit 1" })))
            .await
            .expect_err("failure");
        assert!(matches!(&err, ToolError::Execution { exit_code: 1, .. }));
        assert_eq!(err.to_string(), "Command failed: nope");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unknown_program_is_command_failure() {
        let err = tool(CommandConfig::default())
            .invoke(arguments(&json!({ "command": "echo hi; definitely-not-a-real-program-xyz" })))
            .await
            .expect_err("not found");
        assert!(matches!(&err, ToolError::Execution { exit_code: 127, .. }));
        let text = err.to_string();
        assert!(text.starts_with("Command failed:"), "{text}");
        assert!(text.contains("definitely-not-a-real-program-xyz"), "{text}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_reserved_statuses_are_command_failures() {
        for status in [126, 127] {
            let err = tool(CommandConfig::default())
                .invoke(arguments(&json!({ "command": format!("exit {status}") })))
                .await
                .expect_err("nonzero exit");
            assert_eq!(
                err.to_string(),
                format!("Command failed: exited with status {status}")
            );
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_interpreter_is_environment_error() {
        let err = tool(CommandConfig::default().with_shell(["/nonexistent/shell", "-c"]))
            .invoke(arguments(&json!({ "command": "true" })))
            .await
            .expect_err("spawn failure");
        assert!(matches!(err, ToolError::Environment { .. }));
        assert!(err.to_string().starts_with("Command could not be started:"));
    }

    #[test]
    fn pipe_failures_map_to_tool_failure() {
        let err = command_failure(CommandError::Io {
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed"),
        });
        assert!(matches!(err, ToolError::Failed { .. }));
        assert!(err.to_string().starts_with("Tool failed:"), "{err}");
        assert!(err.to_string().contains("stdout closed"), "{err}");
    }

    #[test]
    fn timeouts_keep_their_deadline() {
        let err = command_failure(CommandError::Timeout {
            timeout: Duration::from_secs(3),
        });
        assert_eq!(err.to_string(), "Command timed out after 3s");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_working_dir_is_environment_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let err = tool(CommandConfig::default())
            .invoke(arguments(&json!({
                "command": "true",
                "working_dir": missing.to_string_lossy(),
            })))
            .await
            .expect_err("missing dir");
        assert!(matches!(err, ToolError::Environment { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_argument_applies() {
        let err = tool(CommandConfig::default())
            .invoke(arguments(&json!({ "command": "sleep 5", "timeout": 1 })))
            .await
            .expect_err("timeout");
        assert!(matches!(err, ToolError::Timeout { timeout } if timeout == Duration::from_secs(1)));
        assert_eq!(err.to_string(), "Command timed out after 1s");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn truncated_output_is_flagged() {
        let output = tool(CommandConfig::default().with_max_output_bytes(4))
            .invoke(arguments(&json!({ "command": "echo abcdefgh" })))
            .await
            .unwrap();
        assert_eq!(output, "abcd\n[output truncated at 4 bytes]");
    }
}
