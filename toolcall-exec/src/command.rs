//! Runs host command lines and captures their outcome.
//!
//! Commands go through the host interpreter (`sh -c` on Unix, `cmd /C` on
//! Windows) with the full privileges of this process. No sandboxing is
//! applied. Each run has a deadline and a per-stream capture ceiling; on
//! Unix the child leads its own process group so a timeout can kill
//! everything it spawned.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::output::read_capped;

/// Result alias used by the command adapter.
pub type CommandResult<T> = Result<T, CommandError>;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_TIMEOUT_SECS: u64 = 600;
const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Errors raised while running a command.
///
/// A command that runs and exits nonzero is not an error here; it is an
/// [`ExecutionResult`] whose [`ExecutionResult::succeeded`] is `false`.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Adapter configuration is unusable.
    #[error("invalid command configuration: {reason}")]
    Configuration {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Requested working directory does not exist or is not a directory.
    #[error("working directory `{}` is unusable: {reason}", .path.display())]
    WorkingDirectory {
        /// Resolved directory path.
        path: PathBuf,
        /// Why it was rejected.
        reason: String,
    },

    /// The interpreter process could not be started.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        /// Interpreter that failed to start.
        program: String,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// Reading the child's output or status failed.
    #[error("i/o error while running command: {source}")]
    Io {
        /// Underlying OS error.
        #[from]
        source: io::Error,
    },

    /// The command ran past its deadline and was killed.
    #[error("command timed out after {timeout:?}")]
    Timeout {
        /// Deadline that was exceeded.
        timeout: Duration,
    },
}

impl CommandError {
    fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}

/// Limits and interpreter settings for [`CommandAdapter`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Deadline applied when the caller does not supply one.
    pub timeout_secs: u64,
    /// Upper bound for caller-supplied deadlines.
    pub max_timeout_secs: u64,
    /// Bytes kept per stream; the rest is discarded and flagged.
    pub max_output_bytes: usize,
    /// Interpreter argv prefix; the command line is appended as the last
    /// argument. Defaults to `sh -c` or `cmd /C`.
    pub shell: Option<Vec<String>>,
    /// Base directory for commands and for relative `working_dir` values.
    /// Defaults to the process working directory.
    pub working_dir: Option<PathBuf>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_timeout_secs: DEFAULT_MAX_TIMEOUT_SECS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            shell: None,
            working_dir: None,
        }
    }
}

impl CommandConfig {
    /// Sets the default deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self.max_timeout_secs = self.max_timeout_secs.max(self.timeout_secs);
        self
    }

    /// Sets the per-stream capture ceiling.
    #[must_use]
    pub fn with_max_output_bytes(mut self, bytes: usize) -> Self {
        self.max_output_bytes = bytes;
        self
    }

    /// Overrides the interpreter argv prefix.
    #[must_use]
    pub fn with_shell<I, S>(mut self, shell: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shell = Some(shell.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the base working directory.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Default deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Largest deadline a caller may request.
    #[must_use]
    pub const fn max_timeout(&self) -> Duration {
        Duration::from_secs(self.max_timeout_secs)
    }

    /// Checks the limits are usable.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Configuration`] for zero limits, a maximum
    /// deadline below the default, or an empty interpreter argv.
    pub fn validate(&self) -> CommandResult<()> {
        if self.timeout_secs == 0 {
            return Err(CommandError::configuration("timeout_secs must be > 0"));
        }
        if self.max_timeout_secs < self.timeout_secs {
            return Err(CommandError::configuration(
                "max_timeout_secs must be >= timeout_secs",
            ));
        }
        if self.max_output_bytes == 0 {
            return Err(CommandError::configuration("max_output_bytes must be > 0"));
        }
        if let Some(shell) = &self.shell {
            if shell.first().is_none_or(|program| program.trim().is_empty()) {
                return Err(CommandError::configuration(
                    "shell must name an interpreter program",
                ));
            }
        }
        Ok(())
    }

    fn interpreter(&self) -> Vec<String> {
        self.shell.clone().unwrap_or_else(default_shell)
    }
}

#[cfg(windows)]
fn default_shell() -> Vec<String> {
    vec!["cmd".to_owned(), "/C".to_owned()]
}

#[cfg(not(windows))]
fn default_shell() -> Vec<String> {
    vec!["sh".to_owned(), "-c".to_owned()]
}

/// Per-run overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunOptions {
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl RunOptions {
    /// Runs in `dir`; relative paths resolve against the configured base.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Uses `timeout` instead of the configured default, clamped to the
    /// configured maximum.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Outcome of a command that ran to completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Standard output, whitespace-trimmed.
    pub stdout: String,
    /// Standard error, whitespace-trimmed.
    pub stderr: String,
    /// Exit status; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    /// Standard output exceeded the capture ceiling.
    pub stdout_truncated: bool,
    /// Standard error exceeded the capture ceiling.
    pub stderr_truncated: bool,
    /// Wall-clock run time.
    pub duration: Duration,
}

impl ExecutionResult {
    /// Returns `true` when the command exited with status zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes command lines through the host interpreter.
#[derive(Clone, Debug)]
pub struct CommandAdapter {
    config: CommandConfig,
}

impl CommandAdapter {
    /// Creates an adapter from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Configuration`] if the configuration is
    /// unusable.
    pub fn new(config: CommandConfig) -> CommandResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &CommandConfig {
        &self.config
    }

    /// Runs `command` with the configured defaults.
    ///
    /// # Errors
    ///
    /// See [`CommandAdapter::run_with`].
    pub async fn run(&self, command: &str) -> CommandResult<ExecutionResult> {
        self.run_with(command, RunOptions::default()).await
    }

    /// Runs `command` with per-run overrides.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::WorkingDirectory`] or [`CommandError::Spawn`]
    /// when the command cannot start, [`CommandError::Timeout`] when it
    /// outlives its deadline, and [`CommandError::Io`] if its pipes fail.
    pub async fn run_with(
        &self,
        command: &str,
        options: RunOptions,
    ) -> CommandResult<ExecutionResult> {
        let timeout = options
            .timeout
            .unwrap_or_else(|| self.config.timeout())
            .min(self.config.max_timeout());
        let cwd = self.resolve_working_dir(options.working_dir.as_deref()).await?;

        let interpreter = self.config.interpreter();
        let (program, prefix) = interpreter
            .split_first()
            .ok_or_else(|| CommandError::configuration("shell must name an interpreter program"))?;

        let mut cmd = Command::new(program);
        cmd.args(prefix)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &cwd {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        cmd.process_group(0);

        debug!(command, ?timeout, cwd = ?cwd, "spawning command");
        let started = Instant::now();
        let mut child = cmd.spawn().map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;
        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = self.config.max_output_bytes;

        let collected = tokio::time::timeout(timeout, async {
            let (stdout, stderr, status) = tokio::join!(
                read_capped(stdout, limit),
                read_capped(stderr, limit),
                child.wait(),
            );
            Ok::<_, io::Error>((stdout?, stderr?, status?))
        })
        .await;

        match collected {
            Ok(Ok((stdout, stderr, status))) => {
                let result = ExecutionResult {
                    stdout_truncated: stdout.truncated(),
                    stderr_truncated: stderr.truncated(),
                    stdout: stdout.into_text(),
                    stderr: stderr.into_text(),
                    exit_code: status.code().unwrap_or(-1),
                    duration: started.elapsed(),
                };
                debug!(
                    exit_code = result.exit_code,
                    elapsed_ms = elapsed_ms(result.duration),
                    stdout_truncated = result.stdout_truncated,
                    stderr_truncated = result.stderr_truncated,
                    "command finished"
                );
                Ok(result)
            }
            Ok(Err(source)) => {
                terminate(&mut child, pid).await;
                Err(CommandError::Io { source })
            }
            Err(_elapsed) => {
                warn!(command, ?timeout, "command timed out, killing process group");
                terminate(&mut child, pid).await;
                Err(CommandError::Timeout { timeout })
            }
        }
    }

    async fn resolve_working_dir(&self, requested: Option<&Path>) -> CommandResult<Option<PathBuf>> {
        let dir = match (self.config.working_dir.as_deref(), requested) {
            (_, Some(requested)) if requested.is_absolute() => requested.to_path_buf(),
            (Some(base), Some(requested)) => base.join(requested),
            (None, Some(requested)) => requested.to_path_buf(),
            (Some(base), None) => base.to_path_buf(),
            (None, None) => return Ok(None),
        };

        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(Some(dir)),
            Ok(_) => Err(CommandError::WorkingDirectory {
                path: dir,
                reason: "not a directory".into(),
            }),
            Err(err) => Err(CommandError::WorkingDirectory {
                path: dir,
                reason: err.to_string(),
            }),
        }
    }
}

async fn terminate(
    child: &mut Child,
    #[cfg_attr(not(unix), allow(unused_variables))] pid: Option<u32>,
) {
    #[cfg(unix)]
    {
        if let Some(pgid) = pid.and_then(|pid| libc::pid_t::try_from(pid).ok()) {
            // SAFETY: the child was spawned with `process_group(0)`, so `pgid`
            // names a group containing only the child and its descendants.
            if unsafe { libc::killpg(pgid, libc::SIGKILL) } == -1 {
                debug!(pgid, error = %io::Error::last_os_error(), "killpg failed");
            }
        }
    }

    if let Err(err) = child.kill().await {
        debug!(error = %err, "failed to reap timed out command");
    }
}

fn elapsed_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
