//! Configuration management for toolcall hosts.
//!
//! Settings come from an optional TOML file and a small set of
//! `TOOLCALL_*` environment overrides. The resolved [`ToolcallConfig`] is
//! passed explicitly to whatever builds the invoker; nothing here is read
//! from global state after startup.

#![warn(missing_docs, clippy::pedantic)]

pub mod schema {
    //! Strongly typed configuration schemas.

    use serde::{Deserialize, Serialize};
    use toolcall_exec::CommandConfig;
    use toolcall_telemetry::TelemetryConfig;

    /// Top-level configuration.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default, deny_unknown_fields)]
    pub struct ToolcallConfig {
        /// Log tool arguments and results at `info`.
        pub verbose: bool,
        /// Command adapter limits.
        pub command: CommandConfig,
        /// Log output formatting.
        pub telemetry: TelemetryConfig,
    }
}

pub mod loader {
    //! Configuration loader implementations.

    use std::path::Path;
    use std::str::FromStr;

    use anyhow::{Context, bail};
    use tracing::debug;

    use crate::schema::ToolcallConfig;

    /// Enables verbose invocation logging.
    pub const ENV_VERBOSE: &str = "TOOLCALL_VERBOSE";
    /// Overrides the default command timeout, in seconds.
    pub const ENV_TIMEOUT_SECS: &str = "TOOLCALL_TIMEOUT_SECS";
    /// Overrides the per-stream output ceiling, in bytes.
    pub const ENV_MAX_OUTPUT_BYTES: &str = "TOOLCALL_MAX_OUTPUT_BYTES";

    impl ToolcallConfig {
        /// Parses configuration from TOML text. Missing keys take defaults.
        ///
        /// # Errors
        ///
        /// Returns an error for malformed TOML, unknown keys, or values that
        /// fail [`ToolcallConfig::validate`].
        pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
            let config: Self = toml::from_str(text).context("failed to parse toolcall config")?;
            config.validate()?;
            Ok(config)
        }

        /// Reads and parses a TOML configuration file.
        ///
        /// # Errors
        ///
        /// Returns an error if the file cannot be read or parsed.
        pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
            let path = path.as_ref();
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            debug!(path = %path.display(), "loaded toolcall config");
            Self::from_toml_str(&text)
                .with_context(|| format!("invalid config file {}", path.display()))
        }

        /// Loads `path` if given (defaults otherwise), then applies overrides
        /// from the process environment.
        ///
        /// # Errors
        ///
        /// Returns an error if the file or any override is invalid.
        pub fn resolve(path: Option<&Path>) -> anyhow::Result<Self> {
            let mut config = match path {
                Some(path) => Self::load(path)?,
                None => Self::default(),
            };
            config.apply_env_overrides(|key| std::env::var(key).ok())?;
            Ok(config)
        }

        /// Applies `TOOLCALL_*` overrides read through `lookup`.
        ///
        /// # Errors
        ///
        /// Returns an error if an override cannot be parsed or leaves the
        /// configuration invalid.
        pub fn apply_env_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
        where
            F: Fn(&str) -> Option<String>,
        {
            if let Some(raw) = lookup(ENV_VERBOSE) {
                self.verbose = parse_flag(ENV_VERBOSE, &raw)?;
            }
            if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
                let secs: u64 = parse_number(ENV_TIMEOUT_SECS, &raw)?;
                self.command.timeout_secs = secs;
                self.command.max_timeout_secs = self.command.max_timeout_secs.max(secs);
            }
            if let Some(raw) = lookup(ENV_MAX_OUTPUT_BYTES) {
                self.command.max_output_bytes = parse_number(ENV_MAX_OUTPUT_BYTES, &raw)?;
            }
            self.validate()
        }

        /// Checks every section is usable.
        ///
        /// # Errors
        ///
        /// Returns an error describing the first invalid setting.
        pub fn validate(&self) -> anyhow::Result<()> {
            self.command
                .validate()
                .context("invalid [command] section")?;
            Ok(())
        }
    }

    fn parse_flag(key: &str, raw: &str) -> anyhow::Result<bool> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => bail!("{key} must be a boolean flag, got `{other}`"),
        }
    }

    fn parse_number<T>(key: &str, raw: &str) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        raw.trim()
            .parse()
            .with_context(|| format!("{key} must be a non-negative integer, got `{raw}`"))
    }
}

pub use schema::ToolcallConfig;
