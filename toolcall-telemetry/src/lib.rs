//! Observability utilities for toolcall hosts.

#![warn(missing_docs, clippy::pedantic)]

pub mod tracing_support {
    //! Structured tracing helpers.

    use anyhow::anyhow;
    use serde::{Deserialize, Serialize};
    use tracing_subscriber::EnvFilter;

    /// Formatting switches for the installed subscriber.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct TelemetryConfig {
        /// Print the event target (module path) on each line.
        pub with_target: bool,
        /// Emit ANSI colour codes.
        pub ansi: bool,
    }

    impl Default for TelemetryConfig {
        fn default() -> Self {
            Self {
                with_target: false,
                ansi: true,
            }
        }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    #[must_use]
    pub const fn default_directive(verbose: bool) -> &'static str {
        if verbose { "info,toolcall=debug" } else { "info" }
    }

    /// Installs a global `fmt` subscriber.
    ///
    /// `RUST_LOG` takes precedence over [`default_directive`].
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed.
    pub fn init_tracing(verbose: bool, config: &TelemetryConfig) -> anyhow::Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.with_target)
            .with_ansi(config.ansi)
            .try_init()
            .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
    }

}

pub use tracing_support::{TelemetryConfig, default_directive, init_tracing};
