//! Tracing configuration.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line output.
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Configuration for [`init_tracing`](super::init_tracing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Output format.
    #[serde(default)]
    pub log_format: LogFormat,
    /// `EnvFilter` directive, e.g. `info,synapse_network=debug`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Include file and line of each event.
    #[serde(default)]
    pub include_location: bool,
    /// Include the event target.
    #[serde(default = "default_include_target")]
    pub include_target: bool,
    /// Include the emitting thread's ID.
    #[serde(default)]
    pub include_thread_ids: bool,
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_include_target() -> bool {
    true
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_filter: default_log_filter(),
            include_location: false,
            include_target: default_include_target(),
            include_thread_ids: false,
        }
    }
}

impl TracingConfig {
    /// Load from environment variables.
    ///
    /// - `SYNAPSE_LOG_FORMAT`: `json`, `pretty` or `compact`. Unset means
    ///   pretty on a terminal and json otherwise.
    /// - `SYNAPSE_LOG_LEVEL`, then `RUST_LOG`: the filter directive.
    /// - `SYNAPSE_LOG_LOCATION`: `true` or `1` to include file and line.
    pub fn from_env() -> Self {
        let log_format = env::var("SYNAPSE_LOG_FORMAT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| {
                if std::io::IsTerminal::is_terminal(&std::io::stdout()) {
                    LogFormat::Pretty
                } else {
                    LogFormat::Json
                }
            });

        let log_filter = env::var("SYNAPSE_LOG_LEVEL")
            .or_else(|_| env::var("RUST_LOG"))
            .unwrap_or_else(|_| default_log_filter());

        let include_location = env::var("SYNAPSE_LOG_LOCATION")
            .map(|s| s == "true" || s == "1")
            .unwrap_or(false);

        Self {
            log_format,
            log_filter,
            include_location,
            ..Self::default()
        }
    }

    /// Set the output format.
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Set the filter directive.
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = filter.into();
        self
    }

    /// Include file and line of each event.
    pub fn with_location(mut self, include: bool) -> Self {
        self.include_location = include;
        self
    }

    /// Include the emitting thread's ID.
    pub fn with_thread_ids(mut self, include: bool) -> Self {
        self.include_thread_ids = include;
        self
    }
}
