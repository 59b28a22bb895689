//! Logging configuration
//!
//! Log lines go to stderr by default so that stdout stays free for the
//! stdout sink's line protocol output.

use serde::Deserialize;

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Very verbose, includes per-line decoder detail
    Trace,
    /// Per-request failures (read errors, parse errors, long lines)
    Debug,
    /// Lifecycle events (default)
    #[default]
    Info,
    /// Accept and handshake failures
    Warn,
    /// Errors only
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable (default)
    #[default]
    Console,
    /// One JSON object per line
    Json,
}

/// Where log lines are written
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Standard error (default)
    #[default]
    Stderr,
    /// Standard output
    Stdout,
}

/// Logging configuration
///
/// ```toml
/// [log]
/// level = "info"
/// format = "console"
/// output = "stderr"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level
    pub level: LogLevel,

    /// Line format
    pub format: LogFormat,

    /// Destination stream
    pub output: LogOutput,
}
