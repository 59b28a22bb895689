//! Lineport Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid config: a plain HTTP listener on `:8186`
//! writing to stdout.
//!
//! # Parsing
//!
//! ```
//! use lineport_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[listener]\nservice_address = \":9000\"").unwrap();
//! assert_eq!(config.listener.bind_address(), "0.0.0.0:9000");
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [metrics]
//! interval = "60s"
//!
//! [listener]
//! service_address = ":8186"
//! max_body_size = "500MiB"
//! max_line_size = "64KiB"
//! database_tag = "database"
//!
//! [sink]
//! type = "stdout"
//! ```

mod error;
mod listener;
mod logging;
mod metrics;
mod sink;
mod size;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use listener::{
    DEFAULT_BUFFER_POOL_SIZE, DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_LINE_SIZE,
    DEFAULT_SERVICE_ADDRESS, DEFAULT_TIMEOUT, ListenerConfig,
};
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use metrics::{MetricsConfig, MetricsFormat};
pub use sink::{DEFAULT_QUEUE_SIZE, SinkConfig, SinkType};
pub use size::ByteSize;

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Metrics reporting configuration
    pub metrics: MetricsConfig,

    /// HTTP listener
    pub listener: ListenerConfig,

    /// Downstream sink
    pub sink: SinkConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        validation::validate_config(&config)?;
        Ok(config)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
