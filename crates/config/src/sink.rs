//! Sink configuration
//!
//! Selects where decoded metrics go once the listener has accepted them.

use serde::Deserialize;

/// Default capacity of the listener to sink queue
pub const DEFAULT_QUEUE_SIZE: usize = 10_000;

/// Sink implementation
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SinkType {
    /// Write each metric as a line protocol line on stdout (default)
    #[default]
    Stdout,
    /// Discard metrics, counting them
    Null,
}

impl SinkType {
    /// Sink name used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Null => "null",
        }
    }
}

/// Sink configuration
///
/// ```toml
/// [sink]
/// type = "stdout"
/// queue_size = 10000
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Sink implementation
    #[serde(rename = "type")]
    pub sink_type: SinkType,

    /// Metrics buffered between listener and sink before new ones are dropped
    pub queue_size: usize,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            sink_type: SinkType::Stdout,
            queue_size: DEFAULT_QUEUE_SIZE,
        }
    }
}
