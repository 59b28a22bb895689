//! Metrics reporting configuration
//!
//! Controls the periodic report of listener and sink counters. Reporting
//! is also what refreshes the listener's `buffers_created` count, so
//! disabling it freezes that counter at zero.

use serde::Deserialize;
use std::time::Duration;

/// Report format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricsFormat {
    /// Short operator-facing lines (default)
    #[default]
    Human,
    /// One JSON document per report
    Json,
}

/// Metrics configuration
///
/// ```toml
/// [metrics]
/// enabled = true
/// interval = "60s"
/// format = "human"
/// include_listener = true
/// include_sink = true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Run the reporter at all
    pub enabled: bool,

    /// Time between reports
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Report format
    pub format: MetricsFormat,

    /// Report the listener counters
    pub include_listener: bool,

    /// Report the sink counters
    pub include_sink: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(60),
            format: MetricsFormat::Human,
            include_listener: true,
            include_sink: true,
        }
    }
}
