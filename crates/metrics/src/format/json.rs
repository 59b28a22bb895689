//! JSON metrics formatter
//!
//! Formats metrics as one compact JSON object per report. Totals come from
//! the current collection; rates are present once a baseline exists.
//!
//! ```json
//! {"type":"report","sources":[{"id":"influxdb_listener","totals":{...},"requests_per_sec":12}],"sinks":[...]}
//! ```

use super::MetricsFormatter;
use crate::{CollectedMetrics, MetricsRates, SinkMetricsSnapshot, SourceMetricsSnapshot};
use serde::Serialize;

/// JSON metrics formatter
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct ReportJson<'a> {
    #[serde(rename = "type")]
    report_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<u64>,
    sources: Vec<SourceJson<'a>>,
    sinks: Vec<SinkJson<'a>>,
}

#[derive(Serialize)]
struct SourceJson<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    source_type: &'a str,
    totals: &'a SourceMetricsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    requests_per_sec: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_per_sec: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytes_per_sec: Option<u64>,
}

#[derive(Serialize)]
struct SinkJson<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    sink_type: &'a str,
    totals: &'a SinkMetricsSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics_per_sec: Option<u64>,
}

impl MetricsFormatter for JsonFormatter {
    fn format_report(&self, metrics: &CollectedMetrics, rates: Option<&MetricsRates>) -> String {
        let json = ReportJson {
            report_type: "report",
            elapsed_ms: rates.map(|r| r.elapsed.as_millis() as u64),
            sources: metrics
                .sources
                .iter()
                .map(|s| {
                    let r = rates.and_then(|r| r.sources.iter().find(|r| r.id == s.id));
                    SourceJson {
                        id: &s.id,
                        source_type: &s.source_type,
                        totals: &s.snapshot,
                        requests_per_sec: r.map(|r| r.requests_per_sec as u64),
                        metrics_per_sec: r.map(|r| r.metrics_per_sec as u64),
                        bytes_per_sec: r.map(|r| r.bytes_per_sec as u64),
                    }
                })
                .collect(),
            sinks: metrics
                .sinks
                .iter()
                .map(|s| SinkJson {
                    id: &s.id,
                    sink_type: &s.sink_type,
                    totals: &s.snapshot,
                    metrics_per_sec: rates
                        .and_then(|r| r.sinks.iter().find(|r| r.id == s.id))
                        .map(|r| r.metrics_per_sec as u64),
                })
                .collect(),
        };

        // Compact JSON (one log line per report)
        serde_json::to_string(&json).unwrap_or_else(|_| "{}".to_string())
    }
}
