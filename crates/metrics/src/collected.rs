//! Collected metrics snapshot and rate calculations
//!
//! Holds every provider's snapshot at one instant, plus per-second rates
//! computed against the previous collection.

use crate::{SinkMetricsSnapshot, SourceMetricsSnapshot};
use std::time::{Duration, Instant};

/// Collected source snapshot with metadata
#[derive(Debug, Clone)]
pub struct CollectedSource {
    /// Source identifier
    pub id: String,
    /// Source type
    pub source_type: String,
    /// Metrics snapshot
    pub snapshot: SourceMetricsSnapshot,
}

/// Collected sink snapshot with metadata
#[derive(Debug, Clone)]
pub struct CollectedSink {
    /// Sink identifier
    pub id: String,
    /// Sink type
    pub sink_type: String,
    /// Metrics snapshot
    pub snapshot: SinkMetricsSnapshot,
}

/// Complete metrics collection at a point in time
#[derive(Debug, Clone, Default)]
pub struct CollectedMetrics {
    /// When this collection was taken
    pub timestamp: Option<Instant>,

    /// All source metrics
    pub sources: Vec<CollectedSource>,

    /// All sink metrics
    pub sinks: Vec<CollectedSink>,
}

impl CollectedMetrics {
    /// Calculate rates by comparing with a previous snapshot
    ///
    /// Returns None if timestamps are missing or identical.
    pub fn rates(&self, previous: &CollectedMetrics) -> Option<MetricsRates> {
        let current_ts = self.timestamp?;
        let previous_ts = previous.timestamp?;

        let elapsed = current_ts.duration_since(previous_ts);
        if elapsed.is_zero() {
            return None;
        }
        let elapsed_secs = elapsed.as_secs_f64();

        let sources = self
            .sources
            .iter()
            .filter_map(|current| {
                let prev = previous.sources.iter().find(|s| s.id == current.id)?;
                let (cur, old) = (&current.snapshot, &prev.snapshot);
                Some(SourceRates {
                    id: current.id.clone(),
                    source_type: current.source_type.clone(),
                    requests_per_sec: rate(cur.requests_served, old.requests_served, elapsed_secs),
                    metrics_per_sec: rate(
                        cur.metrics_forwarded,
                        old.metrics_forwarded,
                        elapsed_secs,
                    ),
                    bytes_per_sec: rate(cur.bytes_received, old.bytes_received, elapsed_secs),
                    in_flight: cur.requests_received.saturating_sub(cur.requests_served),
                    parse_errors: cur.parse_errors.saturating_sub(old.parse_errors),
                    long_lines: cur.long_lines.saturating_sub(old.long_lines),
                    auth_failures: cur.auth_failures.saturating_sub(old.auth_failures),
                    dropped: cur.metrics_dropped.saturating_sub(old.metrics_dropped),
                    buffers_created: cur.buffers_created,
                })
            })
            .collect();

        let sinks = self
            .sinks
            .iter()
            .filter_map(|current| {
                let prev = previous.sinks.iter().find(|s| s.id == current.id)?;
                Some(SinkRates {
                    id: current.id.clone(),
                    sink_type: current.sink_type.clone(),
                    metrics_per_sec: rate(
                        current.snapshot.metrics_written,
                        prev.snapshot.metrics_written,
                        elapsed_secs,
                    ),
                    bytes_per_sec: rate(
                        current.snapshot.bytes_written,
                        prev.snapshot.bytes_written,
                        elapsed_secs,
                    ),
                    errors: current
                        .snapshot
                        .write_errors
                        .saturating_sub(prev.snapshot.write_errors),
                })
            })
            .collect();

        Some(MetricsRates {
            elapsed,
            sources,
            sinks,
        })
    }
}

#[inline]
fn rate(current: u64, previous: u64, elapsed_secs: f64) -> f64 {
    current.saturating_sub(previous) as f64 / elapsed_secs
}

/// Calculated rates between two snapshots
#[derive(Debug, Clone)]
pub struct MetricsRates {
    /// Time elapsed between snapshots
    pub elapsed: Duration,

    /// Per-source rates
    pub sources: Vec<SourceRates>,

    /// Per-sink rates
    pub sinks: Vec<SinkRates>,
}

/// Listener rates and per-period deltas
#[derive(Debug, Clone)]
pub struct SourceRates {
    /// Source identifier
    pub id: String,
    /// Source type
    pub source_type: String,
    /// Requests served per second
    pub requests_per_sec: f64,
    /// Metrics forwarded per second
    pub metrics_per_sec: f64,
    /// Body bytes read per second
    pub bytes_per_sec: f64,
    /// Requests received but not yet served at collection time
    pub in_flight: u64,
    /// Chunks with decode errors in this period
    pub parse_errors: u64,
    /// Over-length lines in this period
    pub long_lines: u64,
    /// Auth failures in this period
    pub auth_failures: u64,
    /// Metrics dropped in this period
    pub dropped: u64,
    /// Buffers allocated since start
    pub buffers_created: u64,
}

/// Sink rates
#[derive(Debug, Clone)]
pub struct SinkRates {
    /// Sink identifier
    pub id: String,
    /// Sink type
    pub sink_type: String,
    /// Metrics written per second
    pub metrics_per_sec: f64,
    /// Bytes written per second
    pub bytes_per_sec: f64,
    /// Errors in this period
    pub errors: u64,
}
