//! Metrics provider traits
//!
//! The listener and the sinks implement these traits so the reporter can
//! collect their counters without knowing the concrete types.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the listener counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SourceMetricsSnapshot {
    /// Request body bytes read (after decompression)
    pub bytes_received: u64,
    /// Requests that entered the router
    pub requests_received: u64,
    /// Requests that left the router with a response
    pub requests_served: u64,
    /// `/write` responses
    pub writes_served: u64,
    /// `/query` responses
    pub queries_served: u64,
    /// `/ping` responses
    pub pings_served: u64,
    /// 404 responses
    pub not_founds_served: u64,
    /// Buffers the pool has ever allocated
    pub buffers_created: u64,
    /// Rejected Basic auth attempts
    pub auth_failures: u64,
    /// Lines dropped for exceeding the buffer
    pub long_lines: u64,
    /// Metrics handed to the collector
    pub metrics_forwarded: u64,
    /// Metrics the collector refused (queue full or closed)
    pub metrics_dropped: u64,
    /// Chunks that failed to decode completely
    pub parse_errors: u64,
}

/// Trait for sources to provide metrics to the reporter
pub trait SourceMetricsProvider: Send + Sync {
    /// Unique identifier for this source instance
    fn source_id(&self) -> &str;

    /// Source type (e.g., "influxdb_listener")
    fn source_type(&self) -> &str;

    /// Get a snapshot of current metrics
    fn snapshot(&self) -> SourceMetricsSnapshot;
}

/// Metrics for a sink component
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Metrics taken off the queue
    pub metrics_received: AtomicU64,
    /// Metrics successfully written
    pub metrics_written: AtomicU64,
    /// Bytes written
    pub bytes_written: AtomicU64,
    /// Write errors
    pub write_errors: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics with all counters at zero
    pub const fn new() -> Self {
        Self {
            metrics_received: AtomicU64::new(0),
            metrics_written: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    /// Record a metric taken off the queue
    #[inline]
    pub fn record_received(&self) {
        self.metrics_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful write
    #[inline]
    pub fn record_written(&self, metrics: u64, bytes: u64) {
        self.metrics_written.fetch_add(metrics, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a write error
    #[inline]
    pub fn record_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of current values
    #[inline]
    pub fn snapshot(&self) -> SinkMetricsSnapshot {
        SinkMetricsSnapshot {
            metrics_received: self.metrics_received.load(Ordering::Relaxed),
            metrics_written: self.metrics_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct SinkMetricsSnapshot {
    pub metrics_received: u64,
    pub metrics_written: u64,
    pub bytes_written: u64,
    pub write_errors: u64,
}

/// Trait for sinks to provide metrics to the reporter
pub trait SinkMetricsProvider: Send + Sync {
    /// Unique identifier for this sink instance
    fn sink_id(&self) -> &str;

    /// Sink type (e.g., "stdout", "null")
    fn sink_type(&self) -> &str;

    /// Get a snapshot of current metrics
    fn snapshot(&self) -> SinkMetricsSnapshot;
}
