//! Listener counters
//!
//! Process-wide, monotonically increasing. Recorders are relaxed atomics so
//! concurrent requests never contend on them.

use std::sync::Arc;

use lineport_metrics::{Counter, SourceMetricsProvider, SourceMetricsSnapshot};

use super::pool::BufferPool;

/// Influx listener metrics
#[derive(Debug, Default)]
pub struct ListenerMetrics {
    pub bytes_received: Counter,
    pub requests_received: Counter,
    pub requests_served: Counter,
    pub writes_served: Counter,
    pub queries_served: Counter,
    pub pings_served: Counter,
    pub not_founds_served: Counter,
    /// Mirrors `BufferPool::created`, refreshed on snapshot
    pub buffers_created: Counter,
    pub auth_failures: Counter,
    pub long_lines: Counter,
    pub metrics_forwarded: Counter,
    pub metrics_dropped: Counter,
    pub parse_errors: Counter,
}

impl ListenerMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            bytes_received: Counter::new(),
            requests_received: Counter::new(),
            requests_served: Counter::new(),
            writes_served: Counter::new(),
            queries_served: Counter::new(),
            pings_served: Counter::new(),
            not_founds_served: Counter::new(),
            buffers_created: Counter::new(),
            auth_failures: Counter::new(),
            long_lines: Counter::new(),
            metrics_forwarded: Counter::new(),
            metrics_dropped: Counter::new(),
            parse_errors: Counter::new(),
        }
    }

    /// Record body bytes read
    #[inline]
    pub fn bytes_received(&self, bytes: usize) {
        self.bytes_received.add(bytes as u64);
    }

    /// Record the outcome of offering a metric to the collector
    #[inline]
    pub fn metric_offered(&self, accepted: bool) {
        if accepted {
            self.metrics_forwarded.inc();
        } else {
            self.metrics_dropped.inc();
        }
    }

    /// Take a snapshot of current values
    pub fn snapshot(&self) -> SourceMetricsSnapshot {
        SourceMetricsSnapshot {
            bytes_received: self.bytes_received.get(),
            requests_received: self.requests_received.get(),
            requests_served: self.requests_served.get(),
            writes_served: self.writes_served.get(),
            queries_served: self.queries_served.get(),
            pings_served: self.pings_served.get(),
            not_founds_served: self.not_founds_served.get(),
            buffers_created: self.buffers_created.get(),
            auth_failures: self.auth_failures.get(),
            long_lines: self.long_lines.get(),
            metrics_forwarded: self.metrics_forwarded.get(),
            metrics_dropped: self.metrics_dropped.get(),
            parse_errors: self.parse_errors.get(),
        }
    }
}

/// Handle for reporting listener metrics
#[derive(Clone)]
pub struct ListenerMetricsHandle {
    id: String,
    metrics: Arc<ListenerMetrics>,
    pool: Arc<BufferPool>,
}

impl ListenerMetricsHandle {
    /// Create a new metrics handle
    pub fn new(id: String, metrics: Arc<ListenerMetrics>, pool: Arc<BufferPool>) -> Self {
        Self { id, metrics, pool }
    }
}

impl SourceMetricsProvider for ListenerMetricsHandle {
    fn source_id(&self) -> &str {
        &self.id
    }

    fn source_type(&self) -> &str {
        "influxdb_listener"
    }

    fn snapshot(&self) -> SourceMetricsSnapshot {
        self.metrics.buffers_created.set(self.pool.created());
        self.metrics.snapshot()
    }
}
