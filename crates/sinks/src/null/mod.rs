//! Null sink - discards all metrics
//!
//! Drains the queue and counts what it saw. Useful for measuring the
//! listener without any output cost.
//!
//! # Example
//!
//! ```ignore
//! let (acc, rx) = ChannelAccumulator::channel(1000);
//! let sink = NullSink::new(rx);
//! tokio::spawn(sink.run());
//! ```

use std::sync::Arc;

use lineport_metrics::{SinkMetrics, SinkMetricsProvider, SinkMetricsSnapshot};
use lineport_protocol::Metric;
use tokio::sync::mpsc;

/// Null sink that discards every metric
pub struct NullSink {
    id: String,
    receiver: mpsc::Receiver<Metric>,
    metrics: Arc<SinkMetrics>,
}

/// Handle for accessing null sink metrics
///
/// Holds an Arc to the metrics, so it stays valid after `run()` consumes
/// the sink.
#[derive(Clone)]
pub struct NullSinkMetricsHandle {
    id: String,
    metrics: Arc<SinkMetrics>,
}

impl SinkMetricsProvider for NullSinkMetricsHandle {
    fn sink_id(&self) -> &str {
        &self.id
    }

    fn sink_type(&self) -> &str {
        "null"
    }

    fn snapshot(&self) -> SinkMetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl NullSink {
    /// Create a new null sink with the given receiver
    pub fn new(receiver: mpsc::Receiver<Metric>) -> Self {
        Self::with_name(receiver, "null")
    }

    /// Create a new null sink with a custom name
    pub fn with_name(receiver: mpsc::Receiver<Metric>, name: impl Into<String>) -> Self {
        Self {
            id: name.into(),
            receiver,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Get reference to metrics
    #[inline]
    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Get a metrics handle for reporting
    pub fn metrics_handle(&self) -> NullSinkMetricsHandle {
        NullSinkMetricsHandle {
            id: self.id.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Run the sink until every sender is dropped
    ///
    /// Returns the final metrics snapshot.
    pub async fn run(mut self) -> SinkMetricsSnapshot {
        tracing::info!(sink = %self.id, "null sink starting");

        while let Some(metric) = self.receiver.recv().await {
            self.metrics.record_received();
            // "written" is the discard
            self.metrics.record_written(1, 0);
            drop(metric);
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            sink = %self.id,
            metrics = snapshot.metrics_received,
            "null sink shutting down"
        );
        snapshot
    }
}

#[cfg(test)]
#[path = "null_test.rs"]
mod null_test;
