//! Lineport Sinks
//!
//! Consumers for the metrics the listener accepts. Each sink drains an
//! `mpsc::Receiver<Metric>` until every sender is gone, then returns its
//! final counters.
//!
//! # Available Sinks
//!
//! - `stdout` - line protocol on stdout (default)
//! - `null` - discard, counting only

use std::sync::Arc;

use lineport_config::{SinkConfig, SinkType};
use lineport_metrics::{SinkMetricsProvider, SinkMetricsSnapshot};
use lineport_protocol::Metric;
use tokio::sync::mpsc;

pub mod null;
pub mod stdout;

pub use null::{NullSink, NullSinkMetricsHandle};
pub use stdout::{StdoutSink, StdoutSinkMetricsHandle};

/// A configured sink
pub enum Sink {
    Stdout(StdoutSink),
    Null(NullSink),
}

impl Sink {
    /// Build the sink selected by `config`
    pub fn from_config(config: &SinkConfig, receiver: mpsc::Receiver<Metric>) -> Self {
        match config.sink_type {
            SinkType::Stdout => Self::Stdout(StdoutSink::new(receiver)),
            SinkType::Null => Self::Null(NullSink::new(receiver)),
        }
    }

    /// Get a metrics handle for reporting
    pub fn metrics_handle(&self) -> Arc<dyn SinkMetricsProvider> {
        match self {
            Self::Stdout(sink) => Arc::new(sink.metrics_handle()),
            Self::Null(sink) => Arc::new(sink.metrics_handle()),
        }
    }

    /// Run until the queue is closed and drained
    pub async fn run(self) -> SinkMetricsSnapshot {
        match self {
            Self::Stdout(sink) => sink.run().await,
            Self::Null(sink) => sink.run().await,
        }
    }
}
