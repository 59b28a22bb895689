//! Stdout Sink - line protocol output
//!
//! Re-encodes every accepted metric as one line protocol line. Piping the
//! output into another writer reproduces what clients sent, with the
//! database tag and server timestamps applied.
//!
//! # Example Output
//!
//! ```text
//! cpu,host=a,database=telegraf usage=0.5,count=3i 1600000000000000000
//! mem free=1024i 1600000000000000001
//! ```

use std::io::{self, BufWriter, Write};
use std::sync::Arc;

use lineport_metrics::{SinkMetrics, SinkMetricsProvider, SinkMetricsSnapshot};
use lineport_protocol::Metric;
use tokio::sync::mpsc;

/// Stdout sink for line protocol output
pub struct StdoutSink {
    /// Channel receiver for metrics
    receiver: mpsc::Receiver<Metric>,

    /// Sink name for logging
    name: String,

    /// Output, stdout unless a writer is injected
    writer: Box<dyn Write + Send>,

    /// Metrics (Arc for sharing with metrics handle)
    metrics: Arc<SinkMetrics>,
}

/// Handle for accessing stdout sink metrics
#[derive(Clone)]
pub struct StdoutSinkMetricsHandle {
    name: String,
    metrics: Arc<SinkMetrics>,
}

impl SinkMetricsProvider for StdoutSinkMetricsHandle {
    fn sink_id(&self) -> &str {
        &self.name
    }

    fn sink_type(&self) -> &str {
        "stdout"
    }

    fn snapshot(&self) -> SinkMetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl StdoutSink {
    /// Create a new stdout sink
    pub fn new(receiver: mpsc::Receiver<Metric>) -> Self {
        Self::with_writer(receiver, BufWriter::new(io::stdout()))
    }

    /// Create a sink writing to an arbitrary writer
    pub fn with_writer(receiver: mpsc::Receiver<Metric>, writer: impl Write + Send + 'static) -> Self {
        Self {
            receiver,
            name: "stdout".into(),
            writer: Box::new(writer),
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Set the sink name used in logs and metrics
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Get reference to metrics
    #[inline]
    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Get a metrics handle for reporting
    pub fn metrics_handle(&self) -> StdoutSinkMetricsHandle {
        StdoutSinkMetricsHandle {
            name: self.name.clone(),
            metrics: Arc::clone(&self.metrics),
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the sink until every sender is dropped
    ///
    /// Output is flushed whenever the queue runs empty and once more on exit.
    pub async fn run(mut self) -> SinkMetricsSnapshot {
        tracing::info!(sink = %self.name, "stdout sink starting");

        while let Some(metric) = self.receiver.recv().await {
            self.metrics.record_received();
            self.write_metric(&metric);

            if self.receiver.is_empty() {
                self.flush();
            }
        }
        self.flush();

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            sink = %self.name,
            metrics = snapshot.metrics_written,
            bytes = snapshot.bytes_written,
            errors = snapshot.write_errors,
            "stdout sink shutting down"
        );
        snapshot
    }

    fn write_metric(&mut self, metric: &Metric) {
        let mut line = metric.to_line_protocol();
        line.push('\n');

        match self.writer.write_all(line.as_bytes()) {
            Ok(()) => self.metrics.record_written(1, line.len() as u64),
            Err(e) => {
                self.metrics.record_error();
                tracing::warn!(sink = %self.name, error = %e, "failed to write metric");
            }
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.writer.flush() {
            self.metrics.record_error();
            tracing::warn!(sink = %self.name, error = %e, "failed to flush output");
        }
    }
}
