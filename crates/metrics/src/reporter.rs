//! Periodic metrics reporter
//!
//! Polls every registered provider at the configured interval and logs the
//! formatted result through `tracing`. Polling a provider is what refreshes
//! its derived counters, so this task is also the listener's observability
//! hook for the buffer pool's created-count.

use crate::{
    CollectedMetrics, CollectedSink, CollectedSource, HumanFormatter, JsonFormatter,
    SinkMetricsProvider, SourceMetricsProvider, format::MetricsFormatter,
};
use lineport_config::{MetricsConfig, MetricsFormat};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Builder for constructing a MetricsReporter
#[derive(Default)]
pub struct MetricsReporterBuilder {
    config: Option<MetricsConfig>,
    sources: Vec<Arc<dyn SourceMetricsProvider>>,
    sinks: Vec<Arc<dyn SinkMetricsProvider>>,
}

impl MetricsReporterBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the metrics configuration
    pub fn config(mut self, config: MetricsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Register a source metrics provider
    pub fn source(mut self, provider: Arc<dyn SourceMetricsProvider>) -> Self {
        self.sources.push(provider);
        self
    }

    /// Register a sink metrics provider
    pub fn sink(mut self, provider: Arc<dyn SinkMetricsProvider>) -> Self {
        self.sinks.push(provider);
        self
    }

    /// Build the MetricsReporter
    pub fn build(self) -> MetricsReporter {
        let config = self.config.unwrap_or_default();
        let formatter: Box<dyn MetricsFormatter> = match config.format {
            MetricsFormat::Human => Box::new(HumanFormatter::new()),
            MetricsFormat::Json => Box::new(JsonFormatter::new()),
        };

        MetricsReporter {
            config,
            formatter,
            sources: self.sources,
            sinks: self.sinks,
            previous: None,
        }
    }
}

/// Periodic metrics reporter
pub struct MetricsReporter {
    config: MetricsConfig,
    formatter: Box<dyn MetricsFormatter>,
    sources: Vec<Arc<dyn SourceMetricsProvider>>,
    sinks: Vec<Arc<dyn SinkMetricsProvider>>,
    previous: Option<CollectedMetrics>,
}

impl MetricsReporter {
    /// Create a new builder
    pub fn builder() -> MetricsReporterBuilder {
        MetricsReporterBuilder::new()
    }

    /// Run the reporter until cancellation
    ///
    /// Reports once per interval, starting immediately, and once more on
    /// cancellation so counters from the last partial interval are not lost.
    pub async fn run(mut self, cancel: CancellationToken) {
        if !self.config.enabled {
            info!("metrics reporting disabled");
            return;
        }

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(
            interval = ?self.config.interval,
            format = ?self.config.format,
            sources = self.sources.len(),
            sinks = self.sinks.len(),
            "metrics reporter started"
        );

        while !cancel.is_cancelled() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => self.report(),
                _ = ticker.tick() => self.report(),
            }
        }

        info!("metrics reporter shutting down");
    }

    fn report(&mut self) {
        let metrics = self.collect();
        let rates = match &self.previous {
            Some(prev) => metrics.rates(prev),
            None => None,
        };

        for line in self.formatter.format_report(&metrics, rates.as_ref()).lines() {
            info!("{}", line);
        }
        self.previous = Some(metrics);
    }

    /// Collect metrics from all registered providers
    fn collect(&self) -> CollectedMetrics {
        let mut metrics = CollectedMetrics {
            timestamp: Some(Instant::now()),
            ..Default::default()
        };

        if self.config.include_listener {
            metrics.sources = self
                .sources
                .iter()
                .map(|s| CollectedSource {
                    id: s.source_id().to_string(),
                    source_type: s.source_type().to_string(),
                    snapshot: s.snapshot(),
                })
                .collect();
        }

        if self.config.include_sink {
            metrics.sinks = self
                .sinks
                .iter()
                .map(|s| CollectedSink {
                    id: s.sink_id().to_string(),
                    sink_type: s.sink_type().to_string(),
                    snapshot: s.snapshot(),
                })
                .collect();
        }

        metrics
    }
}
