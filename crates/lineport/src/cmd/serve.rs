//! Serve command - run the listener
//!
//! Wires config → listener → channel → sink, with the metrics reporter
//! polling both ends, and shuts everything down in order on Ctrl-C/SIGTERM.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use lineport_config::Config;
use lineport_metrics::{MetricsReporter, SinkMetricsSnapshot};
use lineport_sinks::Sink;
use lineport_sources::{ChannelAccumulator, InfluxListener, InfluxListenerConfig};

use super::load_config;

/// Run the serve command
pub async fn run(config_path: Option<&Path>) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        config = %config_path.map(|p| p.display().to_string()).unwrap_or_else(|| "(default)".into()),
        "lineport starting"
    );

    let (config, loaded_from) = load_config(config_path)?;
    match loaded_from {
        Some(path) => info!(config = %path.display(), "using config file"),
        None => info!("no config file found, using defaults (:8186 → stdout)"),
    }

    let server = Server::start(&config).await?;
    wait_for_shutdown().await;
    info!("shutdown signal received");

    if let Err(e) = server.shutdown().await {
        error!(error = %e, "shutdown error");
        return Err(e);
    }

    info!("lineport shutdown complete");
    Ok(())
}

/// A running listener with its sink and reporter tasks
struct Server {
    pipeline: Pipeline,
    reporter: Reporter,
}

/// Listener feeding the sink task through the bounded queue
struct Pipeline {
    listener: InfluxListener,
    port: u16,
    sink: JoinHandle<SinkMetricsSnapshot>,
}

/// Periodic metrics reporter task
struct Reporter {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Server {
    async fn start(config: &Config) -> Result<Self> {
        let cancel = CancellationToken::new();

        let (accumulator, receiver) = ChannelAccumulator::channel(config.sink.queue_size);
        let sink = Sink::from_config(&config.sink, receiver);
        let sink_metrics = sink.metrics_handle();

        let listener_config = InfluxListenerConfig::from_listener(&config.listener);
        let mut listener = InfluxListener::new(listener_config, Arc::new(accumulator));

        let reporter = MetricsReporter::builder()
            .config(config.metrics.clone())
            .source(Arc::new(listener.metrics_handle()))
            .sink(sink_metrics)
            .build();

        // Bind before spawning anything so a failure leaves nothing behind
        let port = listener.start().await.context("failed to start listener")?;

        let sink = tokio::spawn(sink.run());
        let task = tokio::spawn(reporter.run(cancel.clone()));

        info!(
            port,
            sink = config.sink.sink_type.as_str(),
            queue_size = config.sink.queue_size,
            "lineport ready"
        );

        Ok(Self {
            pipeline: Pipeline {
                listener,
                port,
                sink,
            },
            reporter: Reporter { cancel, task },
        })
    }

    /// Drain the pipeline first so the reporter's final report sees
    /// every request and every sink write
    async fn shutdown(self) -> Result<SinkMetricsSnapshot> {
        let drained = self.pipeline.drain().await;
        self.reporter.stop().await;
        drained
    }
}

impl Pipeline {
    /// Stop accepting, finish in-flight requests, then drain the sink
    async fn drain(self) -> Result<SinkMetricsSnapshot> {
        let Self {
            mut listener,
            port,
            sink,
        } = self;

        info!(port, "stopping listener");
        let stopped = listener.stop().await;
        // Last sender goes with the listener; the sink sees the channel close
        drop(listener);

        let snapshot = sink.await.context("sink task failed")?;
        info!(
            metrics = snapshot.metrics_written,
            errors = snapshot.write_errors,
            "sink drained"
        );

        stopped.context("listener did not stop cleanly")?;
        Ok(snapshot)
    }
}

impl Reporter {
    /// Cancel and wait for the final report
    async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "metrics reporter task failed");
        }
    }
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
