//! InfluxDB line protocol listener
//!
//! Accepts InfluxDB 1.x `/write` requests over HTTP or HTTPS and forwards
//! every decoded metric to an `Accumulator`.
//!
//! # Endpoints
//!
//! ```text
//! POST /write?db=<name>&precision=<ns|u|ms|s|m|h>   204 | 400 | 413
//! ANY  /query                                       200 {"results":[]}
//! ANY  /ping[?verbose=true]                         204 | 200 {"version":"1.0"}
//! ANY  <other>                                      404
//! ```
//!
//! Everything except `/ping` sits behind the optional Basic auth gate.
//!
//! # Memory
//!
//! Each `/write` borrows one `max_line_size` buffer from a shared pool and
//! streams the body through it (see `frame`), so memory per request is
//! fixed no matter how large the body is. Lines longer than the buffer are
//! dropped and counted.
//!
//! # Example
//!
//! ```ignore
//! let (acc, rx) = ChannelAccumulator::channel(10_000);
//! let mut listener = InfluxListener::new(InfluxListenerConfig::default(), Arc::new(acc));
//! let port = listener.start().await?;
//! // ...
//! listener.stop().await?;
//! ```

mod auth;
mod body;
mod config;
mod decode;
mod error;
mod frame;
mod handlers;
mod metrics;
mod pool;
mod response;
mod tls;

#[cfg(test)]
mod influx_test;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::any;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;

pub use config::{Credentials, InfluxListenerConfig, TlsFiles};
pub use decode::{ChunkDecoder, DecodeError, RecordSink};
pub use error::{InfluxListenerError, WriteError};
pub use frame::{FrameCursor, FrameReader, FrameState, Transition};
pub use handlers::{Clock, system_clock};
pub use metrics::{ListenerMetrics, ListenerMetricsHandle};
pub use pool::{BufferPool, PooledBuffer};

use handlers::ListenerState;
use tls::TlsListener;

use crate::Accumulator;

struct Running {
    port: u16,
    cancel: CancellationToken,
    task: JoinHandle<std::io::Result<()>>,
}

/// Line protocol HTTP listener
pub struct InfluxListener {
    config: InfluxListenerConfig,
    accumulator: Arc<dyn Accumulator>,
    metrics: Arc<ListenerMetrics>,
    pool: Arc<BufferPool>,
    clock: Clock,
    running: Option<Running>,
}

impl InfluxListener {
    /// Create a listener; out-of-range settings are replaced with defaults
    pub fn new(config: InfluxListenerConfig, accumulator: Arc<dyn Accumulator>) -> Self {
        let config = config.normalized();
        let pool = Arc::new(BufferPool::new(config.buffer_pool_size, config.max_line_size));
        Self {
            config,
            accumulator,
            metrics: Arc::new(ListenerMetrics::new()),
            pool,
            clock: system_clock(),
            running: None,
        }
    }

    /// Replace the clock that supplies each request's time origin
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Effective configuration
    pub fn config(&self) -> &InfluxListenerConfig {
        &self.config
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &ListenerMetrics {
        &self.metrics
    }

    /// Get a metrics handle for reporting
    pub fn metrics_handle(&self) -> ListenerMetricsHandle {
        ListenerMetricsHandle::new(
            self.config.id.clone(),
            Arc::clone(&self.metrics),
            Arc::clone(&self.pool),
        )
    }

    /// Bound port while running
    pub fn port(&self) -> Option<u16> {
        self.running.as_ref().map(|r| r.port)
    }

    /// Bind and serve in a background task, returning the bound port
    pub async fn start(&mut self) -> Result<u16, InfluxListenerError> {
        if self.running.is_some() {
            return Err(InfluxListenerError::AlreadyStarted);
        }

        let tls = self.config.tls.as_ref().map(tls::server_config).transpose()?;

        let address = self.config.address.clone();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| InfluxListenerError::Bind {
                address: address.clone(),
                source: e,
            })?;
        let port = listener.local_addr()?.port();

        let app = build_router(self.state(), self.config.request_timeout());
        let cancel = CancellationToken::new();
        let shutdown = shutdown_signal(cancel.clone());

        let task = match tls {
            Some(tls) => {
                let listener = TlsListener::new(listener, tls)?;
                tokio::spawn(async move {
                    axum::serve(listener, app).with_graceful_shutdown(shutdown).await
                })
            }
            None => tokio::spawn(async move {
                axum::serve(listener, app).with_graceful_shutdown(shutdown).await
            }),
        };

        tracing::info!(
            source_id = %self.config.id,
            address = %address,
            port,
            tls = self.config.tls.is_some(),
            "influx listener started"
        );

        self.running = Some(Running { port, cancel, task });
        Ok(port)
    }

    /// Close the listener and wait for in-flight requests to finish
    pub async fn stop(&mut self) -> Result<(), InfluxListenerError> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        running.cancel.cancel();

        let result = running
            .task
            .await
            .map_err(|e| InfluxListenerError::Server(std::io::Error::other(e)))?;

        tracing::info!(
            source_id = %self.config.id,
            address = %self.config.address,
            "influx listener stopped"
        );
        result.map_err(InfluxListenerError::Server)
    }

    /// Serve until `cancel` fires
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), InfluxListenerError> {
        self.start().await?;
        cancel.cancelled().await;
        self.stop().await
    }

    fn state(&self) -> Arc<ListenerState> {
        Arc::new(ListenerState {
            metrics: Arc::clone(&self.metrics),
            pool: Arc::clone(&self.pool),
            accumulator: Arc::clone(&self.accumulator),
            credentials: self.config.credentials.clone(),
            database_tag: self.config.database_tag.clone(),
            max_body_size: self.config.max_body_size,
            read_timeout: self.config.read_timeout,
            clock: Arc::clone(&self.clock),
        })
    }
}

/// Build the axum router
fn build_router(state: Arc<ListenerState>, request_timeout: Duration) -> Router {
    let gated = Router::new()
        .route("/write", any(handlers::write))
        .route("/query", any(handlers::query))
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_basic_auth,
        ));

    gated
        .merge(Router::new().route("/ping", any(handlers::ping)))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.metrics),
            handlers::track_requests,
        ))
        .with_state(state)
}

/// Shutdown signal future
async fn shutdown_signal(cancel: CancellationToken) {
    cancel.cancelled().await;
}
