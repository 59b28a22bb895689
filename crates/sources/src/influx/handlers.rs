//! HTTP route handlers
//!
//! # Endpoints
//!
//! - `/write` - Line protocol ingestion (gated)
//! - `/query` - Static empty result for client connectivity checks (gated)
//! - `/ping` - Health check (never gated)
//! - anything else - 404 (gated)

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, Request, State};
use axum::http::{HeaderMap, Uri, header};
use axum::middleware::Next;
use axum::response::Response;
use lineport_protocol::Precision;
use tokio::time::Instant;

use super::body;
use super::config::Credentials;
use super::decode::ChunkDecoder;
use super::error::WriteError;
use super::frame::FrameReader;
use super::metrics::ListenerMetrics;
use super::pool::BufferPool;
use super::response;
use crate::Accumulator;

/// Source of the request time origin, in nanoseconds since the epoch
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Wall clock
pub fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0))
}

/// Shared state for handlers
pub struct ListenerState {
    pub metrics: Arc<ListenerMetrics>,
    pub pool: Arc<BufferPool>,
    pub accumulator: Arc<dyn Accumulator>,
    pub credentials: Option<Credentials>,
    pub database_tag: Option<String>,
    pub max_body_size: u64,
    pub read_timeout: Duration,
    pub clock: Clock,
}

/// Count every request on the way in and on the way out
pub async fn track_requests(
    State(metrics): State<Arc<ListenerMetrics>>,
    request: Request,
    next: Next,
) -> Response {
    metrics.requests_received.inc();
    let response = next.run(request).await;
    metrics.requests_served.inc();
    response
}

/// POST /write
pub async fn write(State(state): State<Arc<ListenerState>>, request: Request) -> Response {
    let response = match ingest(&state, request).await {
        Ok(()) => response::no_content(),
        Err(e) => response::write_error(&e),
    };
    state.metrics.writes_served.inc();
    response
}

/// Stream one request body through the framing loop
async fn ingest(state: &Arc<ListenerState>, request: Request) -> Result<(), WriteError> {
    let (parts, body) = request.into_parts();

    if content_length(&parts.headers).is_some_and(|len| len > state.max_body_size) {
        return Err(WriteError::TooLarge);
    }
    let now = (state.clock)();

    let db = query_param(&parts.uri, "db");
    let precision = query_param(&parts.uri, "precision");
    let gzip = parts
        .headers
        .get(header::CONTENT_ENCODING)
        .is_some_and(|v| v.as_bytes() == b"gzip");

    let deadline = Instant::now() + state.read_timeout;
    let pending = body::open(body, gzip, state.max_body_size, deadline);

    let mut decoder = ChunkDecoder::new(
        Precision::from_query(&precision),
        now,
        state.database_tag.clone().map(|tag| (tag, db)),
        Arc::clone(&state.accumulator),
        Arc::clone(&state.metrics),
    );
    let mut buf = state.pool.acquire();
    let metrics = Arc::clone(&state.metrics);

    tokio::task::spawn_blocking(move || {
        FrameReader::new(pending.into_reader()).run(&mut buf, &mut decoder, &metrics)
    })
    .await
    .map_err(|e| WriteError::ReadFailure(e.to_string()))?
}

/// GET /query
pub async fn query(State(state): State<Arc<ListenerState>>) -> Response {
    let response = response::query_results();
    state.metrics.queries_served.inc();
    response
}

/// GET /ping
pub async fn ping(State(state): State<Arc<ListenerState>>, uri: Uri) -> Response {
    let verbose = query_param(&uri, "verbose");
    let response = response::ping(!matches!(verbose.as_str(), "" | "0" | "false"));
    state.metrics.pings_served.inc();
    response
}

/// Fallback for unknown paths
pub async fn not_found(State(state): State<Arc<ListenerState>>) -> Response {
    let response = response::not_found();
    state.metrics.not_founds_served.inc();
    response
}

/// First value of `key` in the query string, empty when absent
///
/// Repeated keys keep their first value; a malformed query string reads as
/// empty.
fn query_param(uri: &Uri, key: &str) -> String {
    Query::<Vec<(String, String)>>::try_from_uri(uri)
        .ok()
        .and_then(|Query(pairs)| pairs.into_iter().find(|(k, _)| k == key))
        .map(|(_, v)| v)
        .unwrap_or_default()
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
