//! Influx listener tests

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use lineport_metrics::SourceMetricsProvider;
use lineport_protocol::Metric;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::Receiver;
use tower::ServiceExt;

use super::handlers::ListenerState;
use super::*;
use crate::ChannelAccumulator;

/// Router plus the pieces tests inspect
struct TestContext {
    app: Router,
    metrics: Arc<ListenerMetrics>,
    rx: Receiver<Metric>,
}

impl TestContext {
    fn new(config: InfluxListenerConfig) -> Self {
        Self::with_clock(config, Arc::new(|| 0))
    }

    fn with_clock(config: InfluxListenerConfig, clock: Clock) -> Self {
        let config = config.normalized();
        let request_timeout = config.request_timeout();
        Self::build(config, clock, request_timeout)
    }

    fn build(config: InfluxListenerConfig, clock: Clock, request_timeout: Duration) -> Self {
        let (acc, rx) = ChannelAccumulator::channel(1024);
        let metrics = Arc::new(ListenerMetrics::new());
        let state = Arc::new(ListenerState {
            metrics: Arc::clone(&metrics),
            pool: Arc::new(BufferPool::new(4, config.max_line_size)),
            accumulator: Arc::new(acc),
            credentials: config.credentials.clone(),
            database_tag: config.database_tag.clone(),
            max_body_size: config.max_body_size,
            read_timeout: config.read_timeout,
            clock,
        });
        Self {
            app: build_router(state, request_timeout),
            metrics,
            rx,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    fn received(&mut self) -> Vec<Metric> {
        let mut out = Vec::new();
        while let Ok(m) = self.rx.try_recv() {
            out.push(m);
        }
        out
    }
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(body.into())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn with_auth() -> InfluxListenerConfig {
    InfluxListenerConfig {
        credentials: Some(Credentials {
            username: "telegraf".into(),
            password: "secret".into(),
        }),
        ..Default::default()
    }
}

fn basic(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)))
}

// =============================================================================
// /write
// =============================================================================

#[tokio::test]
async fn test_write_accepts_batch() {
    let mut ctx = TestContext::new(InfluxListenerConfig::default());

    let response = ctx
        .send(post("/write?db=mydb", "cpu,host=a value=1 10\nmem free=2i 20\n"))
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let metrics = ctx.received();
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0].name, "cpu");
    assert_eq!(metrics[0].tag("host"), Some("a"));
    assert_eq!(metrics[1].timestamp, 20);

    let s = ctx.metrics.snapshot();
    assert_eq!(s.writes_served, 1);
    assert_eq!(s.requests_received, 1);
    assert_eq!(s.requests_served, 1);
    assert_eq!(s.metrics_forwarded, 2);
    assert_eq!(s.bytes_received, 37);
}

#[tokio::test]
async fn test_write_many_lines_across_refills() {
    let mut ctx = TestContext::new(InfluxListenerConfig {
        max_line_size: 64,
        ..Default::default()
    });
    let body: String = (0..500).map(|i| format!("m,i={} v={}i {}\n", i, i, i)).collect();

    let response = ctx.send(post("/write", body)).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let metrics = ctx.received();
    assert_eq!(metrics.len(), 500);
    for (i, m) in metrics.iter().enumerate() {
        assert_eq!(m.timestamp, i as i64);
    }
}

#[tokio::test]
async fn test_write_declared_length_too_large() {
    let mut ctx = TestContext::new(InfluxListenerConfig {
        max_body_size: 16,
        ..Default::default()
    });
    let request = Request::builder()
        .method("POST")
        .uri("/write")
        .header("content-length", "17")
        .body(Body::from("cpu value=1 1234\n"))
        .unwrap();

    let response = ctx.send(request).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.headers()["x-influxdb-error"], "http: request body too large");
    assert_eq!(
        body_string(response).await,
        r#"{"error":"http: request body too large"}"#
    );
    assert!(ctx.received().is_empty());
    assert_eq!(ctx.metrics.bytes_received.get(), 0);
}

#[tokio::test]
async fn test_write_streamed_body_too_large() {
    let ctx = TestContext::new(InfluxListenerConfig {
        max_body_size: 16,
        ..Default::default()
    });

    let response = ctx.send(post("/write", "cpu value=1 1\ncpu value=2 2\n")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_string(response).await,
        r#"{"error":"http: request body too large"}"#
    );
}

#[tokio::test]
async fn test_write_gzip() {
    let mut ctx = TestContext::new(InfluxListenerConfig::default());
    let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(b"cpu value=1 1\ncpu value=2 2\n").unwrap();
    let request = Request::builder()
        .method("POST")
        .uri("/write")
        .header("content-encoding", "gzip")
        .body(Body::from(enc.finish().unwrap()))
        .unwrap();

    let response = ctx.send(request).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(ctx.received().len(), 2);
    // counted after decompression
    assert_eq!(ctx.metrics.bytes_received.get(), 28);
}

#[tokio::test]
async fn test_write_invalid_gzip() {
    let ctx = TestContext::new(InfluxListenerConfig::default());
    let request = Request::builder()
        .method("POST")
        .uri("/write")
        .header("content-encoding", "gzip")
        .body(Body::from("cpu value=1 1\n"))
        .unwrap();

    let response = ctx.send(request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["content-type"], "application/json");
}

#[tokio::test]
async fn test_write_partial() {
    let mut ctx = TestContext::new(InfluxListenerConfig::default());

    let response = ctx
        .send(post("/write", "cpu value=1 1\ncpu value=\ncpu value=3 3\n"))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let header = response.headers()["x-influxdb-error"].to_str().unwrap().to_string();
    assert!(header.starts_with("partial write: unable to parse: "), "{}", header);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["error"], header.as_str());

    // good lines still delivered
    assert_eq!(ctx.received().len(), 2);
    assert_eq!(ctx.metrics.parse_errors.get(), 1);
}

#[tokio::test]
async fn test_write_unparsable() {
    let mut ctx = TestContext::new(InfluxListenerConfig::default());

    let response = ctx.send(post("/write", "not line protocol\n")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.starts_with(r#"{"error":"unable to parse: "#), "{}", body);
    assert!(ctx.received().is_empty());
}

#[tokio::test]
async fn test_write_long_line() {
    let mut ctx = TestContext::new(InfluxListenerConfig {
        max_line_size: 32,
        ..Default::default()
    });
    let body = format!(
        "cpu value=1 1\ncpu,host={} value=2 2\ncpu value=3 3\n",
        "x".repeat(64)
    );

    let response = ctx.send(post("/write", body)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_string(response).await,
        r#"{"error":"http: bad request"}"#
    );
    let metrics = ctx.received();
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[1].timestamp, 3);
    assert_eq!(ctx.metrics.long_lines.get(), 1);
}

#[tokio::test]
async fn test_write_precision() {
    let mut ctx = TestContext::new(InfluxListenerConfig::default());

    ctx.send(post("/write?precision=s", "cpu value=1 5\n")).await;
    ctx.send(post("/write", "cpu value=1 5\n")).await;
    ctx.send(post("/write?precision=ms", "cpu value=1 5\n")).await;

    let ts: Vec<i64> = ctx.received().iter().map(|m| m.timestamp).collect();
    assert_eq!(ts, vec![5_000_000_000, 5, 5_000_000]);
}

#[tokio::test]
async fn test_write_missing_timestamp_uses_request_time() {
    let clock: Clock = Arc::new(|| 1_700_000_000_123_456_789);
    let mut ctx = TestContext::with_clock(InfluxListenerConfig::default(), clock);

    ctx.send(post("/write", "cpu value=1\n")).await;
    ctx.send(post("/write?precision=s", "cpu value=1\n")).await;

    let ts: Vec<i64> = ctx.received().iter().map(|m| m.timestamp).collect();
    assert_eq!(ts, vec![1_700_000_000_123_456_789, 1_700_000_000_000_000_000]);
}

#[tokio::test]
async fn test_write_database_tag() {
    let mut ctx = TestContext::new(InfluxListenerConfig {
        database_tag: Some("database".into()),
        ..Default::default()
    });

    ctx.send(post("/write?db=mydb", "cpu,database=other value=1 1\nmem value=2 2\n"))
        .await;
    ctx.send(post("/write", "disk value=3 3\n")).await;

    let metrics = ctx.received();
    assert_eq!(metrics[0].tag("database"), Some("mydb"));
    assert_eq!(metrics[1].tag("database"), Some("mydb"));
    assert_eq!(metrics[2].tag("database"), None);
}

#[tokio::test]
async fn test_write_repeated_params_use_first_value() {
    let mut ctx = TestContext::new(InfluxListenerConfig {
        database_tag: Some("database".into()),
        ..Default::default()
    });

    let response = ctx
        .send(post("/write?db=a&db=b&precision=s&precision=ms", "cpu value=1 5
"))
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let metrics = ctx.received();
    assert_eq!(metrics[0].tag("database"), Some("a"));
    assert_eq!(metrics[0].timestamp, 5_000_000_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_write_stalled_body_times_out() {
    let config = InfluxListenerConfig {
        read_timeout: Duration::from_millis(500),
        ..Default::default()
    };
    let ctx = TestContext::build(config, Arc::new(|| 0), Duration::from_millis(50));

    let stalled = Body::from_stream(futures_util::stream::pending::<std::io::Result<Bytes>>());
    let response = ctx.send(post("/write", stalled)).await;
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
}

#[tokio::test]
async fn test_write_db_ignored_without_tag_name() {
    let mut ctx = TestContext::new(InfluxListenerConfig::default());

    ctx.send(post("/write?db=mydb", "cpu value=1 1\n")).await;

    assert!(ctx.received()[0].tags.is_empty());
}

// =============================================================================
// /query, /ping, fallback
// =============================================================================

#[tokio::test]
async fn test_query() {
    let ctx = TestContext::new(InfluxListenerConfig::default());

    let response = ctx.send(get("/query?q=show%20databases")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert_eq!(response.headers()["x-influxdb-version"], "1.0");
    assert_eq!(body_string(response).await, r#"{"results":[]}"#);
    assert_eq!(ctx.metrics.queries_served.get(), 1);
}

#[tokio::test]
async fn test_ping() {
    let ctx = TestContext::new(InfluxListenerConfig::default());

    let response = ctx.send(get("/ping")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_string(response).await.is_empty());

    for quiet in ["/ping?verbose=0", "/ping?verbose=false", "/ping?verbose="] {
        assert_eq!(ctx.send(get(quiet)).await.status(), StatusCode::NO_CONTENT, "{}", quiet);
    }

    let response = ctx.send(get("/ping?verbose=true")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"version":"1.0"}"#);

    assert_eq!(ctx.metrics.pings_served.get(), 5);
}

#[tokio::test]
async fn test_unknown_path() {
    let ctx = TestContext::new(InfluxListenerConfig::default());

    let response = ctx.send(get("/api/v2/write")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "404 page not found\n");
    let s = ctx.metrics.snapshot();
    assert_eq!(s.not_founds_served, 1);
    assert_eq!(s.requests_served, 1);
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_auth_accepts_correct_credentials() {
    let mut ctx = TestContext::new(with_auth());
    let request = Request::builder()
        .method("POST")
        .uri("/write")
        .header("authorization", basic("telegraf", "secret"))
        .body(Body::from("cpu value=1 1\n"))
        .unwrap();

    assert_eq!(ctx.send(request).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(ctx.received().len(), 1);
    assert_eq!(ctx.metrics.auth_failures.get(), 0);
}

#[tokio::test]
async fn test_auth_rejects_wrong_password() {
    let mut ctx = TestContext::new(with_auth());
    let request = Request::builder()
        .method("POST")
        .uri("/write")
        .header("authorization", basic("telegraf", "secreT"))
        .body(Body::from("cpu value=1 1\n"))
        .unwrap();

    let response = ctx.send(request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers()["www-authenticate"],
        "Basic realm=\"Restricted\""
    );
    assert!(ctx.received().is_empty());
    let s = ctx.metrics.snapshot();
    assert_eq!(s.auth_failures, 1);
    assert_eq!(s.writes_served, 0);
    assert_eq!(s.requests_served, 1);
}

#[tokio::test]
async fn test_auth_gates_query_and_fallback() {
    let ctx = TestContext::new(with_auth());

    assert_eq!(ctx.send(get("/query")).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.send(get("/nope")).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(ctx.metrics.auth_failures.get(), 2);
    assert_eq!(ctx.metrics.not_founds_served.get(), 0);
}

#[tokio::test]
async fn test_ping_is_never_gated() {
    let ctx = TestContext::new(with_auth());

    assert_eq!(ctx.send(get("/ping")).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(ctx.metrics.auth_failures.get(), 0);
}

// =============================================================================
// Lifecycle
// =============================================================================

fn local_config() -> InfluxListenerConfig {
    InfluxListenerConfig {
        address: "127.0.0.1:0".into(),
        ..Default::default()
    }
}

async fn send_raw(port: u16, request: &str) -> String {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8_lossy(&out).into_owned()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_start_write_stop() {
    let (acc, mut rx) = ChannelAccumulator::channel(16);
    let mut listener = InfluxListener::new(local_config(), Arc::new(acc));
    let handle = listener.metrics_handle();

    let port = listener.start().await.unwrap();
    assert_eq!(listener.port(), Some(port));

    let body = "cpu value=1 1\n";
    let response = send_raw(
        port,
        &format!(
            "POST /write HTTP/1.1\r\nHost: localhost\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 204"), "{}", response);
    assert_eq!(rx.recv().await.unwrap().name, "cpu");

    let snapshot = handle.snapshot();
    assert_eq!(snapshot.buffers_created, 1);
    assert_eq!(snapshot.writes_served, 1);

    listener.stop().await.unwrap();
    assert_eq!(listener.port(), None);
    assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_start_twice() {
    let (acc, _rx) = ChannelAccumulator::channel(16);
    let mut listener = InfluxListener::new(local_config(), Arc::new(acc));

    listener.start().await.unwrap();
    assert!(matches!(
        listener.start().await,
        Err(InfluxListenerError::AlreadyStarted)
    ));
    listener.stop().await.unwrap();
    // stopping again is a no-op
    listener.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bind_conflict() {
    let (acc, _rx) = ChannelAccumulator::channel(16);
    let acc: Arc<dyn crate::Accumulator> = Arc::new(acc);
    let mut first = InfluxListener::new(local_config(), Arc::clone(&acc));
    let port = first.start().await.unwrap();

    let mut second = InfluxListener::new(
        InfluxListenerConfig {
            address: format!("127.0.0.1:{}", port),
            ..Default::default()
        },
        acc,
    );
    assert!(matches!(
        second.start().await,
        Err(InfluxListenerError::Bind { .. })
    ));
    first.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_until_cancelled() {
    let (acc, _rx) = ChannelAccumulator::channel(16);
    let listener = InfluxListener::new(local_config(), Arc::new(acc));
    let cancel = tokio_util::sync::CancellationToken::new();

    let task = tokio::spawn(listener.run(cancel.clone()));
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    cancel.cancel();

    task.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tls_ping() {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".into()]).unwrap();
    let cert_file = tempfile::NamedTempFile::new().unwrap();
    let key_file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(cert_file.path(), cert.pem()).unwrap();
    std::fs::write(key_file.path(), key_pair.serialize_pem()).unwrap();

    let (acc, _rx) = ChannelAccumulator::channel(16);
    let mut listener = InfluxListener::new(
        InfluxListenerConfig {
            tls: Some(TlsFiles {
                cert: cert_file.path().display().to_string(),
                key: key_file.path().display().to_string(),
                allowed_cacerts: Vec::new(),
            }),
            ..local_config()
        },
        Arc::new(acc),
    );
    let port = listener.start().await.unwrap();

    let mut roots = rustls::RootCertStore::empty();
    roots.add(cert.der().clone()).unwrap();
    let client = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_root_certificates(roots)
    .with_no_client_auth();
    let connector = tokio_rustls::TlsConnector::from(Arc::new(client));

    let tcp = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    let name = rustls::pki_types::ServerName::try_from("localhost").unwrap();
    let mut stream = connector.connect(name, tcp).await.unwrap();
    stream
        .write_all(b"GET /ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut out = Vec::new();
    // peers may skip close_notify; the response is all that matters
    let _ = stream.read_to_end(&mut out).await;
    let response = String::from_utf8_lossy(&out);
    assert!(response.starts_with("HTTP/1.1 204"), "{}", response);

    listener.stop().await.unwrap();
}
