//! Listener runtime configuration
//!
//! Built from the `[listener]` section of the config file. Out-of-range
//! values are replaced with defaults here, once, before the listener starts.

use std::time::Duration;

use lineport_config::{
    DEFAULT_BUFFER_POOL_SIZE, DEFAULT_MAX_BODY_SIZE, DEFAULT_MAX_LINE_SIZE, DEFAULT_TIMEOUT,
    ListenerConfig,
};

/// Shortest timeout the listener accepts
const MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// TLS material locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsFiles {
    /// PEM certificate chain
    pub cert: String,
    /// PEM private key
    pub key: String,
    /// PEM bundles of client CAs; empty means no client verification
    pub allowed_cacerts: Vec<String>,
}

/// Basic auth credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Influx listener configuration
#[derive(Debug, Clone)]
pub struct InfluxListenerConfig {
    /// Source identifier used in metrics reports
    pub id: String,

    /// Address handed to `TcpListener::bind`
    pub address: String,

    /// Deadline for reading a request body
    pub read_timeout: Duration,

    /// Added to `read_timeout` to bound a whole request
    pub write_timeout: Duration,

    /// Largest accepted body, after decompression
    pub max_body_size: u64,

    /// Largest accepted line; also the size of each pooled buffer
    pub max_line_size: usize,

    /// Tag receiving the `db` query parameter
    pub database_tag: Option<String>,

    /// Basic auth credentials; `None` disables the gate
    pub credentials: Option<Credentials>,

    /// TLS material; `None` serves plain HTTP
    pub tls: Option<TlsFiles>,

    /// Idle buffers kept for reuse
    pub buffer_pool_size: usize,
}

impl Default for InfluxListenerConfig {
    fn default() -> Self {
        Self {
            id: "influxdb_listener".into(),
            address: "0.0.0.0:8186".into(),
            read_timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_TIMEOUT,
            max_body_size: DEFAULT_MAX_BODY_SIZE.as_u64(),
            max_line_size: DEFAULT_MAX_LINE_SIZE.as_usize(),
            database_tag: None,
            credentials: None,
            tls: None,
            buffer_pool_size: DEFAULT_BUFFER_POOL_SIZE,
        }
    }
}

impl InfluxListenerConfig {
    /// Build from the file configuration, applying defaults
    pub fn from_listener(config: &ListenerConfig) -> Self {
        let tls = match (&config.tls_cert, &config.tls_key) {
            (Some(cert), Some(key)) => Some(TlsFiles {
                cert: cert.clone(),
                key: key.clone(),
                allowed_cacerts: config.tls_allowed_cacerts.clone(),
            }),
            _ => None,
        };

        Self {
            address: config.bind_address(),
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            max_body_size: config.max_body_size.as_u64(),
            max_line_size: config.max_line_size.as_usize(),
            database_tag: config.database_tag().map(str::to_string),
            credentials: config.basic_auth().map(|(u, p)| Credentials {
                username: u.to_string(),
                password: p.to_string(),
            }),
            tls,
            buffer_pool_size: config.buffer_pool_size,
            ..Default::default()
        }
        .normalized()
    }

    /// Replace zero sizes and sub-second timeouts with defaults
    pub fn normalized(mut self) -> Self {
        if self.read_timeout < MIN_TIMEOUT {
            self.read_timeout = DEFAULT_TIMEOUT;
        }
        if self.write_timeout < MIN_TIMEOUT {
            self.write_timeout = DEFAULT_TIMEOUT;
        }
        if self.max_body_size == 0 {
            self.max_body_size = DEFAULT_MAX_BODY_SIZE.as_u64();
        }
        if self.max_line_size == 0 {
            self.max_line_size = DEFAULT_MAX_LINE_SIZE.as_usize();
        }
        if self.buffer_pool_size == 0 {
            self.buffer_pool_size = DEFAULT_BUFFER_POOL_SIZE;
        }
        self
    }

    /// Upper bound on a whole request
    pub fn request_timeout(&self) -> Duration {
        self.read_timeout + self.write_timeout
    }
}
