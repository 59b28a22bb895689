//! Listener configuration
//!
//! Settings for the line protocol HTTP listener. Zero sizes and sub-second
//! timeouts are replaced with defaults by the listener itself when it is
//! built, so a partially filled section is always usable.

use serde::Deserialize;
use std::time::Duration;

use crate::size::ByteSize;

/// Default listen address (all interfaces)
pub const DEFAULT_SERVICE_ADDRESS: &str = ":8186";

/// Default read and write timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default maximum request body size
pub const DEFAULT_MAX_BODY_SIZE: ByteSize = ByteSize::mib(500);

/// Default maximum line size, which is also the per-request buffer size
pub const DEFAULT_MAX_LINE_SIZE: ByteSize = ByteSize::kib(64);

/// Default number of idle buffers kept for reuse
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 200;

/// HTTP listener configuration
///
/// # Example
///
/// ```toml
/// [listener]
/// service_address = ":8186"
/// read_timeout = "10s"
/// write_timeout = "10s"
/// max_body_size = "500MiB"
/// max_line_size = "64KiB"
/// database_tag = "database"
/// basic_username = "telegraf"
/// basic_password = "secret"
/// tls_cert = "/etc/lineport/cert.pem"
/// tls_key = "/etc/lineport/key.pem"
/// tls_allowed_cacerts = ["/etc/lineport/clientca.pem"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Listen address, `host:port` or `:port`
    pub service_address: String,

    /// Deadline for reading a request body
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,

    /// Added to `read_timeout` to bound a whole request
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,

    /// Largest accepted request body (after decompression)
    pub max_body_size: ByteSize,

    /// Largest accepted single line
    pub max_line_size: ByteSize,

    /// Tag that receives the `db` query parameter; empty disables it
    pub database_tag: String,

    /// Basic auth username; auth is enforced only with a password too
    pub basic_username: String,

    /// Basic auth password
    pub basic_password: String,

    /// PEM server certificate chain
    pub tls_cert: Option<String>,

    /// PEM server private key
    pub tls_key: Option<String>,

    /// PEM CA bundles used to verify client certificates
    pub tls_allowed_cacerts: Vec<String>,

    /// Idle buffers kept for reuse between requests
    pub buffer_pool_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            service_address: DEFAULT_SERVICE_ADDRESS.into(),
            read_timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_TIMEOUT,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_line_size: DEFAULT_MAX_LINE_SIZE,
            database_tag: String::new(),
            basic_username: String::new(),
            basic_password: String::new(),
            tls_cert: None,
            tls_key: None,
            tls_allowed_cacerts: Vec::new(),
            buffer_pool_size: DEFAULT_BUFFER_POOL_SIZE,
        }
    }
}

impl ListenerConfig {
    /// Address suitable for `TcpListener::bind`
    ///
    /// An empty host (`:8186`) binds all IPv4 interfaces.
    pub fn bind_address(&self) -> String {
        match self.service_address.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port),
            None => self.service_address.clone(),
        }
    }

    /// Configured database tag, if any
    pub fn database_tag(&self) -> Option<&str> {
        Some(self.database_tag.as_str()).filter(|t| !t.is_empty())
    }

    /// Basic auth credentials when both username and password are set
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        if self.basic_username.is_empty() || self.basic_password.is_empty() {
            return None;
        }
        Some((&self.basic_username, &self.basic_password))
    }

    /// Whether the listener serves TLS
    pub fn tls_enabled(&self) -> bool {
        self.tls_cert.is_some() && self.tls_key.is_some()
    }
}
