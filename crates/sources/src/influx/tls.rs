//! TLS serving
//!
//! Loads PEM material into a rustls `ServerConfig` and wraps a
//! `TcpListener` so `axum::serve` receives already-handshaken streams.
//! Handshakes run in their own tasks; a slow client never holds up accept.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rustls::RootCertStore;
use rustls::ServerConfig;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_rustls::TlsAcceptor;
use tokio_rustls::server::TlsStream;
use tracing::{debug, warn};

use super::config::TlsFiles;
use super::error::InfluxListenerError;

/// Upper bound on one TLS handshake
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Handshaken connections waiting for the server
const ACCEPT_QUEUE: usize = 64;

/// Build the server configuration from PEM files
pub fn server_config(files: &TlsFiles) -> Result<Arc<ServerConfig>, InfluxListenerError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let certs = load_certs(&files.cert)?;
    if certs.is_empty() {
        return Err(InfluxListenerError::Tls(format!(
            "no certificates found in {}",
            files.cert
        )));
    }
    let key_pem = read(&files.key)?;
    let key = PrivateKeyDer::from_pem_slice(&key_pem)
        .map_err(|e| InfluxListenerError::Tls(format!("{}: {}", files.key, e)))?;

    let builder = ServerConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| InfluxListenerError::Tls(e.to_string()))?;

    let builder = if files.allowed_cacerts.is_empty() {
        builder.with_no_client_auth()
    } else {
        builder.with_client_cert_verifier(client_verifier(&files.allowed_cacerts, provider)?)
    };

    let mut config = builder
        .with_single_cert(certs, key)
        .map_err(|e| InfluxListenerError::Tls(e.to_string()))?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

fn client_verifier(
    paths: &[String],
    provider: Arc<CryptoProvider>,
) -> Result<Arc<dyn rustls::server::danger::ClientCertVerifier>, InfluxListenerError> {
    let mut roots = RootCertStore::empty();
    for path in paths {
        for cert in load_certs(path)? {
            roots
                .add(cert)
                .map_err(|e| InfluxListenerError::Tls(format!("{}: {}", path, e)))?;
        }
    }
    WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider)
        .build()
        .map_err(|e| InfluxListenerError::Tls(e.to_string()))
}

fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>, InfluxListenerError> {
    let pem = read(path)?;
    CertificateDer::pem_slice_iter(&pem)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| InfluxListenerError::Tls(format!("{}: {}", path, e)))
}

fn read(path: &str) -> Result<Vec<u8>, InfluxListenerError> {
    std::fs::read(path).map_err(|e| InfluxListenerError::TlsFile {
        path: path.to_string(),
        source: e,
    })
}

/// Listener yielding TLS streams to `axum::serve`
pub struct TlsListener {
    rx: mpsc::Receiver<(TlsStream<TcpStream>, SocketAddr)>,
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl TlsListener {
    /// Start accepting and handshaking on `listener`
    pub fn new(listener: TcpListener, config: Arc<ServerConfig>) -> io::Result<Self> {
        let local_addr = listener.local_addr()?;
        let (tx, rx) = mpsc::channel(ACCEPT_QUEUE);
        let task = tokio::spawn(accept_loop(listener, TlsAcceptor::from(config), tx));
        Ok(Self {
            rx,
            local_addr,
            task,
        })
    }
}

impl Drop for TlsListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl axum::serve::Listener for TlsListener {
    type Io = TlsStream<TcpStream>;
    type Addr = SocketAddr;

    async fn accept(&mut self) -> (Self::Io, Self::Addr) {
        match self.rx.recv().await {
            Some(conn) => conn,
            // accept loop gone; serve stops through its shutdown signal
            None => std::future::pending().await,
        }
    }

    fn local_addr(&self) -> io::Result<Self::Addr> {
        Ok(self.local_addr)
    }
}

async fn accept_loop(
    listener: TcpListener,
    acceptor: TlsAcceptor,
    tx: mpsc::Sender<(TlsStream<TcpStream>, SocketAddr)>,
) {
    while !tx.is_closed() {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "accept failed");
                tokio::time::sleep(Duration::from_millis(50)).await;
                continue;
            }
        };

        let acceptor = acceptor.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            match tokio::time::timeout(HANDSHAKE_TIMEOUT, acceptor.accept(stream)).await {
                Ok(Ok(tls)) => {
                    if tx.send((tls, peer)).await.is_err() {
                        debug!(peer = %peer, "listener closed during handshake");
                    }
                }
                Ok(Err(e)) => warn!(peer = %peer, error = %e, "TLS handshake failed"),
                Err(_) => warn!(peer = %peer, "TLS handshake timed out"),
            }
        });
    }
}
