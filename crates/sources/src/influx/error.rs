//! Listener error types

use axum::http::StatusCode;

/// Message used when the body exceeds the configured maximum
pub const BODY_TOO_LARGE: &str = "http: request body too large";

/// Message used when a rejected request has no more specific error
pub const BAD_REQUEST: &str = "http: bad request";

/// Listener lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum InfluxListenerError {
    /// Failed to bind to address
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Could not read a TLS file
    #[error("failed to read {path}: {source}")]
    TlsFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TLS material present but unusable
    #[error("invalid TLS configuration: {0}")]
    Tls(String),

    /// Listener already started
    #[error("listener already started")]
    AlreadyStarted,

    /// Server task failed
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// Outcome of a `/write` request that was not fully accepted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    /// Declared length exceeds the maximum body size
    #[error("{}", BODY_TOO_LARGE)]
    TooLarge,

    /// Body could not be read or decompressed
    #[error("{0}")]
    ReadFailure(String),

    /// Final chunk decoded with errors but produced metrics
    #[error("{0}")]
    Partial(String),

    /// Final chunk failed without producing metrics
    #[error("{0}")]
    Unparsable(String),

    /// An earlier chunk or an over-length line failed the request
    #[error("{}", BAD_REQUEST)]
    Rejected,
}

impl WriteError {
    /// HTTP status for this outcome
    pub fn status(&self) -> StatusCode {
        match self {
            Self::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Create a read failure from an I/O error
    pub fn read_failure(err: &std::io::Error) -> Self {
        let message = err.to_string();
        if message.is_empty() {
            Self::ReadFailure(BAD_REQUEST.into())
        } else {
            Self::ReadFailure(message)
        }
    }
}
