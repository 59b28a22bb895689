//! Basic auth gate
//!
//! Middleware placed in front of `/write`, `/query` and unknown paths.
//! Credentials are compared in constant time.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use subtle::ConstantTimeEq;
use tracing::debug;

use super::config::Credentials;
use super::handlers::ListenerState;
use super::response;

/// Reject requests without matching credentials
pub async fn require_basic_auth(
    State(state): State<Arc<ListenerState>>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(expected) = &state.credentials
        && !check(request.headers(), expected)
    {
        state.metrics.auth_failures.inc();
        debug!(path = %request.uri().path(), "basic auth rejected");
        return response::unauthorized();
    }
    next.run(request).await
}

/// Whether the request carries the expected credentials
pub fn check(headers: &HeaderMap, expected: &Credentials) -> bool {
    let Some((username, password)) = basic_credentials(headers) else {
        return false;
    };
    let user_ok = username.as_bytes().ct_eq(expected.username.as_bytes());
    let pass_ok = password.as_bytes().ct_eq(expected.password.as_bytes());
    (user_ok & pass_ok).into()
}

/// Decode an `Authorization: Basic` header into username and password
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
