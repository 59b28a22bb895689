//! HTTP response helpers
//!
//! Status codes, headers and bodies expected by InfluxDB 1.x clients.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::error::WriteError;

/// Version advertised to clients
pub const INFLUXDB_VERSION: &str = "1.0";

/// Challenge sent with 401 responses
pub const AUTH_CHALLENGE: &str = "Basic realm=\"Restricted\"";

const VERSION_HEADER: &str = "x-influxdb-version";
const ERROR_HEADER: &str = "x-influxdb-error";

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

#[derive(Serialize)]
struct VersionBody {
    version: &'static str,
}

/// JSON response carrying the InfluxDB version header
fn json(status: StatusCode, body: Vec<u8>) -> Response {
    let mut response = (status, body).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(VERSION_HEADER, HeaderValue::from_static(INFLUXDB_VERSION));
    response
}

/// Response for a `/write` that was not fully accepted
pub fn write_error(err: &WriteError) -> Response {
    let message = err.to_string();
    let body = serde_json::to_vec(&ErrorBody { error: &message }).unwrap_or_default();
    let mut response = json(err.status(), body);

    // Header values cannot carry control characters; keep the JSON body exact.
    let value = HeaderValue::from_str(&message)
        .or_else(|_| HeaderValue::from_str(&message.replace(|c: char| c.is_control(), " ")));
    if let Ok(value) = value {
        response.headers_mut().insert(ERROR_HEADER, value);
    }
    response
}

/// Fully accepted write
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Static answer for `/query`
pub fn query_results() -> Response {
    json(StatusCode::OK, br#"{"results":[]}"#.to_vec())
}

/// `/ping`, optionally with a version document
pub fn ping(verbose: bool) -> Response {
    if verbose {
        let body = serde_json::to_vec(&VersionBody {
            version: INFLUXDB_VERSION,
        })
        .unwrap_or_default();
        return json(StatusCode::OK, body);
    }
    let mut response = no_content();
    response
        .headers_mut()
        .insert(VERSION_HEADER, HeaderValue::from_static(INFLUXDB_VERSION));
    response
}

/// Plain text error in the style of Go's `http.Error`
fn plain(status: StatusCode, message: &'static str) -> Response {
    let mut response = (status, message).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    response
}

/// Unknown path
pub fn not_found() -> Response {
    plain(StatusCode::NOT_FOUND, "404 page not found\n")
}

/// Failed Basic auth
pub fn unauthorized() -> Response {
    let mut response = plain(StatusCode::UNAUTHORIZED, "Unauthorized\n");
    response
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(AUTH_CHALLENGE));
    response
}
