//! Configuration validation
//!
//! Checks that cannot be expressed in the serde types:
//! - The service address has a numeric port
//! - TLS certificate and key are given together
//! - Client CA verification requires a server certificate
//! - Queue sizes and reporting intervals are non-zero

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::listener::ListenerConfig;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_listener(&config.listener)?;

    if config.sink.queue_size == 0 {
        return Err(ConfigError::invalid_value("sink", "queue_size", "must be greater than 0"));
    }

    if config.metrics.enabled && config.metrics.interval.is_zero() {
        return Err(ConfigError::invalid_value("metrics", "interval", "must be greater than 0"));
    }

    Ok(())
}

fn validate_listener(listener: &ListenerConfig) -> Result<()> {
    validate_address(&listener.service_address)?;

    match (&listener.tls_cert, &listener.tls_key) {
        (Some(_), None) => return Err(ConfigError::missing_field("listener", "tls_key")),
        (None, Some(_)) => return Err(ConfigError::missing_field("listener", "tls_cert")),
        _ => {}
    }

    if !listener.tls_allowed_cacerts.is_empty() && !listener.tls_enabled() {
        return Err(ConfigError::invalid_value(
            "listener",
            "tls_allowed_cacerts",
            "client verification requires tls_cert and tls_key",
        ));
    }

    Ok(())
}

fn validate_address(address: &str) -> Result<()> {
    let Some((_, port)) = address.rsplit_once(':') else {
        return Err(ConfigError::invalid_value(
            "listener",
            "service_address",
            format!("'{}' must be host:port or :port", address),
        ));
    };

    port.parse::<u16>().map_err(|_| {
        ConfigError::invalid_value(
            "listener",
            "service_address",
            format!("invalid port '{}'", port),
        )
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_valid_addresses() {
        for addr in [":8186", "0.0.0.0:0", "localhost:9000", "[::1]:8186"] {
            assert!(validate_address(addr).is_ok(), "{}", addr);
        }
    }

    #[test]
    fn test_invalid_addresses() {
        for addr in ["8186", "host:", "host:http", ":70000"] {
            assert!(validate_address(addr).is_err(), "{}", addr);
        }
    }

    #[test]
    fn test_cert_without_key() {
        let err = Config::from_str("[listener]\ntls_cert = \"cert.pem\"").unwrap_err();
        assert!(err.to_string().contains("tls_key"));
    }

    #[test]
    fn test_key_without_cert() {
        let err = Config::from_str("[listener]\ntls_key = \"key.pem\"").unwrap_err();
        assert!(err.to_string().contains("tls_cert"));
    }

    #[test]
    fn test_cacerts_without_tls() {
        let err = Config::from_str("[listener]\ntls_allowed_cacerts = [\"ca.pem\"]").unwrap_err();
        assert!(err.to_string().contains("tls_allowed_cacerts"));
    }

    #[test]
    fn test_zero_queue_size() {
        let err = Config::from_str("[sink]\nqueue_size = 0").unwrap_err();
        assert!(err.to_string().contains("queue_size"));
    }

    #[test]
    fn test_zero_interval_only_matters_when_enabled() {
        assert!(Config::from_str("[metrics]\ninterval = \"0s\"").is_err());
        assert!(Config::from_str("[metrics]\nenabled = false\ninterval = \"0s\"").is_ok());
    }
}
