//! Configuration validation
//!
//! Catches settings that parse but cannot run:
//! - Certificate and key paths present
//! - Non-zero port
//! - Positive connection and field limits, connections capped

use crate::Config;
use crate::server::MAX_CONNECTIONS_LIMIT;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_server(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<()> {
    let server = &config.server;

    if server.ssl_certificate.as_os_str().is_empty() {
        return Err(ConfigError::missing_field("server", "ssl_certificate"));
    }
    if server.ssl_key.as_os_str().is_empty() {
        return Err(ConfigError::missing_field("server", "ssl_key"));
    }
    if server.address.is_empty() {
        return Err(ConfigError::missing_field("server", "address"));
    }

    if server.port == 0 {
        return Err(ConfigError::invalid_value("server", "port", "must be non-zero"));
    }
    if server.max_connections == 0 {
        return Err(ConfigError::invalid_value(
            "server",
            "max_connections",
            "must be at least 1",
        ));
    }
    if server.max_connections > MAX_CONNECTIONS_LIMIT {
        return Err(ConfigError::invalid_value(
            "server",
            "max_connections",
            format!("must be at most {MAX_CONNECTIONS_LIMIT}"),
        ));
    }
    if server.max_field_size == 0 {
        return Err(ConfigError::invalid_value(
            "server",
            "max_field_size",
            "must be at least 1",
        ));
    }
    if server.handshake_timeout.is_zero() {
        return Err(ConfigError::invalid_value(
            "server",
            "handshake_timeout",
            "must be greater than zero",
        ));
    }

    Ok(())
}
