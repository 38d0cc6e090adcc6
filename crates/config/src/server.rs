//! Listener configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// `[server]` table
///
/// # Example
///
/// ```toml
/// [server]
/// port = 5043
/// ssl_certificate = "/etc/lumberjack/server.crt"
/// ssl_key = "/etc/lumberjack/server.key"
/// handshake_timeout = "10s"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Bind address
    /// Default: 0.0.0.0
    pub address: String,

    /// Listen port
    /// Default: 5043
    pub port: u16,

    /// PEM certificate chain
    /// Default: ./lumberjack.crt
    pub ssl_certificate: PathBuf,

    /// PEM private key
    /// Default: ./lumberjack.key
    pub ssl_key: PathBuf,

    /// Concurrent connections served, at most `MAX_CONNECTIONS_LIMIT`
    /// Default: 1024
    pub max_connections: usize,

    /// TLS handshake deadline
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub handshake_timeout: Duration,

    /// Largest key or value length accepted (bytes)
    /// Default: 16 MiB
    pub max_field_size: u32,

    /// TCP nodelay
    /// Default: true
    pub no_delay: bool,

    /// TCP keepalive
    /// Default: true
    pub keepalive: bool,
}

/// Upper bound for `max_connections`
pub const MAX_CONNECTIONS_LIMIT: usize = 1 << 20;

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: 5043,
            ssl_certificate: PathBuf::from("./lumberjack.crt"),
            ssl_key: PathBuf::from("./lumberjack.key"),
            max_connections: 1024,
            handshake_timeout: Duration::from_secs(10),
            max_field_size: 16 * 1024 * 1024,
            no_delay: true,
            keepalive: true,
        }
    }
}

impl ServerSection {
    /// Get the socket address to bind to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let server: ServerSection = toml::from_str("").unwrap();
        assert_eq!(server.port, 5043);
        assert_eq!(server.ssl_certificate, PathBuf::from("./lumberjack.crt"));
        assert_eq!(server.handshake_timeout, Duration::from_secs(10));
        assert_eq!(server.max_field_size, 16 * 1024 * 1024);
        assert_eq!(server.bind_address(), "0.0.0.0:5043");
    }

    #[test]
    fn test_humantime_timeout() {
        let server: ServerSection = toml::from_str("handshake_timeout = \"1m 30s\"").unwrap();
        assert_eq!(server.handshake_timeout, Duration::from_secs(90));
    }

    #[test]
    fn test_bad_timeout_rejected() {
        let result: Result<ServerSection, _> = toml::from_str("handshake_timeout = \"soon\"");
        assert!(result.is_err());
    }
}
