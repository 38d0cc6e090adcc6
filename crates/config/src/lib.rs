//! Lumberjack Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! Only the certificate and key usually need setting.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use lumberjack_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[server]\nport = 5044").unwrap();
//! assert_eq!(config.server.port, 5044);
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [server]
//! port = 5043
//! ssl_certificate = "/etc/lumberjack/server.crt"
//! ssl_key = "/etc/lumberjack/server.key"
//!
//! [log]
//! level = "info"
//!
//! [output]
//! format = "json"
//! ```

mod error;
mod logging;
mod output;
mod server;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use output::{OutputConfig, OutputFormat};
pub use server::{MAX_CONNECTIONS_LIMIT, ServerSection};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listener settings
    pub server: ServerSection,

    /// Logging configuration
    pub log: LogConfig,

    /// Where received events go
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML, or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file without validating it
    ///
    /// For callers that layer overrides on top and call `validate` after.
    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(ConfigError::ParseError)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Run again after applying command-line overrides.
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::str::FromStr;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.server.port, 5043);
        assert_eq!(config.server.max_connections, 1024);
        assert_eq!(config.log.level, LogLevel::Info);
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[server]
address = "127.0.0.1"
port = 5044
ssl_certificate = "/etc/lumberjack/server.crt"
ssl_key = "/etc/lumberjack/server.key"
max_connections = 64
handshake_timeout = "3s"
max_field_size = 65536
no_delay = false
keepalive = false

[log]
level = "debug"
format = "json"

[output]
format = "log"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.server.bind_address(), "127.0.0.1:5044");
        assert_eq!(
            config.server.ssl_certificate,
            PathBuf::from("/etc/lumberjack/server.crt")
        );
        assert_eq!(config.server.max_connections, 64);
        assert_eq!(config.server.handshake_timeout, Duration::from_secs(3));
        assert_eq!(config.server.max_field_size, 65536);
        assert!(!config.server.no_delay);
        assert!(!config.server.keepalive);
        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.output.format, OutputFormat::Log);
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lumberjack.toml");
        fs::write(&path, "[server]\nport = 6000\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.server.port, 6000);
    }

    #[test]
    fn test_read_file_skips_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lumberjack.toml");
        fs::write(&path, "[server]\nssl_certificate = \"\"\n").unwrap();

        let config = Config::read_file(&path).unwrap();
        assert!(config.server.ssl_certificate.as_os_str().is_empty());
        assert!(config.validate().is_err());
        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_from_missing_file() {
        let err = Config::from_file("/nonexistent/lumberjack.toml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
    }
}
