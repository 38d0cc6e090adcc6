//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error - required field missing
    #[error("[{section}] is missing required field '{field}'")]
    MissingField {
        /// Table the field belongs to
        section: &'static str,
        /// Missing field name
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("[{section}] has invalid {field}: {message}")]
    InvalidValue {
        /// Table the field belongs to
        section: &'static str,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },
}

impl ConfigError {
    /// Create a MissingField error
    pub fn missing_field(section: &'static str, field: &'static str) -> Self {
        Self::MissingField { section, field }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        section: &'static str,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            section,
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_error() {
        let err = ConfigError::missing_field("server", "ssl_certificate");
        assert_eq!(
            err.to_string(),
            "[server] is missing required field 'ssl_certificate'"
        );
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::invalid_value("server", "port", "must be non-zero");
        assert!(err.to_string().contains("[server]"));
        assert!(err.to_string().contains("port"));
        assert!(err.to_string().contains("must be non-zero"));
    }

    #[test]
    fn test_io_error_names_path() {
        let err = ConfigError::IoError {
            path: "/etc/lumberjack.toml".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/etc/lumberjack.toml"));
    }
}
