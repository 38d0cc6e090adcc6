//! Event output configuration
//!
//! Where the collector's default handler sends received events.

use serde::Deserialize;

/// How each received event is written
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `host source:offset text` line per event on stdout (default)
    #[default]
    Text,
    /// One JSON object per event on stdout
    Json,
    /// Through the collector's own log at info level
    Log,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Log => "log",
        }
    }
}

/// `[output]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default: text
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats() {
        for (s, expected) in [
            ("text", OutputFormat::Text),
            ("json", OutputFormat::Json),
            ("log", OutputFormat::Log),
        ] {
            let config: OutputConfig = toml::from_str(&format!("format = \"{s}\"")).unwrap();
            assert_eq!(config.format, expected);
            assert_eq!(expected.as_str(), s);
        }
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result: Result<OutputConfig, _> = toml::from_str("format = \"xml\"");
        assert!(result.is_err());
    }
}
