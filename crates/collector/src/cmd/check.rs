//! Check command - validate configuration without serving

use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::Args;
use lumberjack_config::Config;
use lumberjack_server::load_acceptor;

use super::LoadedConfig;

/// Check command arguments
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Only validate the config file; don't load the certificate and key
    #[arg(long)]
    pub skip_tls: bool,
}

/// Run the check command
pub fn run(loaded: &LoadedConfig, args: &CheckArgs) -> Result<()> {
    loaded.config.validate().context("invalid configuration")?;

    if !args.skip_tls {
        let server = &loaded.config.server;
        load_acceptor(&server.ssl_certificate, &server.ssl_key)
            .context("failed to load TLS certificate and key")?;
    }

    print!("{}", summary(loaded, !args.skip_tls));
    Ok(())
}

/// Human-readable summary of the effective configuration
fn summary(loaded: &LoadedConfig, tls_checked: bool) -> String {
    let Config {
        server,
        log,
        output,
    } = &loaded.config;

    let mut out = String::new();
    let _ = writeln!(out, "config:           {}", loaded.source());
    let _ = writeln!(out, "listen:           {}", server.bind_address());
    let _ = writeln!(out, "certificate:      {}", server.ssl_certificate.display());
    let _ = writeln!(out, "key:              {}", server.ssl_key.display());
    let _ = writeln!(out, "max connections:  {}", server.max_connections);
    let _ = writeln!(out, "handshake:        {:?}", server.handshake_timeout);
    let _ = writeln!(out, "max field size:   {} bytes", server.max_field_size);
    let _ = writeln!(out, "log:              {} ({:?})", log.level, log.format);
    let _ = writeln!(out, "output:           {}", output.format.as_str());
    let _ = writeln!(
        out,
        "tls:              {}",
        if tls_checked { "ok" } else { "skipped" }
    );
    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn defaults() -> LoadedConfig {
        LoadedConfig {
            config: Config::default(),
            path: None,
        }
    }

    #[test]
    fn test_summary_lists_effective_settings() {
        let text = summary(&defaults(), false);

        assert!(text.contains("config:           (defaults)"));
        assert!(text.contains("listen:           0.0.0.0:5043"));
        assert!(text.contains("handshake:        10s"));
        assert!(text.contains("output:           text"));
        assert!(text.contains("tls:              skipped"));
    }

    #[test]
    fn test_missing_certificate_fails_check() {
        let mut loaded = defaults();
        loaded.config.server.ssl_certificate = PathBuf::from("/nonexistent/server.crt");

        let err = run(&loaded, &CheckArgs::default()).unwrap_err();
        assert!(err.to_string().contains("TLS certificate"));
    }

    #[test]
    fn test_invalid_config_fails_check() {
        let mut loaded = defaults();
        loaded.config.server.port = 0;

        let err = run(&loaded, &CheckArgs { skip_tls: true }).unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }

    #[test]
    fn test_skip_tls() {
        let mut loaded = defaults();
        loaded.config.server.ssl_certificate = PathBuf::from("/nonexistent/server.crt");

        assert!(
            run(
                &loaded,
                &CheckArgs { skip_tls: true }
            )
            .is_ok()
        );
    }
}
