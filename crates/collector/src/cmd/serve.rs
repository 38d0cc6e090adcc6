//! Serve command - run the collector until signalled

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use lumberjack_config::{Config, OutputFormat, ServerSection};
use lumberjack_server::{LumberjackServer, ServerConfig, SharedHandler};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::LoadedConfig;
use crate::output::EventPrinter;

/// How long in-flight sessions get to wind down after a signal
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Serve command arguments
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// PEM certificate chain (overrides config)
    #[arg(long)]
    pub cert: Option<PathBuf>,

    /// PEM private key (overrides config)
    #[arg(long)]
    pub key: Option<PathBuf>,

    /// Listen port (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Event output format (overrides config)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputArg>,
}

/// `--output` values
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputArg {
    Text,
    Json,
    Log,
}

impl From<OutputArg> for OutputFormat {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Text => OutputFormat::Text,
            OutputArg::Json => OutputFormat::Json,
            OutputArg::Log => OutputFormat::Log,
        }
    }
}

impl ServeArgs {
    /// Apply command-line overrides on top of the loaded configuration
    fn apply(&self, config: &mut Config) {
        if let Some(ref cert) = self.cert {
            config.server.ssl_certificate = cert.clone();
        }
        if let Some(ref key) = self.key {
            config.server.ssl_key = key.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(output) = self.output {
            config.output.format = output.into();
        }
    }
}

/// Map the `[server]` table onto the listener's configuration
pub fn server_config(section: &ServerSection) -> ServerConfig {
    ServerConfig {
        address: section.address.clone(),
        port: section.port,
        ssl_certificate: section.ssl_certificate.clone(),
        ssl_key: section.ssl_key.clone(),
        max_connections: section.max_connections,
        handshake_timeout: section.handshake_timeout,
        max_field_size: section.max_field_size,
        nodelay: section.no_delay,
        keepalive: section.keepalive,
        ..Default::default()
    }
}

/// Run the serve command
pub async fn run(loaded: LoadedConfig, args: ServeArgs) -> Result<()> {
    let source = loaded.source();
    let mut config = loaded.config;
    args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %source,
        output = config.output.format.as_str(),
        "lumberjack starting"
    );

    let handler: SharedHandler = Arc::new(EventPrinter::stdout(config.output.format));
    let server = LumberjackServer::new(server_config(&config.server), handler)
        .context("failed to load TLS certificate and key")?;
    let metrics = server.metrics_handle();

    let cancel = CancellationToken::new();
    let mut task = tokio::spawn(server.run(cancel.clone()));

    tokio::select! {
        // Listener gave up on its own (bind failure)
        result = &mut task => {
            result.context("server task panicked")??;
            return Ok(());
        }
        result = wait_for_shutdown() => {
            result.context("failed to install signal handler")?;
        }
    }

    info!("shutdown signal received, stopping server...");
    cancel.cancel();

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => error!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => warn!(error = %e, "server task panicked during shutdown"),
        Err(_) => warn!("server did not finish within timeout, continuing shutdown"),
    }

    let snapshot = metrics.snapshot();
    info!(
        connections = snapshot.connections_total,
        batches = snapshot.batches_received,
        events = snapshot.events_received,
        errors = snapshot.errors,
        "lumberjack shutdown complete"
    );
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => result,
            _ = terminate.recv() => Ok(()),
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_config() {
        let mut config = Config::default();
        let args = ServeArgs {
            cert: Some("a.crt".into()),
            key: Some("a.key".into()),
            port: Some(6001),
            output: Some(OutputArg::Json),
        };

        args.apply(&mut config);

        assert_eq!(config.server.ssl_certificate, PathBuf::from("a.crt"));
        assert_eq!(config.server.ssl_key, PathBuf::from("a.key"));
        assert_eq!(config.server.port, 6001);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_no_overrides_keep_config() {
        let mut config = Config::default();
        ServeArgs::default().apply(&mut config);

        assert_eq!(config.server.port, 5043);
        assert_eq!(config.output.format, OutputFormat::Text);
    }

    #[test]
    fn test_cert_override_completes_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lumberjack.toml");
        std::fs::write(&path, "[server]\nssl_certificate = \"\"\n").unwrap();

        let mut config = crate::cmd::load_config(Some(&path)).unwrap().config;
        assert!(config.validate().is_err());

        let args = ServeArgs {
            cert: Some("override.crt".into()),
            ..Default::default()
        };
        args.apply(&mut config);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_server_config_mapping() {
        let section = ServerSection {
            port: 5999,
            max_connections: 3,
            handshake_timeout: Duration::from_secs(2),
            max_field_size: 1024,
            no_delay: false,
            ..Default::default()
        };

        let config = server_config(&section);
        assert_eq!(config.bind_address(), "0.0.0.0:5999");
        assert_eq!(config.max_connections, 3);
        assert_eq!(config.handshake_timeout, Duration::from_secs(2));
        assert_eq!(config.max_field_size, 1024);
        assert!(!config.nodelay);
        assert!(config.keepalive);
    }
}
