//! Lumberjack - log collector for lumberjack v1 shippers
//!
//! # Usage
//!
//! ```bash
//! # Run the server (default)
//! lumberjack
//! lumberjack --config lumberjack.toml
//!
//! # Override settings for one run
//! lumberjack serve --cert server.crt --key server.key --port 5044 --output json
//!
//! # Validate configuration and certificates
//! lumberjack check
//! ```

mod cmd;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use lumberjack_config::LogFormat;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Lumberjack - log collector for lumberjack v1 shippers
#[derive(Parser, Debug)]
#[command(name = "lumberjack")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    // Global args that apply to serve when no subcommand given
    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the server
    Serve(cmd::serve::ServeArgs),

    /// Validate configuration and certificates, then exit
    Check(cmd::check::CheckArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = cmd::load_config(cli.config.as_deref())?;

    match cli.command {
        Some(Command::Serve(args)) => {
            init_logging(&resolve_log_level(cli.log_level, &loaded), loaded.config.log.format)?;
            cmd::serve::run(loaded, args).await
        }
        Some(Command::Check(args)) => {
            // Check doesn't need logging - just outputs to stdout
            cmd::check::run(&loaded, &args)
        }
        // No subcommand = run server (default behavior)
        None => {
            init_logging(&resolve_log_level(cli.log_level, &loaded), loaded.config.log.format)?;
            cmd::serve::run(loaded, cmd::serve::ServeArgs::default()).await
        }
    }
}

/// Resolve log level: CLI flag > config file > default "info"
fn resolve_log_level(cli_level: Option<String>, loaded: &cmd::LoadedConfig) -> String {
    cli_level.unwrap_or_else(|| loaded.config.log.level.as_str().to_string())
}

/// Initialize the tracing subscriber for logging
///
/// Logs go to stderr; stdout carries received events.
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    match format {
        LogFormat::Console => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }

    Ok(())
}
