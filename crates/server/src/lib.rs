//! Lumberjack v1 collector
//!
//! Accepts TLS connections from log shippers, decodes their batches and
//! hands each event to an [`EventHandler`], acknowledging it as soon as the
//! handler returns.
//!
//! # Components
//!
//! - [`LumberjackServer`] - TLS listener, one task per connection
//! - [`Session`] - per-connection batch loop and ack writer
//! - [`EventHandler`] - consumer of decoded events
//! - [`ServerMetrics`] - counters shared by all sessions

mod handler;
mod metrics;
mod server;
mod session;
mod tls;

pub use handler::{EventHandler, SharedHandler};
pub use metrics::{MetricsSnapshot, ServerMetrics};
pub use server::{
    DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_MAX_CONNECTIONS, DEFAULT_PORT, LumberjackServer,
    ServerConfig, ServerError,
};
pub use session::{BatchSummary, DEFAULT_READ_BUFFER_SIZE, Session, SessionOptions, SessionStats};
pub use tls::{TlsError, load_acceptor, load_certificates, load_private_key, server_config};
