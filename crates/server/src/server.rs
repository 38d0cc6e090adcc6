//! Lumberjack listener
//!
//! Accepts TCP connections, wraps each in TLS and runs one [`Session`] per
//! connection on its own task.
//!
//! # Design
//!
//! - **Bounded concurrency**: a semaphore permit is taken before each accept
//!   and held for the connection's lifetime
//! - **Handshake deadline**: a peer that never finishes TLS is dropped after
//!   `handshake_timeout`
//! - **Isolation**: a failing session is logged and closed; the listener and
//!   other sessions carry on
//! - **Shutdown**: cancelling the token stops accepting, cancels every
//!   session and waits for their tasks to finish
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lumberjack_server::{LumberjackServer, ServerConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ServerConfig::new("server.crt", "server.key", 5043);
//! let server = LumberjackServer::new(config, Arc::new(|event| println!("{event:?}")))?;
//! server.run(CancellationToken::new()).await?;
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lumberjack_protocol::DEFAULT_MAX_FIELD_SIZE;
#[cfg(unix)]
use socket2::{SockRef, TcpKeepalive};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::handler::SharedHandler;
use crate::metrics::ServerMetrics;
use crate::session::{DEFAULT_READ_BUFFER_SIZE, Session, SessionOptions};
use crate::tls::{TlsError, load_acceptor};

/// Default lumberjack port
pub const DEFAULT_PORT: u16 = 5043;

/// Default cap on concurrent connections
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// Default TLS handshake deadline (10s)
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub address: String,

    /// Listen port
    pub port: u16,

    /// PEM certificate chain presented to senders
    pub ssl_certificate: PathBuf,

    /// PEM private key for `ssl_certificate`
    pub ssl_key: PathBuf,

    /// Connections served at once; further peers wait in the backlog
    pub max_connections: usize,

    /// Deadline for the TLS handshake
    pub handshake_timeout: Duration,

    /// Largest key or value length accepted in a data frame
    pub max_field_size: u32,

    /// Read buffer size per connection
    pub buffer_size: usize,

    /// TCP nodelay (disable Nagle's algorithm)
    pub nodelay: bool,

    /// TCP keepalive enabled
    pub keepalive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            ssl_certificate: PathBuf::new(),
            ssl_key: PathBuf::new(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            buffer_size: DEFAULT_READ_BUFFER_SIZE,
            nodelay: true,
            keepalive: true,
        }
    }
}

impl ServerConfig {
    /// Create config for a certificate, key and port
    pub fn new(cert: impl Into<PathBuf>, key: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            ssl_certificate: cert.into(),
            ssl_key: key.into(),
            port,
            ..Default::default()
        }
    }

    /// Set the concurrent connection cap
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Get the socket address to bind to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            max_field_size: self.max_field_size,
            buffer_size: self.buffer_size,
        }
    }
}

/// Listener errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to address
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Certificate or key unusable
    #[error(transparent)]
    Tls(#[from] TlsError),
}

/// Lumberjack v1 server
///
/// Decoded events go to the handler; each one is acked once the handler
/// returns.
pub struct LumberjackServer {
    config: ServerConfig,
    acceptor: TlsAcceptor,
    handler: SharedHandler,
    metrics: Arc<ServerMetrics>,
}

impl LumberjackServer {
    /// Create a server, loading the configured certificate and key
    ///
    /// # Errors
    ///
    /// Fails if either file is missing or the pair is not a usable identity.
    /// Nothing is bound yet.
    pub fn new(config: ServerConfig, handler: SharedHandler) -> Result<Self, ServerError> {
        let acceptor = load_acceptor(&config.ssl_certificate, &config.ssl_key)?;
        Ok(Self::with_acceptor(config, acceptor, handler))
    }

    /// Create a server around an existing acceptor
    pub fn with_acceptor(
        config: ServerConfig,
        acceptor: TlsAcceptor,
        handler: SharedHandler,
    ) -> Self {
        Self {
            config,
            acceptor,
            handler,
            metrics: Arc::new(ServerMetrics::new()),
        }
    }

    /// Get a metrics handle that outlives `run()`
    pub fn metrics_handle(&self) -> Arc<ServerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Get the configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address and serve until cancelled
    pub async fn run(self, cancel: CancellationToken) -> Result<(), ServerError> {
        let bind_addr = self.config.bind_address();

        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| ServerError::Bind {
                address: bind_addr.clone(),
                source: e,
            })?;

        tracing::info!(
            address = %bind_addr,
            max_connections = self.config.max_connections,
            "lumberjack server listening"
        );

        self.serve(listener, cancel).await
    }

    /// Serve connections from an already bound listener until cancelled
    ///
    /// Returns once every session task has finished.
    pub async fn serve(
        self,
        listener: TcpListener,
        cancel: CancellationToken,
    ) -> Result<(), ServerError> {
        let server = Arc::new(self);
        let limit = server.config.max_connections.min(Semaphore::MAX_PERMITS);
        let permits = Arc::new(Semaphore::new(limit));
        let tracker = TaskTracker::new();

        loop {
            // Wait for capacity before accepting so excess peers stay queued
            let permit = tokio::select! {
                _ = cancel.cancelled() => break,
                permit = Arc::clone(&permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            server.metrics.connection_opened();

                            let server = Arc::clone(&server);
                            let cancel = cancel.child_token();
                            tracker.spawn(async move {
                                server.handle_connection(stream, peer_addr, cancel).await;
                                server.metrics.connection_closed();
                                drop(permit);
                            });
                        }
                        Err(e) => {
                            // Transient accept errors - log and continue
                            tracing::warn!(error = %e, "accept error");
                            server.metrics.error();
                        }
                    }
                }
            }
        }

        drop(listener);

        tracker.close();
        tracker.wait().await;

        tracing::info!("lumberjack server stopped");
        Ok(())
    }

    /// Run one connection to completion
    async fn handle_connection(
        &self,
        stream: TcpStream,
        peer_addr: SocketAddr,
        cancel: CancellationToken,
    ) {
        self.configure_socket(&stream);

        let handshake = tokio::time::timeout(
            self.config.handshake_timeout,
            self.acceptor.accept(stream),
        );
        let tls = tokio::select! {
            _ = cancel.cancelled() => return,
            result = handshake => match result {
                Ok(Ok(tls)) => tls,
                Ok(Err(e)) => {
                    tracing::debug!(peer = %peer_addr, error = %e, "TLS handshake failed");
                    self.metrics.handshake_failed();
                    return;
                }
                Err(_) => {
                    tracing::debug!(peer = %peer_addr, "TLS handshake timed out");
                    self.metrics.handshake_failed();
                    return;
                }
            },
        };

        tracing::debug!(peer = %peer_addr, "connection established");

        let session = Session::with_options(
            tls,
            Arc::clone(&self.handler),
            self.config.session_options(),
        )
        .with_metrics(Arc::clone(&self.metrics));

        let result = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(peer = %peer_addr, "connection closed by shutdown");
                return;
            }
            result = session.run() => result,
        };

        match result {
            Ok(stats) => {
                tracing::debug!(
                    peer = %peer_addr,
                    batches = stats.batches,
                    events = stats.events,
                    "connection closed"
                );
            }
            Err(e) if e.is_disconnect() => {
                tracing::debug!(peer = %peer_addr, error = %e, "connection dropped");
            }
            Err(e) if e.is_decode_error() => {
                tracing::warn!(peer = %peer_addr, error = %e, "closing connection");
                self.metrics.protocol_error();
            }
            Err(e) => {
                tracing::debug!(peer = %peer_addr, error = %e, "connection error");
                self.metrics.error();
            }
        }
    }

    /// Configure keepalive and nodelay on the raw socket
    #[cfg(unix)]
    fn configure_socket(&self, stream: &TcpStream) {
        if self.config.nodelay
            && let Err(e) = stream.set_nodelay(true)
        {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY");
        }

        // Detect senders that vanished without closing
        if self.config.keepalive {
            let keepalive = TcpKeepalive::new()
                .with_time(Duration::from_secs(60))
                .with_interval(Duration::from_secs(10));

            if let Err(e) = SockRef::from(stream).set_tcp_keepalive(&keepalive) {
                tracing::debug!(error = %e, "failed to set TCP keepalive");
            }
        }
    }

    /// Configure socket - nodelay only on non-unix platforms
    #[cfg(not(unix))]
    fn configure_socket(&self, stream: &TcpStream) {
        if self.config.nodelay
            && let Err(e) = stream.set_nodelay(true)
        {
            tracing::debug!(error = %e, "failed to set TCP_NODELAY");
        }
    }
}
