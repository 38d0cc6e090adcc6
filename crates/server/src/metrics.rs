//! Server metrics
//!
//! Lock-free counters updated by the accept loop and by every session.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the accept loop and all sessions
#[derive(Debug, Default)]
pub struct ServerMetrics {
    /// Currently active connections
    pub connections_active: AtomicU64,

    /// Total connections accepted
    pub connections_total: AtomicU64,

    /// Batches fully processed
    pub batches_received: AtomicU64,

    /// Events delivered to the handler
    pub events_received: AtomicU64,

    /// Ack frames written
    pub acks_sent: AtomicU64,

    /// TLS handshakes that failed or timed out
    pub handshake_failures: AtomicU64,

    /// Sessions ended by malformed input
    pub protocol_errors: AtomicU64,

    /// Total errors encountered
    pub errors: AtomicU64,
}

impl ServerMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            connections_active: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
            batches_received: AtomicU64::new(0),
            events_received: AtomicU64::new(0),
            acks_sent: AtomicU64::new(0),
            handshake_failures: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Increment active connections
    #[inline]
    pub fn connection_opened(&self) {
        self.connections_active.fetch_add(1, Ordering::Relaxed);
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement active connections
    #[inline]
    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a completed batch
    #[inline]
    pub fn batch_received(&self) {
        self.batches_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an event handed to the handler
    #[inline]
    pub fn event_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an ack written
    #[inline]
    pub fn ack_sent(&self) {
        self.acks_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed TLS handshake
    #[inline]
    pub fn handshake_failed(&self) {
        self.handshake_failures.fetch_add(1, Ordering::Relaxed);
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a session ended by a decode error
    #[inline]
    pub fn protocol_error(&self) {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed);
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record error
    #[inline]
    pub fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            batches_received: self.batches_received.load(Ordering::Relaxed),
            events_received: self.events_received.load(Ordering::Relaxed),
            acks_sent: self.acks_sent.load(Ordering::Relaxed),
            handshake_failures: self.handshake_failures.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connections_active: u64,
    pub connections_total: u64,
    pub batches_received: u64,
    pub events_received: u64,
    pub acks_sent: u64,
    pub handshake_failures: u64,
    pub protocol_errors: u64,
    pub errors: u64,
}
