//! Lumberjack session
//!
//! One `Session` per accepted connection. It walks the connection batch by
//! batch, hands every decoded event to the handler and acks it on the write
//! half before reading the next frame.
//!
//! # Batch Layout
//!
//! ```text
//! [1W count] ([1D ...] x count)                  uncompressed
//! [1W count] [1C len [1D ...] x count ]          compressed
//! ```
//!
//! A batch ends when `count` data frames have been processed. Acks always go
//! out on the raw connection, even when the read side is decompressing.
//!
//! # Errors
//!
//! Any error ends the session. There is no error frame: the sender sees the
//! connection drop and resends everything it has not seen acked.

use std::sync::Arc;

use bytes::BytesMut;
use lumberjack_protocol::encode::encode_ack;
use lumberjack_protocol::{
    ACK_FRAME_LENGTH, DEFAULT_MAX_FIELD_SIZE, DataFrame, FrameReader, FrameType, ProtocolError,
    Result, decode_data_frame,
};
use tokio::io::{
    AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf, WriteHalf, split,
};

use crate::handler::SharedHandler;
use crate::metrics::ServerMetrics;

/// adler32 checksum closing every zlib stream
const ADLER32_TRAILER_LENGTH: u64 = 4;

/// Default read buffer size per connection (64KB)
pub const DEFAULT_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Per-session limits
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Largest key or value length accepted
    pub max_field_size: u32,

    /// Read buffer size
    pub buffer_size: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

/// Outcome of one processed batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Data frames declared by the (last) window frame
    pub window: u32,

    /// Events delivered and acked
    pub events: u32,

    /// Whether the batch arrived in a compressed payload
    pub compressed: bool,

    /// Sequence number of the last ack written
    pub last_sequence: Option<u32>,
}

/// Totals for a finished session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub batches: u64,
    pub events: u64,
}

/// Protocol state for one connection
pub struct Session<S> {
    reader: FrameReader<BufReader<ReadHalf<S>>>,
    writer: WriteHalf<S>,
    handler: SharedHandler,
    metrics: Arc<ServerMetrics>,
    ack: BytesMut,
    stats: SessionStats,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Create a session with default limits
    pub fn new(stream: S, handler: SharedHandler) -> Self {
        Self::with_options(stream, handler, SessionOptions::default())
    }

    /// Create a session with explicit limits
    pub fn with_options(stream: S, handler: SharedHandler, options: SessionOptions) -> Self {
        let (read_half, writer) = split(stream);
        let reader = FrameReader::new(BufReader::with_capacity(options.buffer_size, read_half))
            .with_max_field_size(options.max_field_size);

        Self {
            reader,
            writer,
            handler,
            metrics: Arc::new(ServerMetrics::new()),
            ack: BytesMut::with_capacity(ACK_FRAME_LENGTH),
            stats: SessionStats::default(),
        }
    }

    /// Report into shared metrics instead of private ones
    pub fn with_metrics(mut self, metrics: Arc<ServerMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Totals so far
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Process batches until the connection closes or fails
    ///
    /// Returns the session totals when the peer closes the connection
    /// between batches; every other ending is an error.
    pub async fn run(mut self) -> Result<SessionStats> {
        loop {
            match self.read_batch().await {
                Ok(batch) => {
                    tracing::trace!(
                        events = batch.events,
                        compressed = batch.compressed,
                        last_sequence = ?batch.last_sequence,
                        "batch complete"
                    );
                }
                Err(ProtocolError::Closed) => return Ok(self.stats),
                Err(e) => return Err(e),
            }
        }
    }

    /// Read and process exactly one window-headed batch
    ///
    /// # Errors
    ///
    /// `Closed` if the connection ends before the batch starts; any decode
    /// or I/O error otherwise. A failed batch is abandoned: events already
    /// handed over stay delivered and acked, the rest are never seen.
    pub async fn read_batch(&mut self) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        // None until the batch's window frame has been read
        let mut remaining: Option<u32> = None;

        loop {
            let frame = match self.reader.next_frame().await? {
                Some(frame) => frame,
                None if remaining.is_none() => return Err(ProtocolError::Closed),
                None => return Err(ProtocolError::truncated("batch")),
            };

            match frame {
                FrameType::Window => {
                    let count = self.reader.read_u32("window").await?;
                    tracing::trace!(count, "window");
                    summary.window = count;
                    remaining = Some(count);
                    if count == 0 {
                        break;
                    }
                }
                FrameType::Compressed => {
                    if remaining.is_none() {
                        return Err(ProtocolError::unexpected(frame, "no window declared"));
                    }
                    let len = self.reader.read_u32("compressed").await?;
                    tracing::trace!(len, "compressed payload");
                    self.reader.push_compressed(len).await?;
                    summary.compressed = true;
                }
                FrameType::Data => {
                    let left = match remaining {
                        Some(left) if left > 0 => left,
                        _ => return Err(ProtocolError::unexpected(frame, "no window declared")),
                    };

                    let DataFrame { sequence, event } =
                        decode_data_frame(&mut self.reader).await?;
                    self.handler.handle(event);
                    self.metrics.event_received();

                    self.write_ack(sequence).await?;
                    summary.events += 1;
                    summary.last_sequence = Some(sequence);

                    remaining = Some(left - 1);
                    if left == 1 {
                        break;
                    }
                }
                FrameType::Ack => {
                    return Err(ProtocolError::unexpected(
                        frame,
                        "acks only flow from server to sender",
                    ));
                }
            }
        }

        let skipped = self.reader.pop_compressed().await?;
        if skipped > ADLER32_TRAILER_LENGTH {
            tracing::debug!(
                skipped,
                window = summary.window,
                "compressed payload held more than the window declared"
            );
        }

        self.metrics.batch_received();
        self.stats.batches += 1;
        self.stats.events += u64::from(summary.events);
        Ok(summary)
    }

    /// Write the ack for `sequence` on the raw connection
    async fn write_ack(&mut self, sequence: u32) -> Result<()> {
        self.ack.clear();
        encode_ack(&mut self.ack, sequence);

        self.writer.write_all(&self.ack).await?;
        self.writer.flush().await?;

        self.metrics.ack_sent();
        Ok(())
    }
}
