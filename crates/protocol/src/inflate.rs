//! Streaming zlib layer for compressed payloads
//!
//! `Inflate` is the decompressor state for one `1C` payload. It does not own
//! the connection: `InflateRead` borrows the state together with the
//! underlying buffered reader for the duration of a single read, so the
//! connection can be handed back untouched once the batch is done.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use flate2::{Decompress, FlushDecompress, Status};
use tokio::io::{AsyncBufRead, AsyncRead, ReadBuf};

use crate::{ProtocolError, Result};

/// Zlib compression method for deflate
const CM_DEFLATE: u8 = 8;

/// Largest zlib window exponent (32K window)
const MAX_CINFO: u8 = 7;

/// FDICT bit: preset dictionary follows the header
const FLG_PRESET_DICT: u8 = 0x20;

/// Validate the two byte zlib stream header (RFC 1950)
pub(crate) fn check_zlib_header(cmf: u8, flg: u8) -> Result<()> {
    let check = (u16::from(cmf) << 8) | u16::from(flg);
    let valid = cmf & 0x0f == CM_DEFLATE
        && cmf >> 4 <= MAX_CINFO
        && check % 31 == 0
        && flg & FLG_PRESET_DICT == 0;

    if valid {
        Ok(())
    } else {
        Err(ProtocolError::InvalidCompressionHeader { cmf, flg })
    }
}

/// Decompressor state for one compressed payload
pub(crate) struct Inflate {
    decompress: Decompress,
    /// Header bytes already read and validated, fed to the decompressor first
    header: [u8; 2],
    header_fed: usize,
    /// Raw payload bytes still owed by the connection
    remaining: u64,
    finished: bool,
}

impl Inflate {
    /// Start a zlib stream whose header has been read; `remaining` is the
    /// rest of the declared payload length.
    pub(crate) fn new(header: [u8; 2], remaining: u64) -> Self {
        Self {
            decompress: Decompress::new(true),
            header,
            header_fed: 0,
            remaining,
            finished: false,
        }
    }

    /// Raw payload bytes not yet consumed from the connection
    #[inline]
    pub(crate) fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Run the decompressor once, returning (consumed, produced, status)
    ///
    /// Never asks for a final flush: an empty `input` only drains output the
    /// decompressor already holds.
    fn step(&mut self, input: &[u8], output: &mut [u8]) -> io::Result<(usize, usize, Status)> {
        let before_in = self.decompress.total_in();
        let before_out = self.decompress.total_out();

        let status = self
            .decompress
            .decompress(input, output, FlushDecompress::None)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let consumed = (self.decompress.total_in() - before_in) as usize;
        let produced = (self.decompress.total_out() - before_out) as usize;
        Ok((consumed, produced, status))
    }
}

/// Reader over the decompressed bytes of a payload
pub(crate) struct InflateRead<'a, R> {
    pub(crate) inner: &'a mut R,
    pub(crate) state: &'a mut Inflate,
}

impl<R: AsyncBufRead + Unpin> AsyncRead for InflateRead<'_, R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        loop {
            // End of the zlib stream reads as EOF
            if this.state.finished || buf.remaining() == 0 {
                return Poll::Ready(Ok(()));
            }

            let (consumed, produced, status, exhausted) =
                if this.state.header_fed < this.state.header.len() {
                    let header = this.state.header;
                    let fed = this.state.header_fed;
                    let (consumed, produced, status) =
                        this.state.step(&header[fed..], buf.initialize_unfilled())?;
                    this.state.header_fed += consumed;
                    (consumed, produced, status, false)
                } else {
                    let input: &[u8] = if this.state.remaining == 0 {
                        &[]
                    } else {
                        ready!(Pin::new(&mut *this.inner).poll_fill_buf(cx))?
                    };
                    let limit = input
                        .len()
                        .min(usize::try_from(this.state.remaining).unwrap_or(usize::MAX));
                    let exhausted = limit == 0;

                    let (consumed, produced, status) =
                        this.state.step(&input[..limit], buf.initialize_unfilled())?;

                    Pin::new(&mut *this.inner).consume(consumed);
                    this.state.remaining -= consumed as u64;
                    (consumed, produced, status, exhausted)
                };

            buf.advance(produced);

            if status == Status::StreamEnd {
                this.state.finished = true;
            }
            if produced > 0 || this.state.finished {
                return Poll::Ready(Ok(()));
            }

            if exhausted {
                // Payload (or connection) exhausted before the zlib stream ended
                return Poll::Ready(Err(io::ErrorKind::UnexpectedEof.into()));
            }
            if consumed == 0 {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "deflate stream made no progress",
                )));
            }
        }
    }
}
