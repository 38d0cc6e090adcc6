//! Frame reader
//!
//! Pulls frame tags, big-endian `u32`s and length-prefixed fields off a
//! buffered async stream.
//!
//! # Compression Layer
//!
//! A `1C` frame does not replace the reader. Instead `push_compressed` adds a
//! zlib layer that every following read goes through, and `pop_compressed`
//! removes it at the end of the batch, skipping whatever is left of the
//! declared payload so the connection lines up with the next frame:
//!
//! ```text
//! raw:        [1W n][1C len][ zlib ................ ][1W n] ...
//! reads:       raw   raw     push -> inflated frames  pop -> raw
//! ```

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::inflate::{Inflate, InflateRead, check_zlib_header};
use crate::{DEFAULT_MAX_FIELD_SIZE, FrameType, ProtocolError, Result, TAG_LENGTH};

/// Zlib header size in bytes
const ZLIB_HEADER_LENGTH: u32 = 2;

/// Reads lumberjack frames from a buffered stream
pub struct FrameReader<R> {
    inner: R,
    inflate: Option<Inflate>,
    max_field_size: u32,
}

impl<R> FrameReader<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Create a reader over a buffered stream
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            inflate: None,
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
        }
    }

    /// Set the largest key or value length accepted
    pub fn with_max_field_size(mut self, limit: u32) -> Self {
        self.max_field_size = limit;
        self
    }

    /// Check if reads currently go through a compression layer
    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.inflate.is_some()
    }

    /// Consume the reader, returning the underlying stream
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read the next frame tag
    ///
    /// Returns `Ok(None)` when the raw connection ends cleanly before the
    /// first byte of a tag. Inside a compressed payload an early end is
    /// always a truncation.
    pub async fn next_frame(&mut self) -> Result<Option<FrameType>> {
        if self.inflate.is_none() && self.inner.fill_buf().await?.is_empty() {
            return Ok(None);
        }

        let mut tag = [0u8; TAG_LENGTH];
        self.read_exact(&mut tag, "frame tag").await?;

        FrameType::from_tag(tag)
            .map(Some)
            .ok_or_else(|| ProtocolError::unknown_frame(tag))
    }

    /// Read a big-endian `u32`
    pub async fn read_u32(&mut self, frame: &'static str) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf, frame).await?;
        Ok(u32::from_be_bytes(buf))
    }

    /// Read a `u32` length followed by that many bytes
    pub async fn read_field(&mut self, frame: &'static str) -> Result<Vec<u8>> {
        let len = self.read_u32(frame).await?;
        if len > self.max_field_size {
            return Err(ProtocolError::field_too_large(len, self.max_field_size));
        }

        let mut buf = vec![0u8; len as usize];
        self.read_exact(&mut buf, frame).await?;
        Ok(buf)
    }

    /// Route all following reads through a zlib stream of `len` raw bytes
    ///
    /// The zlib header is read and checked immediately, so a payload that is
    /// not zlib fails here rather than on the first frame inside it.
    pub async fn push_compressed(&mut self, len: u32) -> Result<()> {
        if self.inflate.is_some() {
            return Err(ProtocolError::unexpected(
                FrameType::Compressed,
                "batch is already compressed",
            ));
        }
        if len < ZLIB_HEADER_LENGTH {
            return Err(ProtocolError::truncated("compressed"));
        }

        let mut header = [0u8; ZLIB_HEADER_LENGTH as usize];
        self.read_exact(&mut header, "compressed").await?;
        check_zlib_header(header[0], header[1])?;

        self.inflate = Some(Inflate::new(
            header,
            u64::from(len - ZLIB_HEADER_LENGTH),
        ));
        Ok(())
    }

    /// Drop the compression layer, skipping the unread rest of its payload
    ///
    /// Returns the number of raw bytes skipped. No-op without a layer.
    pub async fn pop_compressed(&mut self) -> Result<u64> {
        let Some(state) = self.inflate.take() else {
            return Ok(0);
        };

        let remaining = state.remaining();
        if remaining == 0 {
            return Ok(0);
        }

        let skipped = tokio::io::copy(
            &mut (&mut self.inner).take(remaining),
            &mut tokio::io::sink(),
        )
        .await?;

        if skipped < remaining {
            return Err(ProtocolError::truncated("compressed"));
        }
        Ok(skipped)
    }

    /// Fill `buf` from the active layer, classifying early EOF and corrupt
    /// deflate data
    async fn read_exact(&mut self, buf: &mut [u8], frame: &'static str) -> Result<()> {
        let result = match self.inflate.as_mut() {
            Some(state) => {
                let mut layer = InflateRead {
                    inner: &mut self.inner,
                    state,
                };
                layer.read_exact(buf).await
            }
            None => self.inner.read_exact(buf).await,
        };

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Err(ProtocolError::truncated(frame))
            }
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData && self.inflate.is_some() => {
                Err(ProtocolError::Decompress(e.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
