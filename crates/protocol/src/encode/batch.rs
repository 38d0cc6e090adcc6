//! Batch encoding
//!
//! Builds a full batch: the window frame followed by its data frames,
//! optionally wrapped in a single compressed frame.

use bytes::{Bytes, BytesMut};

use super::{encode_compressed, encode_data, encode_event, encode_window};
use crate::FileEvent;

/// Encoder for one window of data frames
#[derive(Debug, Default)]
pub struct BatchEncoder {
    frames: BytesMut,
    count: u32,
    compression: Option<u32>,
}

impl BatchEncoder {
    /// Create an uncompressed batch encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the data frames in a compressed frame at zlib `level` (0-9)
    pub fn compressed(mut self, level: u32) -> Self {
        self.compression = Some(level.min(9));
        self
    }

    /// Add a data frame for an event
    pub fn push_event(&mut self, sequence: u32, event: &FileEvent) {
        encode_event(&mut self.frames, sequence, event);
        self.count += 1;
    }

    /// Add a data frame with raw key/value pairs
    pub fn push_pairs(&mut self, sequence: u32, pairs: &[(&str, &str)]) {
        encode_data(&mut self.frames, sequence, pairs);
        self.count += 1;
    }

    /// Number of data frames added
    #[inline]
    pub fn len(&self) -> u32 {
        self.count
    }

    /// Check if no data frames were added
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Produce the wire bytes for the batch
    pub fn finish(self) -> std::io::Result<Bytes> {
        let mut out = BytesMut::with_capacity(self.frames.len() + 16);
        encode_window(&mut out, self.count);

        match self.compression {
            Some(level) => encode_compressed(&mut out, &self.frames, level)?,
            None => out.extend_from_slice(&self.frames),
        }

        Ok(out.freeze())
    }
}
