//! Protocol error types
//!
//! Errors that can occur while reading frames off a connection.
//! Every one of them ends the session that produced it.

use std::io;

use thiserror::Error;

use crate::FrameType;

/// Errors that can occur during protocol operations
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Underlying stream failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Peer closed the connection between frames
    #[error("connection closed by peer")]
    Closed,

    /// Stream ended in the middle of a frame
    #[error("truncated {frame} frame")]
    Truncated { frame: &'static str },

    /// Tag is not a lumberjack v1 frame type
    #[error("unknown frame tag \"{tag}\"")]
    UnknownFrame { tag: String },

    /// Known frame type in a position the protocol does not allow
    #[error("unexpected {frame} frame: {reason}")]
    UnexpectedFrame {
        frame: FrameType,
        reason: &'static str,
    },

    /// Compressed payload does not start with a usable zlib header
    #[error("invalid zlib header: cmf={cmf:#04x} flg={flg:#04x}")]
    InvalidCompressionHeader { cmf: u8, flg: u8 },

    /// Corrupt deflate data inside a compressed payload
    #[error("decompression failed: {0}")]
    Decompress(String),

    /// `offset` value is not a non-negative integer
    #[error("invalid offset value {value:?}")]
    InvalidOffset { value: String },

    /// Key or value length exceeds the configured limit
    #[error("field size {size} exceeds limit {limit}")]
    FieldTooLarge { size: u32, limit: u32 },
}

impl ProtocolError {
    /// Create a truncated frame error
    #[inline]
    pub fn truncated(frame: &'static str) -> Self {
        Self::Truncated { frame }
    }

    /// Create an unknown frame error from the raw tag bytes
    #[inline]
    pub fn unknown_frame(tag: [u8; 2]) -> Self {
        Self::UnknownFrame {
            tag: tag.escape_ascii().to_string(),
        }
    }

    /// Create an unexpected frame error
    #[inline]
    pub fn unexpected(frame: FrameType, reason: &'static str) -> Self {
        Self::UnexpectedFrame { frame, reason }
    }

    /// Create an invalid offset error
    #[inline]
    pub fn invalid_offset(value: impl Into<String>) -> Self {
        Self::InvalidOffset {
            value: value.into(),
        }
    }

    /// Create a field too large error
    #[inline]
    pub fn field_too_large(size: u32, limit: u32) -> Self {
        Self::FieldTooLarge { size, limit }
    }

    /// Check if this error means the peer went away rather than misbehaved
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Closed => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::UnexpectedEof
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }

    /// Check if this is a decode error (malformed input rather than transport failure)
    pub fn is_decode_error(&self) -> bool {
        !matches!(self, Self::Io(_) | Self::Closed)
    }
}
