//! Lumberjack Protocol - Wire format for the lumberjack v1 log shipping protocol
//!
//! This crate provides the byte-level pieces a lumberjack collector needs:
//! - `FrameType` - The two byte frame tags (`1W`, `1C`, `1D`, `1A`)
//! - `FrameReader` - Pulls tags and big-endian integers off an async stream,
//!   with an explicit zlib layer that can be pushed for a compressed payload
//! - `FileEvent` / `decode_data_frame` - Decodes one data frame into an event
//! - `encode` - Sender side encoders (windows, data frames, compressed
//!   payloads, acks)
//!
//! # Wire Format
//!
//! All integers are big-endian `u32`.
//!
//! ```text
//! window:      "1W" count
//! compressed:  "1C" length zlib(frames...)
//! data:        "1D" sequence pairs (key_len key value_len value)*
//! ack:         "1A" sequence
//! ```
//!
//! # Design Principles
//!
//! - **Async I/O**: Readers work over any `tokio::io::AsyncBufRead`
//! - **Bounded reads**: Field lengths are checked against a limit before
//!   anything is allocated
//! - **Explicit layering**: The decompression stage is state owned by the
//!   reader, pushed and popped per batch

mod error;
mod event;
mod frame;
mod inflate;
mod reader;

pub mod encode;

pub use error::ProtocolError;
pub use event::{
    DataFrame, FileEvent, KEY_FILE, KEY_HOST, KEY_LINE, KEY_OFFSET, decode_data_frame,
};
pub use frame::{ACK_FRAME_LENGTH, FrameType, PROTOCOL_VERSION, TAG_LENGTH};
pub use reader::FrameReader;

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Default upper bound for a single key or value (16MB)
pub const DEFAULT_MAX_FIELD_SIZE: u32 = 16 * 1024 * 1024;

#[cfg(test)]
mod reader_test;
