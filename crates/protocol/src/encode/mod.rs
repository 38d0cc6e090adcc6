//! Frame encoding for senders
//!
//! The collector only ever writes acks, but forwarders (and tests) need the
//! other direction too. Frames are appended to a `BytesMut`.
//!
//! # Usage
//!
//! ```ignore
//! use lumberjack_protocol::encode::BatchEncoder;
//!
//! let mut batch = BatchEncoder::new().compressed(6);
//! batch.push_pairs(1, &[("file", "/var/log/syslog"), ("line", "hello")]);
//! let bytes = batch.finish()?;
//! ```

mod batch;

pub use batch::BatchEncoder;

use std::io::Write;

use bytes::{BufMut, BytesMut};
use flate2::Compression;
use flate2::write::ZlibEncoder;

use crate::{
    ACK_FRAME_LENGTH, FileEvent, FrameType, KEY_FILE, KEY_HOST, KEY_LINE, KEY_OFFSET,
    ProtocolError, Result,
};

/// Append a window frame declaring `count` data frames
pub fn encode_window(buf: &mut BytesMut, count: u32) {
    buf.put_slice(&FrameType::Window.tag());
    buf.put_u32(count);
}

/// Append an ack frame for `sequence`
pub fn encode_ack(buf: &mut BytesMut, sequence: u32) {
    buf.put_slice(&FrameType::Ack.tag());
    buf.put_u32(sequence);
}

/// Append a data frame with raw key/value pairs, in the given order
pub fn encode_data(buf: &mut BytesMut, sequence: u32, pairs: &[(&str, &str)]) {
    buf.put_slice(&FrameType::Data.tag());
    buf.put_u32(sequence);
    buf.put_u32(pairs.len() as u32);
    for (key, value) in pairs {
        put_field(buf, key.as_bytes());
        put_field(buf, value.as_bytes());
    }
}

/// Append a data frame for `event`
///
/// Empty `file`, `host` and `line` are omitted; `offset` is always written.
pub fn encode_event(buf: &mut BytesMut, sequence: u32, event: &FileEvent) {
    let offset = event.offset.to_string();
    let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(4 + event.fields.len());

    if !event.source.is_empty() {
        pairs.push((KEY_FILE, event.source.as_str()));
    }
    if !event.host.is_empty() {
        pairs.push((KEY_HOST, event.host.as_str()));
    }
    pairs.push((KEY_OFFSET, offset.as_str()));
    if !event.text.is_empty() {
        pairs.push((KEY_LINE, event.text.as_str()));
    }
    pairs.extend(event.fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));

    encode_data(buf, sequence, &pairs);
}

/// Append a compressed frame wrapping already encoded `frames`
pub fn encode_compressed(buf: &mut BytesMut, frames: &[u8], level: u32) -> std::io::Result<()> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(frames)?;
    let compressed = encoder.finish()?;

    buf.put_slice(&FrameType::Compressed.tag());
    buf.put_u32(compressed.len() as u32);
    buf.put_slice(&compressed);
    Ok(())
}

/// Parse an ack frame received by a sender, returning its sequence number
pub fn decode_ack(frame: &[u8; ACK_FRAME_LENGTH]) -> Result<u32> {
    let tag = [frame[0], frame[1]];
    match FrameType::from_tag(tag) {
        Some(FrameType::Ack) => Ok(u32::from_be_bytes([frame[2], frame[3], frame[4], frame[5]])),
        Some(other) => Err(ProtocolError::unexpected(other, "expected an ack")),
        None => Err(ProtocolError::unknown_frame(tag)),
    }
}

/// Write a u32 length prefix followed by the bytes
#[inline]
fn put_field(buf: &mut BytesMut, bytes: &[u8]) {
    buf.put_u32(bytes.len() as u32);
    buf.put_slice(bytes);
}
