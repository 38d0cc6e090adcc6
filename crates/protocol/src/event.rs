//! Data frame decoding
//!
//! A data frame carries a sequence number and a list of key/value pairs.
//! Four well-known keys are promoted to named fields of `FileEvent`; every
//! other pair lands in `fields`.
//!
//! # Layout
//!
//! ```text
//! "1D" sequence:u32 pairs:u32 (key_len:u32 key value_len:u32 value){pairs}
//! ```

use std::collections::HashMap;

use serde::Serialize;
use tokio::io::AsyncBufRead;

use crate::{FrameReader, ProtocolError, Result};

/// Key holding the source file path
pub const KEY_FILE: &str = "file";

/// Key holding the originating host
pub const KEY_HOST: &str = "host";

/// Key holding the byte offset of the line, as decimal text
pub const KEY_OFFSET: &str = "offset";

/// Key holding the line itself
pub const KEY_LINE: &str = "line";

/// Frame name used in truncation errors
const FRAME: &str = "data";

/// One log line shipped by a forwarder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileEvent {
    /// Path of the file the line came from (`file`)
    pub source: String,
    /// Byte offset of the line within the file (`offset`)
    pub offset: u64,
    /// Originating host (`host`)
    pub host: String,
    /// Line content (`line`)
    pub text: String,
    /// All other pairs, keyed by their wire name
    pub fields: HashMap<String, String>,
}

impl FileEvent {
    /// Store a decoded pair, promoting well-known keys
    ///
    /// # Errors
    ///
    /// Returns `InvalidOffset` if the `offset` value is not a non-negative integer.
    pub fn insert(&mut self, key: String, value: String) -> Result<()> {
        match key.as_str() {
            KEY_FILE => self.source = value,
            KEY_HOST => self.host = value,
            KEY_LINE => self.text = value,
            KEY_OFFSET => {
                self.offset = value
                    .parse()
                    .map_err(|_| ProtocolError::invalid_offset(value))?;
            }
            _ => {
                self.fields.insert(key, value);
            }
        }
        Ok(())
    }
}

/// A decoded data frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFrame {
    /// Sender-assigned sequence number, echoed in the ack
    pub sequence: u32,
    /// The decoded event
    pub event: FileEvent,
}

/// Decode the body of a data frame (the `1D` tag already consumed)
///
/// # Errors
///
/// Fails if the stream ends mid-frame, a field exceeds the reader's size
/// limit, or `offset` does not parse.
pub async fn decode_data_frame<R>(reader: &mut FrameReader<R>) -> Result<DataFrame>
where
    R: AsyncBufRead + Unpin,
{
    let sequence = reader.read_u32(FRAME).await?;
    let pairs = reader.read_u32(FRAME).await?;

    // No capacity hint: the pair count is sender-controlled
    let mut event = FileEvent::default();
    for _ in 0..pairs {
        let key = into_text(reader.read_field(FRAME).await?);
        let value = into_text(reader.read_field(FRAME).await?);
        event.insert(key, value)?;
    }

    Ok(DataFrame { sequence, event })
}

/// Decode bytes as UTF-8, replacing invalid sequences
fn into_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
