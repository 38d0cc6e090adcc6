//! Frame tags
//!
//! Every frame starts with a two byte ASCII tag: the protocol version digit
//! followed by a letter naming the frame type.

use std::fmt;

/// Frame tag size in bytes
pub const TAG_LENGTH: usize = 2;

/// Protocol version digit carried as the first byte of every tag
pub const PROTOCOL_VERSION: u8 = b'1';

/// Size of an ack frame on the wire (tag + sequence)
pub const ACK_FRAME_LENGTH: usize = TAG_LENGTH + 4;

/// Lumberjack v1 frame types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    /// `1W` - number of data frames in the batch
    Window,
    /// `1C` - zlib stream wrapping the remaining frames of the batch
    Compressed,
    /// `1D` - one event as sequence number plus key/value pairs
    Data,
    /// `1A` - acknowledgment, server to sender only
    Ack,
}

impl FrameType {
    /// Parse a raw tag, returning `None` for unknown tags
    #[inline]
    pub const fn from_tag(tag: [u8; TAG_LENGTH]) -> Option<Self> {
        match tag {
            [PROTOCOL_VERSION, b'W'] => Some(Self::Window),
            [PROTOCOL_VERSION, b'C'] => Some(Self::Compressed),
            [PROTOCOL_VERSION, b'D'] => Some(Self::Data),
            [PROTOCOL_VERSION, b'A'] => Some(Self::Ack),
            _ => None,
        }
    }

    /// Wire tag for this frame type
    #[inline]
    pub const fn tag(self) -> [u8; TAG_LENGTH] {
        let kind = match self {
            Self::Window => b'W',
            Self::Compressed => b'C',
            Self::Data => b'D',
            Self::Ack => b'A',
        };
        [PROTOCOL_VERSION, kind]
    }

    /// Get string representation
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Window => "window",
            Self::Compressed => "compressed",
            Self::Data => "data",
            Self::Ack => "ack",
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
