//! Tests for the frame reader

use bytes::{BufMut, BytesMut};

use crate::encode::{encode_compressed, encode_data, encode_window};
use crate::{FrameReader, FrameType, ProtocolError};

// ============================================================================
// Helper Functions
// ============================================================================

fn reader(bytes: &[u8]) -> FrameReader<&[u8]> {
    FrameReader::new(bytes)
}

/// A window frame followed by a compressed payload holding one data frame
fn compressed_batch(sequence: u32) -> BytesMut {
    let mut inner = BytesMut::new();
    encode_data(&mut inner, sequence, &[("line", "inside")]);

    let mut buf = BytesMut::new();
    encode_window(&mut buf, 1);
    encode_compressed(&mut buf, &inner, 6).unwrap();
    buf
}

// ============================================================================
// Raw Reads
// ============================================================================

#[tokio::test]
async fn test_next_frame_clean_eof() {
    let mut r = reader(&[]);
    assert_eq!(r.next_frame().await.unwrap(), None);
}

#[tokio::test]
async fn test_next_frame_and_u32() {
    let mut buf = BytesMut::new();
    encode_window(&mut buf, 7);

    let mut r = reader(&buf);
    assert_eq!(r.next_frame().await.unwrap(), Some(FrameType::Window));
    assert_eq!(r.read_u32("window").await.unwrap(), 7);
    assert_eq!(r.next_frame().await.unwrap(), None);
}

#[tokio::test]
async fn test_next_frame_unknown_tag() {
    let mut r = reader(b"1Xabcd");
    let err = r.next_frame().await.unwrap_err();
    assert!(matches!(err, ProtocolError::UnknownFrame { ref tag } if tag == "1X"));
}

#[tokio::test]
async fn test_next_frame_partial_tag() {
    let mut r = reader(b"1");
    let err = r.next_frame().await.unwrap_err();
    assert!(matches!(err, ProtocolError::Truncated { frame: "frame tag" }));
}

#[tokio::test]
async fn test_read_u32_short() {
    let mut r = reader(&[0, 0, 1]);
    let err = r.read_u32("window").await.unwrap_err();
    assert!(matches!(err, ProtocolError::Truncated { frame: "window" }));
}

#[tokio::test]
async fn test_read_field() {
    let mut buf = BytesMut::new();
    buf.put_u32(5);
    buf.put_slice(b"hello");

    let mut r = reader(&buf);
    assert_eq!(r.read_field("data").await.unwrap(), b"hello");
}

#[tokio::test]
async fn test_read_field_shorter_than_declared() {
    let mut buf = BytesMut::new();
    buf.put_u32(10);
    buf.put_slice(b"hello");

    let mut r = reader(&buf);
    let err = r.read_field("data").await.unwrap_err();
    assert!(matches!(err, ProtocolError::Truncated { frame: "data" }));
}

#[tokio::test]
async fn test_read_field_over_limit() {
    let mut buf = BytesMut::new();
    buf.put_u32(u32::MAX);

    let mut r = reader(&buf).with_max_field_size(1024);
    let err = r.read_field("data").await.unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::FieldTooLarge {
            size: u32::MAX,
            limit: 1024
        }
    ));
}

// ============================================================================
// Compression Layer
// ============================================================================

#[tokio::test]
async fn test_compressed_layer_reads_inner_frames() {
    let buf = compressed_batch(9);
    let mut r = reader(&buf);

    assert_eq!(r.next_frame().await.unwrap(), Some(FrameType::Window));
    assert_eq!(r.read_u32("window").await.unwrap(), 1);
    assert_eq!(r.next_frame().await.unwrap(), Some(FrameType::Compressed));

    let len = r.read_u32("compressed").await.unwrap();
    r.push_compressed(len).await.unwrap();
    assert!(r.is_compressed());

    assert_eq!(r.next_frame().await.unwrap(), Some(FrameType::Data));
    assert_eq!(r.read_u32("data").await.unwrap(), 9);
}

#[tokio::test]
async fn test_pop_compressed_realigns_connection() {
    let mut buf = compressed_batch(1);
    encode_window(&mut buf, 3);
    let mut r = reader(&buf);

    r.next_frame().await.unwrap();
    r.read_u32("window").await.unwrap();
    r.next_frame().await.unwrap();
    let len = r.read_u32("compressed").await.unwrap();
    r.push_compressed(len).await.unwrap();

    // Read only part of the inner data frame, then drop the layer
    assert_eq!(r.next_frame().await.unwrap(), Some(FrameType::Data));
    r.pop_compressed().await.unwrap();
    assert!(!r.is_compressed());

    assert_eq!(r.next_frame().await.unwrap(), Some(FrameType::Window));
    assert_eq!(r.read_u32("window").await.unwrap(), 3);
}

#[tokio::test]
async fn test_pop_without_layer_is_noop() {
    let mut r = reader(&[]);
    assert_eq!(r.pop_compressed().await.unwrap(), 0);
}

#[tokio::test]
async fn test_push_compressed_invalid_header() {
    // gzip magic instead of a zlib header
    let mut r = reader(&[0x1f, 0x8b, 0x08, 0x00]);
    let err = r.push_compressed(4).await.unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::InvalidCompressionHeader {
            cmf: 0x1f,
            flg: 0x8b
        }
    ));
    assert!(!r.is_compressed());
}

#[tokio::test]
async fn test_push_compressed_too_short_for_header() {
    let mut r = reader(&[0x78]);
    let err = r.push_compressed(1).await.unwrap_err();
    assert!(matches!(err, ProtocolError::Truncated { frame: "compressed" }));
}

#[tokio::test]
async fn test_push_compressed_twice_rejected() {
    let buf = compressed_batch(1);
    let mut r = reader(&buf[6..]);

    r.next_frame().await.unwrap();
    let len = r.read_u32("compressed").await.unwrap();
    r.push_compressed(len).await.unwrap();

    let err = r.push_compressed(len).await.unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::UnexpectedFrame {
            frame: FrameType::Compressed,
            ..
        }
    ));
}

#[tokio::test]
async fn test_compressed_payload_truncated() {
    let buf = compressed_batch(1);
    // Drop the tail of the zlib stream but keep the declared length
    let cut = &buf[..buf.len() - 8];
    let mut r = reader(cut);

    r.next_frame().await.unwrap();
    r.read_u32("window").await.unwrap();
    r.next_frame().await.unwrap();
    let len = r.read_u32("compressed").await.unwrap();
    r.push_compressed(len).await.unwrap();

    let result = async {
        r.next_frame().await?;
        r.read_u32("data").await?;
        r.read_u32("data").await?;
        r.read_field("data").await?;
        r.read_field("data").await?;
        r.pop_compressed().await
    }
    .await;

    assert!(matches!(result, Err(ProtocolError::Truncated { .. })));
}

#[tokio::test]
async fn test_compressed_payload_corrupt() {
    let mut buf = BytesMut::new();
    buf.put_slice(&FrameType::Compressed.tag());
    buf.put_u32(6);
    // Valid header, then a final block with the reserved block type
    buf.put_slice(&[0x78, 0x9c, 0xff, 0xff, 0xff, 0xff]);

    let mut r = reader(&buf);
    r.next_frame().await.unwrap();
    let len = r.read_u32("compressed").await.unwrap();
    r.push_compressed(len).await.unwrap();

    let err = r.next_frame().await.unwrap_err();
    assert!(matches!(err, ProtocolError::Decompress(_)));
}
