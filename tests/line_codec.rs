//! Integration tests for line framing
//!
//! These tests validate that framing depends only on the byte content of the
//! input, never on where the transport happened to cut it.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::{Bytes, BytesMut};
use futures::{stream, TryStreamExt};
use linewire::core::codec::{chunk_frames, LineCodec};
use linewire::Frame;
use proptest::prelude::*;
use std::io;
use tokio_util::codec::Decoder;

/// Feed chunks through one codec the way `FramedRead` does, ending with EOF
fn frame_chunks(chunks: &[&[u8]]) -> Vec<String> {
    let mut codec = LineCodec::new();
    let mut buffer = BytesMut::new();
    let mut frames = Vec::new();

    for chunk in chunks {
        buffer.extend_from_slice(chunk);
        while let Some(frame) = codec.decode(&mut buffer).expect("decode never fails") {
            frames.push(frame.to_string());
        }
    }
    while let Some(frame) = codec.decode_eof(&mut buffer).expect("decode never fails") {
        frames.push(frame.to_string());
    }
    frames
}

async fn frame_stream(chunks: &[&'static [u8]]) -> Vec<String> {
    let input = stream::iter(
        chunks
            .iter()
            .map(|c| Ok::<_, io::Error>(Bytes::from_static(*c))),
    );
    let frames: Vec<Frame> = chunk_frames(input).try_collect().await.unwrap();
    frames.into_iter().map(|f| f.to_string()).collect()
}

#[test]
fn test_split_delivery_yields_one_frame() {
    assert_eq!(
        frame_chunks(&[b"PING :ser", b"ver\r\n"]),
        vec!["PING :server"]
    );
}

#[test]
fn test_empty_frames_suppressed() {
    assert_eq!(frame_chunks(&[b"a\n\nb\n"]), vec!["a", "b"]);
}

#[test]
fn test_unterminated_trailing_data_dropped() {
    assert_eq!(frame_chunks(&[b"a\nb"]), vec!["a"]);
}

#[test]
fn test_chunk_with_no_complete_frame() {
    assert!(frame_chunks(&[b"NOTICE * :partial"]).is_empty());
}

#[test]
fn test_repeated_empty_chunks() {
    assert_eq!(
        frame_chunks(&[b"", b"", b"JOIN #a", b"", b"\r", b"", b"\n", b""]),
        vec!["JOIN #a"]
    );
}

#[test]
fn test_many_frames_in_one_chunk() {
    let wire = (0..100)
        .map(|i| format!("PRIVMSG #c :{i}\r\n"))
        .collect::<String>();
    let frames = frame_chunks(&[wire.as_bytes()]);
    assert_eq!(frames.len(), 100);
    assert_eq!(frames[0], "PRIVMSG #c :0");
    assert_eq!(frames[99], "PRIVMSG #c :99");
}

#[test]
fn test_one_byte_at_a_time() {
    let wire = b":n!u@h PRIVMSG #c :hi\r\nPING :x\nPONG :y\r\n";
    let chunks: Vec<&[u8]> = wire.chunks(1).collect();
    assert_eq!(
        frame_chunks(&chunks),
        vec![":n!u@h PRIVMSG #c :hi", "PING :x", "PONG :y"]
    );
}

#[tokio::test]
async fn test_chunk_frames_stream_split_delivery() {
    let frames = frame_stream(&[b"PING :ser", b"ver\r\n", b"a\n\nb\n", b"c"]).await;
    assert_eq!(frames, vec!["PING :server", "a", "b"]);
}

#[tokio::test]
async fn test_chunk_frames_stream_surfaces_io_error() {
    let input = stream::iter(vec![
        Ok(Bytes::from_static(b"ok\r\n")),
        Err(io::Error::from(io::ErrorKind::ConnectionReset)),
    ]);
    let result: Result<Vec<Frame>, _> = chunk_frames(input).try_collect().await;
    assert!(result.is_err());
}

fn line_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 :#!@.*-]{1,48}"
}

// Property: framing is invariant under arbitrary chunk boundaries
proptest! {
    #[test]
    fn prop_chunk_boundary_invariance(
        lines in prop::collection::vec(line_strategy(), 0..24),
        crlf in any::<bool>(),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..32),
    ) {
        let terminator = if crlf { "\r\n" } else { "\n" };
        let wire: String = lines.iter().map(|l| format!("{l}{terminator}")).collect();
        let bytes = wire.as_bytes();

        let whole = frame_chunks(&[bytes]);
        prop_assert_eq!(&whole, &lines);

        let mut offsets: Vec<usize> = cuts.iter().map(|i| i.index(bytes.len() + 1)).collect();
        offsets.push(0);
        offsets.push(bytes.len());
        offsets.sort_unstable();
        offsets.dedup();

        let chunks: Vec<&[u8]> = offsets.windows(2).map(|w| &bytes[w[0]..w[1]]).collect();
        prop_assert_eq!(frame_chunks(&chunks), whole);
    }
}

// Property: carriage returns are removed wherever they appear
proptest! {
    #[test]
    fn prop_carriage_returns_stripped_anywhere(
        lines in prop::collection::vec(line_strategy(), 1..12),
        positions in prop::collection::vec(any::<prop::sample::Index>(), 0..16),
    ) {
        let wire: String = lines.iter().map(|l| format!("{l}\n")).collect();
        let mut bytes = wire.into_bytes();

        let mut inserts: Vec<usize> = positions.iter().map(|i| i.index(bytes.len() + 1)).collect();
        inserts.sort_unstable_by(|a, b| b.cmp(a));
        for at in inserts {
            bytes.insert(at, b'\r');
        }

        prop_assert_eq!(frame_chunks(&[bytes.as_slice()]), lines);
    }
}

// Property: whatever follows the last line feed never becomes a frame
proptest! {
    #[test]
    fn prop_trailing_partial_never_emitted(
        lines in prop::collection::vec(line_strategy(), 0..8),
        tail in line_strategy(),
    ) {
        let mut wire: String = lines.iter().map(|l| format!("{l}\r\n")).collect();
        wire.push_str(&tail);

        prop_assert_eq!(frame_chunks(&[wire.as_bytes()]), lines);
    }
}

// Property: arbitrary bytes at any chunk size only ever yield clean frames
proptest! {
    #[test]
    fn prop_arbitrary_bytes_yield_clean_frames(
        data in prop::collection::vec(any::<u8>(), 0..512),
        chunk_size in 1usize..64,
    ) {
        let chunks: Vec<&[u8]> = data.chunks(chunk_size).collect();
        for frame in frame_chunks(&chunks) {
            prop_assert!(!frame.is_empty());
            prop_assert!(!frame.contains('\r'));
            prop_assert!(!frame.contains('\n'));
        }
    }
}
