//! # Line Codec
//!
//! Splits a byte stream into [`Frame`]s and terminates outgoing payloads.
//!
//! The read buffer owned by `FramedRead` doubles as the leftover: bytes after
//! the last line feed stay in it until more input arrives. Chunk boundaries
//! can fall anywhere, including between a carriage return and its line feed,
//! and the resulting frames are the same as if the whole input had arrived at
//! once.
//!
//! ## Rules
//! - A line ends at `\n`; every `\r` in the line is removed, wherever it sits
//! - Lines that are empty after stripping are dropped
//! - Unterminated bytes left at end of input are discarded, never emitted

use bytes::{BufMut, Bytes, BytesMut};
use futures::Stream;
use std::io;
use tokio_util::codec::{Decoder, Encoder, FramedRead};
use tokio_util::io::StreamReader;
use tracing::trace;

use crate::core::frame::Frame;
use crate::error::{ProtocolError, Result};

/// Outbound line terminator
pub const LINE_TERMINATOR: &[u8; 2] = b"\r\n";

#[derive(Debug, Clone, Default)]
pub struct LineCodec {
    /// Where to resume scanning for `\n`, so a long unterminated line is
    /// not rescanned from the start on every new chunk
    next_index: usize,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Whether `payload` would split into more than one line on the wire
#[inline]
pub(crate) fn has_line_terminator(payload: &[u8]) -> bool {
    payload.iter().any(|b| *b == b'\r' || *b == b'\n')
}

/// Remove every carriage return from a completed line
#[inline]
fn strip_carriage_returns(line: BytesMut) -> Bytes {
    if line.contains(&b'\r') {
        line.iter()
            .copied()
            .filter(|b| *b != b'\r')
            .collect::<Vec<u8>>()
            .into()
    } else {
        line.freeze()
    }
}

impl Decoder for LineCodec {
    type Item = Frame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            let start = self.next_index.min(src.len());
            let newline = src[start..].iter().position(|b| *b == b'\n');

            let Some(offset) = newline else {
                self.next_index = src.len();
                return Ok(None);
            };

            let end = start + offset;
            self.next_index = 0;

            let mut line = src.split_to(end + 1);
            line.truncate(end);

            let payload = strip_carriage_returns(line);
            if payload.is_empty() {
                continue;
            }

            return Ok(Some(Frame::from_line(payload)));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }

        if !src.is_empty() {
            trace!(bytes = src.len(), "Discarding unterminated trailing data");
            src.clear();
        }
        self.next_index = 0;
        Ok(None)
    }
}

impl Encoder<Bytes> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, payload: Bytes, dst: &mut BytesMut) -> Result<()> {
        debug_assert!(
            !has_line_terminator(&payload),
            "outbound payload contains a line terminator: {payload:?}"
        );
        dst.reserve(payload.len() + LINE_TERMINATOR.len());
        dst.put_slice(&payload);
        dst.put_slice(LINE_TERMINATOR);
        Ok(())
    }
}

impl Encoder<Frame> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<()> {
        Encoder::<Bytes>::encode(self, frame.into_bytes(), dst)
    }
}

/// Chunk an arbitrary stream of raw byte chunks into frames.
///
/// The returned stream ends when `chunks` ends; an error item from `chunks`
/// surfaces as [`ProtocolError::Io`].
pub fn chunk_frames<S, E>(chunks: S) -> impl Stream<Item = Result<Frame>>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Into<io::Error>,
{
    FramedRead::new(StreamReader::new(chunks), LineCodec::new())
}
