use bytes::{Bytes, BytesMut};
use futures::{future, stream, Stream, StreamExt, TryStreamExt};
use std::io;
use tokio_util::codec::Decoder;

use crate::core::codec::{chunk_frames, LineCodec};
use crate::core::frame::Frame;
use crate::error::{ProtocolError, Result};
use crate::protocol::codec::MessageCodec;

/// Tokio decoder producing one event per inbound line.
///
/// Framing is delegated to [`LineCodec`]; each frame is then handed to the
/// message codec. Never fails on content.
#[derive(Debug, Clone)]
pub struct EventDecoder<C> {
    lines: LineCodec,
    codec: C,
}

impl<C: MessageCodec> EventDecoder<C> {
    pub fn new(codec: C) -> Self {
        Self {
            lines: LineCodec::new(),
            codec,
        }
    }
}

impl<C: MessageCodec> Decoder for EventDecoder<C> {
    type Item = C::Event;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<C::Event>> {
        Ok(self
            .lines
            .decode(src)?
            .map(|frame| self.codec.decode(&frame)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<C::Event>> {
        Ok(self
            .lines
            .decode_eof(src)?
            .map(|frame| self.codec.decode(&frame)))
    }
}

/// Map a stream of frames to events, 1:1 and in order
pub fn decode_frames<S, C>(frames: S, codec: C) -> impl Stream<Item = Result<C::Event>>
where
    S: Stream<Item = Result<Frame>>,
    C: MessageCodec,
{
    frames.map_ok(move |frame| codec.decode(&frame))
}

/// Chunk raw bytes into frames and decode them
pub fn decode_chunks<S, E, C>(chunks: S, codec: C) -> impl Stream<Item = Result<C::Event>>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Into<io::Error>,
    C: MessageCodec,
{
    decode_frames(chunk_frames(chunks), codec)
}

/// Turn the end of an inbound stream into [`ProtocolError::ConnectionLost`].
///
/// An active session never expects its input to end, so a consumer driven by
/// the guarded stream sees a typed failure instead of a silent completion.
pub fn guard_end_of_input<S, T>(items: S) -> impl Stream<Item = Result<T>>
where
    S: Stream<Item = Result<T>>,
{
    items.chain(stream::once(future::ready(Err(
        ProtocolError::ConnectionLost,
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::RawCodec;

    #[tokio::test]
    async fn test_decode_chunks_preserves_order() {
        let chunks = stream::iter(vec![
            Ok::<_, io::Error>(Bytes::from_static(b":a PRIVMSG #c :one\r\n:b PRI")),
            Ok(Bytes::from_static(b"VMSG #c :two\r")),
            Ok(Bytes::from_static(b"\n")),
        ]);

        let events: Vec<String> = decode_chunks(chunks, RawCodec)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(events, vec![":a PRIVMSG #c :one", ":b PRIVMSG #c :two"]);
    }

    #[tokio::test]
    async fn test_guard_end_of_input_appends_connection_lost() {
        let items = stream::iter(vec![Ok::<_, ProtocolError>(1u8), Ok(2)]);
        let collected: Vec<Result<u8>> = guard_end_of_input(items).collect().await;

        assert_eq!(collected.len(), 3);
        assert!(matches!(collected[0], Ok(1)));
        assert!(matches!(collected[1], Ok(2)));
        assert!(matches!(collected[2], Err(ProtocolError::ConnectionLost)));
    }

    #[test]
    fn test_event_decoder_eof_drops_partial() {
        let mut decoder = EventDecoder::new(RawCodec);
        let mut buf = BytesMut::from(&b"PING :x\r\nPING :y"[..]);
        assert_eq!(decoder.decode_eof(&mut buf).unwrap().as_deref(), Some("PING :x"));
        assert_eq!(decoder.decode_eof(&mut buf).unwrap(), None);
    }
}
