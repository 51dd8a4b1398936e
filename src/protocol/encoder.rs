use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use tokio_util::codec::Encoder;

use crate::core::codec::{has_line_terminator, LineCodec, LINE_TERMINATOR};
use crate::error::{ProtocolError, Result};
use crate::protocol::codec::MessageCodec;

/// Tokio encoder writing one CRLF-terminated line per outbound message
#[derive(Debug, Clone)]
pub struct MessageEncoder<C> {
    lines: LineCodec,
    codec: C,
}

impl<C: MessageCodec> MessageEncoder<C> {
    pub fn new(codec: C) -> Self {
        Self {
            lines: LineCodec::new(),
            codec,
        }
    }
}

impl<C: MessageCodec> Encoder<C::Message> for MessageEncoder<C> {
    type Error = ProtocolError;

    fn encode(&mut self, message: C::Message, dst: &mut BytesMut) -> Result<()> {
        let payload = self.codec.encode(&message);
        self.lines.encode(payload, dst)
    }
}

/// Wire bytes for a single message, terminator included
pub fn encode_message<C: MessageCodec>(codec: &C, message: &C::Message) -> Bytes {
    let payload = codec.encode(message);
    debug_assert!(
        !has_line_terminator(&payload),
        "outbound payload contains a line terminator: {payload:?}"
    );
    let mut line = BytesMut::with_capacity(payload.len() + LINE_TERMINATOR.len());
    line.extend_from_slice(&payload);
    line.extend_from_slice(LINE_TERMINATOR);
    line.freeze()
}

/// Map a stream of messages to wire bytes, 1:1 and in order
pub fn encode_messages<S, C>(messages: S, codec: C) -> impl Stream<Item = Bytes>
where
    S: Stream<Item = C::Message>,
    C: MessageCodec,
{
    messages.map(move |message| encode_message(&codec, &message))
}
