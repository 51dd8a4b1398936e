use bytes::Bytes;

use crate::core::frame::Frame;

/// Translation between wire lines and domain values.
///
/// Both directions must be pure and total: `decode` returns some event for
/// every frame (falling back to a raw variant for input it cannot parse) and
/// `encode` never fails. Neither may block.
///
/// `encode` returns the payload only; the stages append the line terminator.
/// The payload must not contain `\r` or `\n`, or the peer will see more than
/// one line. Debug builds assert this when the payload is written.
pub trait MessageCodec: Clone + Send + Sync + 'static {
    type Event: Send + 'static;
    type Message: Send + 'static;

    fn decode(&self, frame: &Frame) -> Self::Event;

    fn encode(&self, message: &Self::Message) -> Bytes;
}

/// Codec that passes lines through as text.
///
/// Inbound frames become `String`s (invalid UTF-8 replaced); outbound strings
/// are sent as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl MessageCodec for RawCodec {
    type Event = String;
    type Message = String;

    fn decode(&self, frame: &Frame) -> String {
        frame.to_string_lossy().into_owned()
    }

    fn encode(&self, message: &String) -> Bytes {
        Bytes::copy_from_slice(message.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_codec_passthrough() {
        let codec = RawCodec;
        let frame = Frame::try_from(":irc.example.net 001 nick :Welcome").unwrap();
        assert_eq!(codec.decode(&frame), ":irc.example.net 001 nick :Welcome");
        assert_eq!(
            &codec.encode(&"QUIT :bye".to_string())[..],
            b"QUIT :bye"
        );
    }
}
