//! # Message Pipeline Stages
//!
//! Turns frames into domain events and outbound messages into wire bytes.
//!
//! The meaning of a line belongs to a [`MessageCodec`] supplied by the caller.
//! The stages here only apply it, one item at a time and in order:
//!
//! ```text
//! bytes -> LineCodec -> EventDecoder -> events
//! messages -> MessageEncoder -> bytes + CRLF
//! ```
//!
//! Every stage exists both as a Tokio codec (for `FramedRead`/`FramedWrite`
//! over a socket half) and as a plain `Stream` adapter, so stages compose
//! without a transport.

pub mod codec;
pub mod decoder;
pub mod encoder;

pub use codec::{MessageCodec, RawCodec};
pub use decoder::{decode_chunks, decode_frames, guard_end_of_input, EventDecoder};
pub use encoder::{encode_message, encode_messages, MessageEncoder};
