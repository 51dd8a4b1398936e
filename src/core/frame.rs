use bytes::Bytes;
use std::borrow::Cow;
use std::fmt;

use crate::core::codec::has_line_terminator;
use crate::error::{constants, ProtocolError, Result};

/// One complete protocol line in wire form.
///
/// A frame is never empty and never contains a carriage return or line feed.
/// Frames produced by [`LineCodec`](crate::core::codec::LineCodec) hold these
/// invariants by construction; [`Frame::new`] checks them for frames built by hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame(Bytes);

impl Frame {
    /// Build a frame from an arbitrary payload, rejecting empty payloads and
    /// embedded line terminators
    pub fn new(payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        if payload.is_empty() {
            return Err(ProtocolError::InvalidFrame(
                constants::ERR_EMPTY_FRAME.to_string(),
            ));
        }
        if has_line_terminator(&payload) {
            return Err(ProtocolError::InvalidFrame(
                constants::ERR_FRAME_TERMINATOR.to_string(),
            ));
        }
        Ok(Self(payload))
    }

    /// Caller guarantees the payload is nonempty and terminator-free
    pub(crate) fn from_line(payload: Bytes) -> Self {
        debug_assert!(!payload.is_empty());
        Self(payload)
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Payload length in bytes (always at least one)
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Payload as text, replacing invalid UTF-8 sequences
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Frame> for Bytes {
    fn from(frame: Frame) -> Self {
        frame.0
    }
}

impl TryFrom<&str> for Frame {
    type Error = ProtocolError;

    fn try_from(value: &str) -> Result<Self> {
        Frame::new(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}
