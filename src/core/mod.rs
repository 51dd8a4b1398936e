//! # Core Framing Components
//!
//! Line framing over arbitrarily chunked byte streams.
//!
//! This module turns raw transport bytes into discrete protocol lines and
//! back. It knows nothing about what a line means.
//!
//! ## Components
//! - **Frame**: one complete, terminator-free, nonempty line
//! - **LineCodec**: Tokio codec that splits a byte stream into frames and
//!   terminates outgoing payloads
//!
//! ## Wire Format
//! ```text
//! <payload> CR LF      (outbound, always)
//! <payload> [CR] LF    (inbound; every CR byte is stripped)
//! ```
//!
//! Bytes left without a terminator when the input ends are discarded.

pub mod codec;
pub mod frame;
