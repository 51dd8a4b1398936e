//! # Transport Layer
//!
//! Establishes the duplex byte stream a session runs over.
//!
//! A [`Connector`] maps `(host, port)` to a connected stream. Plaintext and
//! TLS differ only in which connector is handed to the session runner; the
//! session logic never looks at the stream type.
//!
//! ## Connectors
//! - [`tcp::PlainConnector`]: TCP with a connect timeout
//! - [`tls::TlsConnector`]: TCP followed by a rustls client handshake

use std::future::Future;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;

pub mod tcp;
pub mod tls;

/// Factory for connected duplex streams
pub trait Connector: Send + Sync {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Open a connection to `host:port`
    fn connect(&self, host: &str, port: u16)
        -> impl Future<Output = Result<Self::Stream>> + Send;
}
