//! # Error Types
//!
//! Error handling for the line protocol core.
//!
//! Framing and codec stages never fail on content: the chunker only discards
//! empty or partial data and message codecs are total. What remains are
//! transport failures, the induced "connection lost" condition and errors
//! raised by caller-supplied session code.
//!
//! ## Error Categories
//! - **I/O Errors**: socket reads and writes
//! - **Connection Errors**: connect timeouts, unexpected end of input
//! - **TLS Errors**: certificate loading and handshake failures
//! - **Session Errors**: failures raised by init, consumer or producer code
//! - **Configuration Errors**: invalid or unreadable configuration
//!
//! ## Example Usage
//! ```rust
//! use linewire::error::{ProtocolError, Result};
//!
//! fn check_port(port: u16) -> Result<u16> {
//!     if port == 0 {
//!         return Err(ProtocolError::ConfigError("port cannot be 0".into()));
//!     }
//!     Ok(port)
//! }
//!
//! assert!(check_port(6667).is_ok());
//! assert!(check_port(0).is_err());
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Connection errors
    pub const ERR_CONNECTION_LOST: &str = "Connection lost: peer closed the stream";

    /// Frame validation errors
    pub const ERR_EMPTY_FRAME: &str = "Frame payload cannot be empty";
    pub const ERR_FRAME_TERMINATOR: &str = "Frame payload cannot contain CR or LF";

    /// Session task errors
    pub const ERR_TASK_PANICKED: &str = "Session activity panicked";
    pub const ERR_TASK_CANCELLED: &str = "Session activity was cancelled";

    /// TLS errors
    pub const ERR_INVALID_SERVER_NAME: &str = "Invalid server name";
}

/// ProtocolError is the primary error type for all operations in this crate
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The read half reached end of input while the session was still active
    #[error("{}", constants::ERR_CONNECTION_LOST)]
    ConnectionLost,

    #[error("Timeout occurred")]
    Timeout,

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("TLS error: {0}")]
    TlsError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Raised by caller-supplied init, consumer or producer code
    #[error("Handler error: {0}")]
    Handler(String),

    #[error("Task failed: {0}")]
    TaskFailed(String),
}

impl ProtocolError {
    /// Wrap any displayable error raised by session code
    pub fn handler<E: std::fmt::Display>(err: E) -> Self {
        ProtocolError::Handler(err.to_string())
    }

    /// Whether this error means the transport went away under an active session
    pub fn is_disconnect(&self) -> bool {
        match self {
            ProtocolError::ConnectionLost => true,
            ProtocolError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
