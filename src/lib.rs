//! # linewire
//!
//! Line framing, flood protection and connection orchestration for
//! IRC-style text protocols over plaintext or TLS byte streams.
//!
//! ## Layers
//! - [`core`]: [`LineCodec`] splits arbitrarily chunked bytes into [`Frame`]s
//! - [`protocol`]: applies a caller-supplied [`MessageCodec`] to frames and
//!   outbound messages
//! - [`utils::flood`]: [`FloodProtector`] spaces outbound lines
//! - [`transport`]: plaintext and TLS [`Connector`](transport::Connector)s
//! - [`service`]: runs init, inbound and outbound as one unit per connection
//!
//! ## Example
//! ```rust,no_run
//! use futures::{future, sink, stream, StreamExt};
//! use linewire::config::ClientConfig;
//! use linewire::error::ProtocolError;
//! use linewire::protocol::RawCodec;
//! use linewire::service::{connect_plain, Handlers};
//!
//! # async fn demo() {
//! let config = ClientConfig {
//!     host: "irc.example.net".into(),
//!     ..ClientConfig::default()
//! };
//!
//! let consumer = sink::unfold((), |(), line: String| async move {
//!     println!("<< {line}");
//!     Ok::<_, ProtocolError>(())
//! });
//! let producer = stream::iter(vec![
//!     "NICK linewire".to_string(),
//!     "USER linewire 0 * :linewire".to_string(),
//! ])
//! .map(Ok::<_, ProtocolError>)
//! .chain(stream::pending());
//!
//! // Returns when the connection drops; reconnecting is up to the caller
//! connect_plain(&config, RawCodec, Handlers::new(future::pending::<linewire::Result<()>>(), consumer, producer)).await;
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use crate::core::codec::LineCodec;
pub use crate::core::frame::Frame;
pub use error::{ProtocolError, Result};
pub use protocol::{MessageCodec, RawCodec};
pub use utils::flood::FloodProtector;
