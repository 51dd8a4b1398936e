//! # Client Sessions
//!
//! Connect-and-run entry points for one connection at a time.
//!
//! [`connect_plain`] and [`connect_tls`] differ only in the
//! [`Connector`](crate::transport::Connector) they hand to [`connect_with`];
//! the session itself is [`run_session`].

pub mod client;
pub mod session;

pub use client::{connect, connect_plain, connect_tls, connect_with};
pub use session::{run_session, Activity, Handlers, SessionState};
