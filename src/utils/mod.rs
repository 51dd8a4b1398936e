//! # Utility Modules
//!
//! Supporting utilities for rate limiting, logging, and timing.
//!
//! ## Components
//! - **Flood**: minimum-spacing gate for outbound lines
//! - **Logging**: `tracing-subscriber` setup driven by [`LoggingConfig`](crate::config::LoggingConfig)
//! - **Timeout**: async timeout wrappers and default durations

pub mod flood;
pub mod logging;
pub mod timeout;

pub use flood::{throttle, FloodProtector};
