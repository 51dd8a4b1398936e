//! # Session Orchestration
//!
//! Runs one established connection as three concurrent activities:
//!
//! - **init**: the caller's initialization future, run once
//! - **inbound**: read half -> [`EventDecoder`] -> consumer sink
//! - **outbound**: producer stream -> optional [`FloodProtector`] ->
//!   [`MessageEncoder`] -> write half
//!
//! The activities are tasks in one [`JoinSet`]. Whichever settles first,
//! by success, error or panic, ends the session: the other two are aborted
//! and joined, and only then is the connection dropped. Nothing is drained or
//! flushed after that point and no activity is restarted.
//!
//! The inbound side treats end of input as [`ProtocolError::ConnectionLost`];
//! a live session never expects the peer to stop talking.
//!
//! Every outcome is absorbed here. Callers own reconnect policy and simply
//! run a new session when one ends.

use futures::{FutureExt, Sink, Stream, StreamExt};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinSet;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, instrument, trace};

use crate::error::{constants, ProtocolError, Result};
use crate::protocol::codec::MessageCodec;
use crate::protocol::decoder::{guard_end_of_input, EventDecoder};
use crate::protocol::encoder::MessageEncoder;
use crate::utils::flood::{throttle, FloodProtector};

/// Lifecycle of one connection run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Active,
    Terminating,
    Closed,
}

impl SessionState {
    pub(crate) fn enter(self, next: SessionState) -> SessionState {
        debug!(from = ?self, to = ?next, "Session state transition");
        next
    }
}

/// The three concurrent activities of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Init,
    Inbound,
    Outbound,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Activity::Init => "init",
            Activity::Inbound => "inbound",
            Activity::Outbound => "outbound",
        })
    }
}

/// Caller-supplied parts of a session.
///
/// - `init`: runs once alongside the pipelines. Its completion, successful
///   or not, ends the session like any other activity, so an init that
///   should not end the session must stay pending.
/// - `consumer`: receives every decoded event in order.
/// - `producer`: yields outbound messages; when it ends, the session ends.
pub struct Handlers<I, K, P> {
    pub init: I,
    pub consumer: K,
    pub producer: P,
}

impl<I, K, P> Handlers<I, K, P> {
    pub fn new(init: I, consumer: K, producer: P) -> Self {
        Self {
            init,
            consumer,
            producer,
        }
    }
}

type Settled = (Activity, Result<()>);

/// Run an activity, turning a panic into an ordinary failure of that activity
async fn supervised<F>(activity: Activity, work: F) -> Settled
where
    F: Future<Output = Result<()>>,
{
    let outcome = match AssertUnwindSafe(work).catch_unwind().await {
        Ok(result) => result,
        Err(_) => Err(ProtocolError::TaskFailed(format!(
            "{} ({activity})",
            constants::ERR_TASK_PANICKED
        ))),
    };
    (activity, outcome)
}

async fn run_inbound<R, C, K>(reader: R, codec: C, consumer: K) -> Result<()>
where
    R: AsyncRead + Unpin,
    C: MessageCodec,
    K: Sink<C::Event, Error = ProtocolError>,
{
    let events = FramedRead::new(reader, EventDecoder::new(codec));
    guard_end_of_input(events).forward(consumer).await
}

async fn run_outbound<W, C, P>(
    writer: W,
    codec: C,
    producer: P,
    flood: Option<Arc<FloodProtector>>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
    C: MessageCodec,
    P: Stream<Item = Result<C::Message>>,
{
    let lines = FramedWrite::new(writer, MessageEncoder::new(codec));
    match flood {
        Some(protector) => throttle(producer, protector).forward(lines).await,
        None => producer.forward(lines).await,
    }
}

/// Run a session over an established connection until its first activity
/// settles.
///
/// Never fails: transport errors, the connection-lost signal, and errors or
/// panics from `handlers` all end the session the same way. The connection
/// is released exactly once, after all three activities have stopped.
#[instrument(skip_all)]
pub async fn run_session<T, C, I, K, P>(
    stream: T,
    codec: C,
    handlers: Handlers<I, K, P>,
    flood: Option<Arc<FloodProtector>>,
) where
    T: AsyncRead + AsyncWrite + Send + 'static,
    C: MessageCodec,
    I: Future<Output = Result<()>> + Send + 'static,
    K: Sink<C::Event, Error = ProtocolError> + Send + 'static,
    P: Stream<Item = Result<C::Message>> + Send + 'static,
{
    let Handlers {
        init,
        consumer,
        producer,
    } = handlers;

    let (reader, writer) = tokio::io::split(stream);

    let mut activities: JoinSet<Settled> = JoinSet::new();
    activities.spawn(supervised(Activity::Init, init));
    activities.spawn(supervised(
        Activity::Inbound,
        run_inbound(reader, codec.clone(), consumer),
    ));
    activities.spawn(supervised(
        Activity::Outbound,
        run_outbound(writer, codec, producer, flood),
    ));

    let first = activities.join_next().await;
    let state = SessionState::Active.enter(SessionState::Terminating);

    match first {
        Some(Ok((activity, Ok(())))) => debug!(%activity, "Session activity finished"),
        Some(Ok((activity, Err(e)))) => debug!(%activity, error = %e, "Session activity failed"),
        Some(Err(e)) => debug!(error = %e, "{}", constants::ERR_TASK_CANCELLED),
        None => {}
    }

    activities.abort_all();
    while let Some(rest) = activities.join_next().await {
        if let Ok((activity, outcome)) = rest {
            trace!(%activity, ok = outcome.is_ok(), "Activity settled during shutdown");
        }
    }

    // Every task owning a half of the connection has been dropped by now
    state.enter(SessionState::Closed);
}
