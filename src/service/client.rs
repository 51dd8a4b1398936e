use futures::{Sink, Stream};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::error::{ProtocolError, Result};
use crate::protocol::codec::MessageCodec;
use crate::service::session::{run_session, Handlers, SessionState};
use crate::transport::tcp::PlainConnector;
use crate::transport::tls::{TlsClientConfig, TlsConnector};
use crate::transport::Connector;
use crate::utils::flood::FloodProtector;

/// Connect with `connector` and run one session to completion.
///
/// Shared by the plaintext and TLS entry points. A failed connect ends the
/// call the same way a finished session does: quietly, with nothing to
/// return.
#[instrument(skip(connector, codec, handlers, flood))]
pub async fn connect_with<N, C, I, K, P>(
    connector: &N,
    host: &str,
    port: u16,
    codec: C,
    handlers: Handlers<I, K, P>,
    flood: Option<Arc<FloodProtector>>,
) where
    N: Connector,
    C: MessageCodec,
    I: Future<Output = Result<()>> + Send + 'static,
    K: Sink<C::Event, Error = ProtocolError> + Send + 'static,
    P: Stream<Item = Result<C::Message>> + Send + 'static,
{
    let state = SessionState::Connecting;

    match connector.connect(host, port).await {
        Ok(stream) => {
            state.enter(SessionState::Active);
            run_session(stream, codec, handlers, flood).await;
        }
        Err(e) => {
            debug!(error = %e, "Connect failed");
            state.enter(SessionState::Closed);
        }
    }
}

/// Run one plaintext session against `config.host:config.port`
pub async fn connect_plain<C, I, K, P>(config: &ClientConfig, codec: C, handlers: Handlers<I, K, P>)
where
    C: MessageCodec,
    I: Future<Output = Result<()>> + Send + 'static,
    K: Sink<C::Event, Error = ProtocolError> + Send + 'static,
    P: Stream<Item = Result<C::Message>> + Send + 'static,
{
    let connector = PlainConnector::new(config.connect_timeout);
    connect_with(
        &connector,
        &config.host,
        config.port,
        codec,
        handlers,
        config.flood_protector(),
    )
    .await;
}

/// Run one TLS session against `config.host:config.port`.
///
/// An unusable TLS configuration (unreadable certificate files and the like)
/// ends the call before connecting.
pub async fn connect_tls<C, I, K, P>(
    config: &ClientConfig,
    tls: &TlsClientConfig,
    codec: C,
    handlers: Handlers<I, K, P>,
) where
    C: MessageCodec,
    I: Future<Output = Result<()>> + Send + 'static,
    K: Sink<C::Event, Error = ProtocolError> + Send + 'static,
    P: Stream<Item = Result<C::Message>> + Send + 'static,
{
    let connector = match TlsConnector::new(tls, config.connect_timeout) {
        Ok(connector) => connector,
        Err(e) => {
            debug!(error = %e, "TLS configuration rejected");
            SessionState::Connecting.enter(SessionState::Closed);
            return;
        }
    };

    connect_with(
        &connector,
        &config.host,
        config.port,
        codec,
        handlers,
        config.flood_protector(),
    )
    .await;
}

/// Run one session, plaintext or TLS as `config.tls` says.
///
/// The TLS settings come from the TLS fields of `config`; see
/// [`TlsClientConfig::from_client_config`].
pub async fn connect<C, I, K, P>(config: &ClientConfig, codec: C, handlers: Handlers<I, K, P>)
where
    C: MessageCodec,
    I: Future<Output = Result<()>> + Send + 'static,
    K: Sink<C::Event, Error = ProtocolError> + Send + 'static,
    P: Stream<Item = Result<C::Message>> + Send + 'static,
{
    if config.tls {
        let tls = TlsClientConfig::from_client_config(config);
        connect_tls(config, &tls, codec, handlers).await;
    } else {
        connect_plain(config, codec, handlers).await;
    }
}
