use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, instrument};

use crate::error::{ProtocolError, Result};
use crate::transport::Connector;
use crate::utils::timeout::{with_timeout_error, DEFAULT_TIMEOUT};

/// Plaintext TCP connector
#[derive(Debug, Clone)]
pub struct PlainConnector {
    connect_timeout: Duration,
}

impl PlainConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for PlainConnector {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Connector for PlainConnector {
    type Stream = TcpStream;

    async fn connect(&self, host: &str, port: u16) -> Result<TcpStream> {
        connect_tcp(host, port, self.connect_timeout).await
    }
}

/// Open a TCP connection with Nagle disabled, bounded by `timeout`
#[instrument(skip(timeout))]
pub async fn connect_tcp(host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let stream = with_timeout_error(
        async { Ok::<_, ProtocolError>(TcpStream::connect((host, port)).await?) },
        timeout,
    )
    .await?;

    stream.set_nodelay(true)?;
    debug!(peer = ?stream.peer_addr().ok(), "TCP connection established");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_plain_connect_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let connector = PlainConnector::default();
        let (client, accepted) = tokio::join!(connector.connect("127.0.0.1", port), listener.accept());
        assert!(client.is_ok());
        assert!(accepted.is_ok());
    }

    #[tokio::test]
    async fn test_plain_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = PlainConnector::default().connect("127.0.0.1", port).await;
        assert!(result.is_err());
    }
}
