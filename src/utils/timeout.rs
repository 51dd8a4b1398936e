//! Async timeout helpers

use std::future::Future;
use std::time::Duration;

use crate::error::{ProtocolError, Result};

/// Default bound on establishing a connection (TCP connect plus TLS handshake)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default minimum spacing between outbound lines
pub const DEFAULT_FLOOD_DELAY: Duration = Duration::from_secs(1);

/// Run a fallible future, failing with [`ProtocolError::Timeout`] if it does
/// not finish within `duration`
pub async fn with_timeout_error<F, T>(future: F, duration: Duration) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(ProtocolError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_elapses() {
        let result: Result<()> = with_timeout_error(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, ProtocolError>(())
            },
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(result, Err(ProtocolError::Timeout)));
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let result: Result<()> = with_timeout_error(
            async { Err::<(), _>(ProtocolError::ConnectionLost) },
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(result, Err(ProtocolError::ConnectionLost)));
    }
}
