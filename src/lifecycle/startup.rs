//! Startup orchestration.
//!
//! # Design Decisions
//! - Fail fast: a node that is unreachable or never ready is fatal
//! - No retries; the connect timeout is the only bound

use std::time::Duration;

use tokio::time::timeout;

use crate::chain::{ChainError, ChainResult, ConnectionProvider};

/// Wait for `provider` to hand out a ready client, at most `limit`.
pub async fn connect_ready<P: ConnectionProvider>(
    provider: &P,
    endpoint: &str,
    limit: Duration,
) -> ChainResult<P::Client> {
    match timeout(limit, provider.connect(endpoint)).await {
        Ok(Ok(client)) => Ok(client),
        Ok(Err(e)) => {
            tracing::error!(endpoint = %endpoint, error = %e, "Connection failed");
            Err(e)
        }
        Err(_) => {
            tracing::error!(
                endpoint = %endpoint,
                timeout_secs = limit.as_secs(),
                "Node did not become ready in time"
            );
            Err(ChainError::ConnectTimeout(limit.as_secs()))
        }
    }
}
