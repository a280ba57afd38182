//! Redis connector
//!
//! Commands go through an [`redis::aio::ConnectionManager`], which handles
//! reconnection transparently. Pub/sub needs a dedicated connection; use
//! [`client`] to build one.

use tracing::info;

use crate::common::{DatabaseError, DatabaseResult, RetryConfig, retry, retry_with_backoff};

pub use redis::aio::ConnectionManager;
pub use redis::{AsyncCommands, Client, RedisResult};

/// Connect to Redis and return a ConnectionManager
///
/// The manager is verified with a PING before being returned.
pub async fn connect(url: &str) -> redis::RedisResult<ConnectionManager> {
    info!("Attempting to connect to Redis at {}", url);

    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;

    let mut conn = manager.clone();
    let _: String = redis::cmd("PING").query_async(&mut conn).await?;

    info!("Successfully connected to Redis");
    Ok(manager)
}

/// Connect to Redis with automatic retry on failure
pub async fn connect_with_retry(
    url: &str,
    retry_config: Option<RetryConfig>,
) -> redis::RedisResult<ConnectionManager> {
    let url_owned = url.to_string();

    match retry_config {
        Some(config) => retry_with_backoff(|| connect(&url_owned), config).await,
        None => retry(|| connect(&url_owned)).await,
    }
}

/// Build a bare client for connections the manager cannot provide
/// (pub/sub subscriptions need their own connection).
pub fn client(url: &str) -> redis::RedisResult<Client> {
    Client::open(url)
}

/// Verify the connection is alive
pub async fn check_health(manager: &ConnectionManager) -> DatabaseResult<()> {
    let mut conn = manager.clone();
    let _: String = redis::cmd("PING")
        .query_async(&mut conn)
        .await
        .map_err(|e| DatabaseError::HealthCheckFailed(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires actual Redis
    async fn test_connect() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let manager = connect(&redis_url).await.unwrap();
        check_health(&manager).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires actual Redis
    async fn test_pubsub_client() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let client = client(&redis_url).unwrap();
        let mut pubsub = client.get_async_pubsub().await.unwrap();
        pubsub.subscribe("job:test:control").await.unwrap();
    }
}
