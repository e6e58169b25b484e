use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Script;

use super::RateLimitStore;
use crate::error::StoreError;

/// INCR and EXPIRE in one server-side step. The expiry is only set when the
/// key has none, so later increments do not stretch the window.
const INCREMENT_SCRIPT: &str = r"
local count = redis.call('INCR', KEYS[1])
if redis.call('TTL', KEYS[1]) < 0 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
";

/// Counter store shared by every gateway instance through Redis.
///
/// Each call is a single round trip. Failures are returned as-is; nothing is
/// retried here.
pub struct RedisStore {
    connection: ConnectionManager,
    increment: Script,
}

impl RedisStore {
    /// Connects to `url` and checks the server answers `PING`.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(|e| {
            tracing::warn!("Failed to create Redis client for rate limiting: {e}");
            StoreError::from(e)
        })?;

        let connection = ConnectionManager::new(client).await.map_err(|e| {
            tracing::warn!("Failed to connect to Redis for rate limiting: {e}");
            StoreError::from(e)
        })?;

        let mut conn = connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        tracing::debug!("Connected to Redis for rate limiting");
        Ok(Self::from_connection(connection))
    }

    pub fn from_connection(connection: ConnectionManager) -> Self {
        Self {
            connection,
            increment: Script::new(INCREMENT_SCRIPT),
        }
    }
}

/// Redis expiries are whole seconds and must be positive.
fn window_secs(window: Duration) -> u64 {
    window.as_secs().max(1)
}

#[async_trait]
impl RateLimitStore for RedisStore {
    async fn increment(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        let mut conn = self.connection.clone();
        let count: u64 = self
            .increment
            .key(key)
            .arg(window_secs(window))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                tracing::error!("Redis increment failed for {key}: {e}");
                StoreError::from(e)
            })?;
        Ok(count)
    }

    async fn get_count(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.connection.clone();
        let count: Option<u64> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                tracing::error!("Redis GET failed for {key}: {e}");
                StoreError::from(e)
            })?;
        Ok(count.unwrap_or(0))
    }
}
