//! Redis Snapshot Cache Adapter
//!
//! Implements the `SnapshotCache` port with `GET` / `SET EX` against Redis.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::domain::ports::SnapshotCache;
use crate::error::{Error, Result};

/// Connection parameters for the cache.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    /// Bound on establishing the first connection
    pub connect_timeout: Duration,
}

impl RedisConfig {
    /// Connection URL for this host and port.
    pub fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "redis".to_string(),
            port: 6379,
            connect_timeout: Duration::from_secs(1),
        }
    }
}

/// Redis-backed snapshot cache.
///
/// The connection manager is created on first use rather than at startup,
/// so the service can come up and serve live snapshots while Redis is down.
/// Once created, the manager reconnects on its own.
pub struct RedisSnapshotCache {
    client: redis::Client,
    manager: Mutex<Option<ConnectionManager>>,
    connect_timeout: Duration,
}

impl RedisSnapshotCache {
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url()).map_err(cache_error)?;

        Ok(Self {
            client,
            manager: Mutex::new(None),
            connect_timeout: config.connect_timeout,
        })
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        let mut slot = self.manager.lock().await;
        if let Some(manager) = slot.as_ref() {
            return Ok(manager.clone());
        }

        let manager = tokio::time::timeout(
            self.connect_timeout,
            ConnectionManager::new(self.client.clone()),
        )
        .await
        .map_err(|_| {
            Error::CacheUnavailable(format!(
                "connect timed out after {:?}",
                self.connect_timeout
            ))
        })?
        .map_err(cache_error)?;

        debug!("Established Redis connection manager");
        *slot = Some(manager.clone());
        Ok(manager)
    }
}

impl std::fmt::Debug for RedisSnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSnapshotCache")
            .field("connection", &self.client.get_connection_info().addr)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

#[async_trait]
impl SnapshotCache for RedisSnapshotCache {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(key)
            .await
            .map_err(cache_error)
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        // SET EX rejects a zero expiry
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(cache_error)
    }
}

fn cache_error(e: redis::RedisError) -> Error {
    Error::CacheUnavailable(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_config_url() {
        let config = RedisConfig {
            host: "cache.internal".to_string(),
            port: 6380,
            ..Default::default()
        };

        assert_eq!(config.url(), "redis://cache.internal:6380/");
        assert_eq!(RedisConfig::default().url(), "redis://redis:6379/");
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_cache_unavailable() {
        let config = RedisConfig {
            host: "127.0.0.1".to_string(),
            port: 1, // Nothing listens here
            connect_timeout: Duration::from_millis(500),
        };
        let cache = RedisSnapshotCache::new(&config).unwrap();

        assert_matches!(cache.get("key").await, Err(Error::CacheUnavailable(_)));
        assert_matches!(
            cache.set("key", "{}".into(), Duration::from_secs(60)).await,
            Err(Error::CacheUnavailable(_))
        );
    }
}
