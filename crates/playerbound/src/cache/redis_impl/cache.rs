//! Redis-backed distributed cache.
//!
//! Writes always go to the primary. Reads go to the replica when the caller
//! prefers one and a replica is configured, otherwise to the primary.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use playerbound_core::cache::{Cache, ReadPreference, Result};

use super::error::map_redis_error;

/// Redis cache with an optional read replica.
///
/// Connection managers reconnect on their own and are cheap to clone, so
/// every call works on a clone.
pub struct RedisCache {
    primary: ConnectionManager,
    replica: Option<ConnectionManager>,
}

impl RedisCache {
    /// Connects to the primary and, if given, a read replica.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if either node is unreachable.
    pub async fn new(url: &str, replica_url: Option<&str>) -> Result<Self> {
        let primary = connect(url).await?;
        let replica = match replica_url {
            Some(url) => Some(connect(url).await?),
            None => None,
        };
        tracing::debug!(replica = replica.is_some(), "Connected to redis");
        Ok(Self { primary, replica })
    }

    fn node_for(&self, preference: ReadPreference) -> ConnectionManager {
        match (preference, &self.replica) {
            (ReadPreference::PreferReplica, Some(replica)) => replica.clone(),
            _ => self.primary.clone(),
        }
    }
}

async fn connect(url: &str) -> Result<ConnectionManager> {
    let client = redis::Client::open(url).map_err(map_redis_error)?;
    ConnectionManager::new(client)
        .await
        .map_err(map_redis_error)
}

/// Redis expirations have whole-second resolution; anything shorter
/// becomes one second.
fn expiry_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str, preference: ReadPreference) -> Result<Option<Vec<u8>>> {
        self.node_for(preference)
            .get(key)
            .await
            .map_err(map_redis_error)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let mut primary = self.primary.clone();
        match ttl {
            Some(ttl) => primary.set_ex::<_, _, ()>(key, value, expiry_seconds(ttl)).await,
            None => primary.set::<_, _, ()>(key, value).await,
        }
        .map_err(map_redis_error)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.primary
            .clone()
            .del::<_, ()>(key)
            .await
            .map_err(map_redis_error)
    }

    async fn incr(&self, key: &str, delta: i64, ttl: Option<Duration>) -> Result<i64> {
        let mut primary = self.primary.clone();
        let counter: i64 = primary.incr(key, delta).await.map_err(map_redis_error)?;

        if let Some(ttl) = ttl {
            primary
                .expire::<_, ()>(key, expiry_seconds(ttl) as i64)
                .await
                .map_err(map_redis_error)?;
        }

        Ok(counter)
    }
}
