use std::time::Duration;

use async_trait::async_trait;

use super::{ReadPreference, Result};

/// Distributed cache collaborator: opaque string keys, byte values, TTLs.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a value from the cache, biased toward a replica or the primary.
    async fn get(&self, key: &str, preference: ReadPreference) -> Result<Option<Vec<u8>>>;

    /// Sets a value in the cache with an optional TTL. `None` never expires.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Deletes a value from the cache by key.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Atomically increments an integer counter, creating it at zero first.
    /// When `ttl` is set the counter's expiry is refreshed.
    async fn incr(&self, key: &str, delta: i64, ttl: Option<Duration>) -> Result<i64>;
}
