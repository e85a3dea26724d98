use playerbound_core::cache::PLAYER_ID_KEY;
use playerbound_core::entity::Result;

use super::CacheKeyspace;

/// Allocates player ids from a counter in the persistent cache.
#[derive(Debug, Clone)]
pub struct PlayerIdRepository {
    keyspace: CacheKeyspace,
}

impl PlayerIdRepository {
    pub fn new(keyspace: CacheKeyspace) -> Self {
        Self { keyspace }
    }

    /// Returns the next unused player id. The first id is 1.
    pub async fn next_id(&self) -> Result<i64> {
        let id = self.keyspace.incr(PLAYER_ID_KEY, 1, None).await?;
        tracing::debug!(player_id = id, "Allocated player id");
        Ok(id)
    }
}
