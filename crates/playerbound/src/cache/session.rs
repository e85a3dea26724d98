use std::time::Duration;

use playerbound_core::cache::{deserialize, serialize, session_key, CacheError};
use playerbound_core::entity::Result;
use playerbound_core::player::Session;

use super::CacheKeyspace;

/// The active session per player, expiring after `ttl`.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    keyspace: CacheKeyspace,
    ttl: Duration,
}

impl SessionRepository {
    pub fn new(keyspace: CacheKeyspace, ttl: Duration) -> Self {
        Self { keyspace, ttl }
    }

    pub async fn get(&self, player_id: i64) -> Result<Option<Session>> {
        let Some(bytes) = self.keyspace.get(&session_key(player_id)).await? else {
            return Ok(None);
        };
        let session = deserialize(&bytes).map_err(CacheError::from)?;
        Ok(Some(session))
    }

    pub async fn set(&self, player_id: i64, session: &Session) -> Result<()> {
        let bytes = serialize(session).map_err(CacheError::from)?;
        self.keyspace
            .set(&session_key(player_id), &bytes, Some(self.ttl))
            .await?;
        tracing::debug!(player_id, "Session stored");
        Ok(())
    }
}
