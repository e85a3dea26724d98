//! Distributed cache tier for player-bound entities.

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use playerbound_core::cache::{deserialize, entity_key, serialize, CacheError};
use playerbound_core::entity::{CompositeKey, PlayerBound, Result};

use super::CacheKeyspace;

/// Serialized copies of one entity type, keyed by type name and composite key.
///
/// Every failure, serialization included, surfaces as `EntityError::Cache`.
pub struct EntityCache<E> {
    keyspace: CacheKeyspace,
    ttl: Option<Duration>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityCache<E> {
    fn clone(&self) -> Self {
        Self {
            keyspace: self.keyspace.clone(),
            ttl: self.ttl,
            _entity: PhantomData,
        }
    }
}

impl<E: PlayerBound> EntityCache<E> {
    /// `ttl` of `None` never expires.
    pub fn new(keyspace: CacheKeyspace, ttl: Option<Duration>) -> Self {
        Self {
            keyspace,
            ttl,
            _entity: PhantomData,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn keyspace(&self) -> &CacheKeyspace {
        &self.keyspace
    }

    /// Loads a cached copy. The returned entity is clean.
    pub async fn get_or_none(&self, key: &CompositeKey) -> Result<Option<E>> {
        let Some(bytes) = self.keyspace.get(&entity_key(E::NAME, key)).await? else {
            return Ok(None);
        };
        let entity = deserialize::<E>(&bytes).map_err(CacheError::from)?;
        Ok(Some(entity))
    }

    pub fn serialize(entity: &E) -> Result<Vec<u8>> {
        Ok(serialize(entity).map_err(CacheError::from)?)
    }

    pub async fn set(&self, entity: &E) -> Result<()> {
        let bytes = Self::serialize(entity)?;
        self.set_serialized(&entity.key(), &bytes).await
    }

    pub async fn set_serialized(&self, key: &CompositeKey, bytes: &[u8]) -> Result<()> {
        self.keyspace
            .set(&entity_key(E::NAME, key), bytes, self.ttl)
            .await?;
        Ok(())
    }

    pub async fn clear(&self, key: &CompositeKey) -> Result<()> {
        self.keyspace.delete(&entity_key(E::NAME, key)).await?;
        Ok(())
    }
}

impl<E: PlayerBound> fmt::Debug for EntityCache<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCache")
            .field("entity", &E::NAME)
            .field("keyspace", &self.keyspace)
            .field("ttl", &self.ttl)
            .finish()
    }
}
