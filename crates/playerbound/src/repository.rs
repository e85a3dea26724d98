//! Entity repository: three-tier reads and staged, version-checked writes.
//!
//! Reads consult the scope's identity map, then the distributed cache (for
//! cache-eligible types), then the durable store. Writes go straight to the
//! store and stage a cache callback on the entity; the callback runs when
//! the entity is submitted, which is immediate outside a transaction and
//! deferred to the coordinator's commit inside one.

use std::fmt;
use std::sync::Arc;

use playerbound_core::entity::{
    compose_key, submit_callback, Capabilities, CompositeKey, EntityError, KeyValue, PlayerBound,
    Result, Tracked,
};

use crate::cache::EntityCache;
use crate::context::StoreContext;

pub struct EntityRepository<E> {
    context: Arc<StoreContext>,
    cache: EntityCache<E>,
    capabilities: Arc<Capabilities>,
}

impl<E: PlayerBound> EntityRepository<E> {
    pub fn new(
        context: Arc<StoreContext>,
        cache: EntityCache<E>,
        capabilities: Arc<Capabilities>,
    ) -> Self {
        Self {
            context,
            cache,
            capabilities,
        }
    }

    pub fn cache(&self) -> &EntityCache<E> {
        &self.cache
    }

    /// Looks an entity up by owner id and the remaining key values, in the
    /// order they appear in the type's key with the owner column left out.
    pub async fn find_or_none(
        &self,
        owner_id: i64,
        others: Vec<KeyValue>,
    ) -> Result<Option<Tracked<E>>> {
        let key = compose_key(E::NAME, E::table(), owner_id, others)?;
        self.find_by_key(&key).await
    }

    /// Like [`EntityRepository::find_or_none`] but absence is an error.
    pub async fn find(&self, owner_id: i64, others: Vec<KeyValue>) -> Result<Tracked<E>> {
        let key = compose_key(E::NAME, E::table(), owner_id, others)?;
        self.find_by_key(&key)
            .await?
            .ok_or_else(|| EntityError::NotFound {
                entity_type: E::NAME,
                key: key.to_string(),
            })
    }

    async fn find_by_key(&self, key: &CompositeKey) -> Result<Option<Tracked<E>>> {
        let unit_of_work = self.context.unit_of_work();

        if let Some(tracked) = unit_of_work.get_or_none::<E>(key).await {
            tracing::trace!(entity = E::NAME, %key, "Identity map hit");
            tracked.write().await.resolve(&self.capabilities)?;
            return Ok(Some(tracked));
        }

        if E::is_cache_eligible() {
            if let Some(mut entity) = self.cache.get_or_none(key).await? {
                tracing::trace!(entity = E::NAME, %key, "Cache hit");
                entity.resolve(&self.capabilities)?;
                return Ok(Some(self.adopt(entity).await));
            }
            tracing::trace!(entity = E::NAME, %key, "Cache miss");
        }

        let Some(record) = self.context.store().fetch_one(E::table(), key).await? else {
            tracing::trace!(entity = E::NAME, %key, "Not found in store");
            return Ok(None);
        };

        let mut entity = E::from_record(record)?;
        entity.resolve(&self.capabilities)?;
        if E::is_cache_eligible() {
            self.cache.set(&entity).await?;
        }

        Ok(Some(self.adopt(entity).await))
    }

    /// Tracks a freshly materialized entity under its own key. If another
    /// lookup in this scope tracked the key first, that instance wins.
    async fn adopt(&self, entity: E) -> Tracked<E> {
        let key = entity.key();
        self.context
            .unit_of_work()
            .track_or_get(key, Tracked::new(entity))
            .await
    }

    /// Inserts a new entity and stages its write-through.
    pub async fn create(&self, entity: E) -> Result<Tracked<E>> {
        let tracked = Tracked::new(entity);
        self.create_tracked(&tracked).await?;
        Ok(tracked)
    }

    async fn create_tracked(&self, tracked: &Tracked<E>) -> Result<()> {
        let (key, row) = {
            let entity = tracked.read().await;
            (entity.key(), entity.to_row())
        };

        self.context.store().insert(E::table(), row).await?;
        tracing::debug!(entity = E::NAME, %key, "Entity created");

        self.context.unit_of_work().track(key, tracked).await?;
        self.stage_write_through(tracked).await?;
        self.commit_stage(tracked).await
    }

    /// Persists a modified entity. Clean entities are left alone and never
    /// persisted ones are created instead.
    ///
    /// A stale version surfaces as `RepositoryError::ConcurrencyConflict`.
    /// The cached copy is not purged in that case.
    pub async fn update(&self, tracked: &Tracked<E>) -> Result<()> {
        let (key, row, expected_version) = {
            let entity = tracked.read().await;
            let state = entity.state();
            if !state.is_dirty() {
                return Ok(());
            }
            if state.is_first_commit() {
                drop(entity);
                return self.create_tracked(tracked).await;
            }
            (entity.key(), entity.to_row(), state.stored_version())
        };

        self.context
            .unit_of_work()
            .track(key.clone(), tracked)
            .await?;
        self.context
            .store()
            .update_versioned(E::table(), &key, row, expected_version)
            .await?;
        tracing::debug!(entity = E::NAME, %key, expected_version, "Entity updated");

        self.stage_write_through(tracked).await?;
        self.commit_stage(tracked).await
    }

    /// Deletes the entity and stages clearing its cached copy.
    pub async fn delete(&self, tracked: &Tracked<E>) -> Result<()> {
        let (key, expected_version) = {
            let entity = tracked.read().await;
            (entity.key(), entity.state().stored_version())
        };

        self.context
            .store()
            .delete_versioned(E::table(), &key, expected_version)
            .await?;
        tracing::debug!(entity = E::NAME, %key, expected_version, "Entity deleted");

        {
            let mut entity = tracked.write().await;
            let state = entity.state_mut();
            state.touch();
            let callback = E::is_cache_eligible().then(|| {
                let cache = self.cache.clone();
                let key = key.clone();
                submit_callback(move || async move { cache.clear(&key).await })
            });
            state.prepare_to_submit(callback)?;
        }

        self.context.unit_of_work().forget(&key, tracked).await;
        self.commit_stage(tracked).await
    }

    /// Stages a callback writing the entity, as it will be once committed,
    /// to the cache.
    async fn stage_write_through(&self, tracked: &Tracked<E>) -> Result<()> {
        let mut entity = tracked.write().await;

        let callback = if E::is_cache_eligible() {
            // Serialized before staging so the copy carries the committed version.
            let bytes = EntityCache::<E>::serialize(&entity)?;
            let cache = self.cache.clone();
            let key = entity.key();
            Some(submit_callback(move || async move {
                cache.set_serialized(&key, &bytes).await
            }))
        } else {
            None
        };

        entity.state_mut().prepare_to_submit(callback)
    }

    async fn commit_stage(&self, tracked: &Tracked<E>) -> Result<()> {
        if self.context.in_transaction() {
            return Ok(());
        }
        tracked.submit_changes().await
    }
}

impl<E: PlayerBound> fmt::Debug for EntityRepository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRepository")
            .field("entity", &E::NAME)
            .field("context", &self.context)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
