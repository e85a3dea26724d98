//! Per-scope identity map.
//!
//! Guarantees at most one live instance per entity key within a request
//! scope, and remembers every instance the scope touched so the transaction
//! coordinator can submit them after commit.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use playerbound_core::entity::{CompositeKey, EntityError, PlayerBound, Result, Submit, Tracked};

type IdentityKey = (&'static str, CompositeKey);

#[derive(Default)]
struct Inner {
    identity: HashMap<IdentityKey, Box<dyn Any + Send + Sync>>,
    tracked: Vec<Arc<dyn Submit>>,
}

impl Inner {
    fn enlist<E: PlayerBound>(&mut self, entity: &Tracked<E>) {
        let id = entity.instance_id();
        if !self.tracked.iter().any(|t| t.instance_id() == id) {
            self.tracked.push(Arc::new(entity.clone()));
        }
    }
}

/// Identity map of the entities loaded or created in one scope.
#[derive(Default)]
pub struct UnitOfWork {
    inner: Mutex<Inner>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tracked instance for `key`, if any.
    pub async fn get_or_none<E: PlayerBound>(&self, key: &CompositeKey) -> Option<Tracked<E>> {
        let inner = self.inner.lock().await;
        inner
            .identity
            .get(&(E::NAME, key.clone()))
            .and_then(|entry| entry.downcast_ref::<Tracked<E>>())
            .cloned()
    }

    /// Registers a freshly loaded `entity` under `key`, unless another
    /// instance got there first, in which case that instance is returned and
    /// `entity` is discarded. Concurrent lookups of one key in a scope thus
    /// all end up with the same live instance.
    pub async fn track_or_get<E: PlayerBound>(
        &self,
        key: CompositeKey,
        entity: Tracked<E>,
    ) -> Tracked<E> {
        let mut inner = self.inner.lock().await;

        if let Some(existing) = inner
            .identity
            .get(&(E::NAME, key.clone()))
            .and_then(|entry| entry.downcast_ref::<Tracked<E>>())
        {
            return existing.clone();
        }

        tracing::trace!(entity = E::NAME, %key, "Tracking entity");
        inner
            .identity
            .insert((E::NAME, key), Box::new(entity.clone()));
        inner.enlist(&entity);
        entity
    }

    /// Registers `entity` under `key` before it is written.
    ///
    /// Tracking the same instance twice is a no-op. Tracking a different
    /// instance under a key that is already taken fails.
    pub async fn track<E: PlayerBound>(
        &self,
        key: CompositeKey,
        entity: &Tracked<E>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if let Some(existing) = inner
            .identity
            .get(&(E::NAME, key.clone()))
            .and_then(|entry| entry.downcast_ref::<Tracked<E>>())
        {
            if existing.ptr_eq(entity) {
                return Ok(());
            }
            return Err(EntityError::InvalidOperation(format!(
                "another {} instance is already tracked for key {key}",
                E::NAME
            )));
        }

        tracing::trace!(entity = E::NAME, %key, "Tracking entity");
        inner
            .identity
            .insert((E::NAME, key), Box::new(entity.clone()));
        inner.enlist(entity);
        Ok(())
    }

    /// Drops `key` from the identity map while keeping `entity` enlisted
    /// for submission. Used after a delete.
    pub async fn forget<E: PlayerBound>(&self, key: &CompositeKey, entity: &Tracked<E>) {
        let mut inner = self.inner.lock().await;
        inner.identity.remove(&(E::NAME, key.clone()));
        inner.enlist(entity);
    }

    /// Every instance touched in this scope, in the order first seen.
    pub async fn tracked(&self) -> Vec<Arc<dyn Submit>> {
        self.inner.lock().await.tracked.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.identity.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
