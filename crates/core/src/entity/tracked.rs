use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{Entity, Result};

/// A live, shared entity instance owned by a unit of work.
///
/// Every clone points at the same instance, so an entity returned from the
/// identity map is the one the repository stages and commits.
pub struct Tracked<E>(Arc<RwLock<E>>);

impl<E> Clone for Tracked<E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<E: Entity> Tracked<E> {
    pub fn new(entity: E) -> Self {
        Self(Arc::new(RwLock::new(entity)))
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, E> {
        self.0.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, E> {
        self.0.write().await
    }

    /// True if both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Identity of the shared instance, stable for its lifetime.
    pub fn instance_id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    /// Runs the staged callback and completes the commit.
    ///
    /// A clean entity is left untouched. If the callback fails the entity
    /// stays dirty and the error is returned.
    pub async fn submit_changes(&self) -> Result<()> {
        let callback = {
            let mut entity = self.0.write().await;
            if !entity.state().is_dirty() {
                return Ok(());
            }
            entity.state_mut().take_submit_callback()
        };

        // The callback may read the entity, so the lock is not held here.
        if let Some(callback) = callback {
            callback().await?;
        }

        self.0.write().await.state_mut().mark_committed();
        Ok(())
    }
}

/// Type-erased view used to submit every tracked entity of a unit of work.
#[async_trait]
pub trait Submit: Send + Sync {
    async fn submit_changes(&self) -> Result<()>;

    fn instance_id(&self) -> usize;
}

#[async_trait]
impl<E: Entity> Submit for Tracked<E> {
    async fn submit_changes(&self) -> Result<()> {
        Tracked::submit_changes(self).await
    }

    fn instance_id(&self) -> usize {
        Tracked::instance_id(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{submit_callback, EntityError, EntityState};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        state: EntityState,
        value: i64,
    }

    impl Counter {
        fn set_value(&mut self, value: i64) {
            self.value = value;
            self.state.touch();
        }
    }

    impl Entity for Counter {
        fn state(&self) -> &EntityState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut EntityState {
            &mut self.state
        }
    }

    fn clean(version: i64) -> Tracked<Counter> {
        Tracked::new(Counter {
            state: EntityState::restored(Utc::now(), version),
            value: 0,
        })
    }

    fn counting_callback(calls: Arc<AtomicUsize>) -> crate::entity::SubmitCallback {
        submit_callback(move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_submit_clean_entity_is_noop() {
        let tracked = clean(2);
        tracked.submit_changes().await.unwrap();

        let entity = tracked.read().await;
        assert_eq!(entity.state().version(), 2);
        assert!(!entity.state().is_dirty());
    }

    #[tokio::test]
    async fn test_submit_runs_callback_and_bumps_version() {
        let tracked = clean(2);
        let calls = Arc::new(AtomicUsize::new(0));
        {
            let mut entity = tracked.write().await;
            entity.set_value(5);
            entity
                .state_mut()
                .prepare_to_submit(Some(counting_callback(calls.clone())))
                .unwrap();
        }

        tracked.submit_changes().await.unwrap();

        let entity = tracked.read().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(entity.state().version(), 3);
        assert!(!entity.state().is_dirty());
        assert!(!entity.state().is_first_commit());
    }

    #[tokio::test]
    async fn test_mutator_dirties_even_with_same_value() {
        let tracked = clean(1);
        tracked.write().await.set_value(0);
        assert!(tracked.read().await.state().is_dirty());
    }

    #[tokio::test]
    async fn test_callback_failure_leaves_entity_dirty() {
        let tracked = clean(1);
        {
            let mut entity = tracked.write().await;
            entity.set_value(9);
            entity
                .state_mut()
                .prepare_to_submit(Some(submit_callback(|| async {
                    Err(EntityError::Serialization("boom".to_string()))
                })))
                .unwrap();
        }

        let result = tracked.submit_changes().await;

        assert!(result.is_err());
        let entity = tracked.read().await;
        assert!(entity.state().is_dirty());
        assert_eq!(entity.state().version(), 1);
    }

    #[tokio::test]
    async fn test_instance_id_distinguishes_instances() {
        let a = clean(1);
        let b = clean(1);

        assert_eq!(a.instance_id(), a.clone().instance_id());
        assert_ne!(a.instance_id(), b.instance_id());
    }

    #[tokio::test]
    async fn test_clones_share_instance() {
        let a = clean(1);
        let b = a.clone();
        b.write().await.set_value(3);

        assert!(a.ptr_eq(&b));
        assert_eq!(a.read().await.value, 3);
    }
}
