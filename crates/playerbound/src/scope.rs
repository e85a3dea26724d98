//! Per-request wiring.
//!
//! A [`RequestScope`] owns one store connection with its identity map, the
//! transaction manager over it, and fresh repositories whose read routing
//! starts over. It is never shared between concurrent requests.

use std::sync::Arc;

use playerbound_core::cache::{PLAYER_ID_DATA_NAME, SESSION_DATA_NAME};
use playerbound_core::entity::{PlayerBound, Result};
use playerbound_core::player::{PlayerAuth, PlayerBasic, UidHasher};

use crate::cache::{CacheKeyspace, PlayerIdRepository, SessionRepository};
use crate::context::StoreContext;
use crate::repository::EntityRepository;
use crate::state::AppState;
use crate::transaction::{TransactionCoordinator, TransactionManager};

pub struct RequestScope {
    state: AppState,
    context: Arc<StoreContext>,
    transactions: TransactionManager,
    pub auth: EntityRepository<PlayerAuth>,
    pub basics: EntityRepository<PlayerBasic>,
    pub sessions: SessionRepository,
    pub player_ids: PlayerIdRepository,
}

impl RequestScope {
    /// Connects to the durable store and builds the scope's repositories.
    pub async fn open(state: &AppState) -> Result<Self> {
        let store = state.connector.connect().await?;
        let context = StoreContext::new(store);
        let environment = state.registry.environment();

        let sessions = SessionRepository::new(
            CacheKeyspace::new(state.cache.clone(), environment, SESSION_DATA_NAME),
            state.session_ttl,
        );
        let player_ids = PlayerIdRepository::new(CacheKeyspace::new(
            state.persistent_cache.clone(),
            environment,
            PLAYER_ID_DATA_NAME,
        ));

        Ok(Self {
            auth: Self::build_repository(state, &context)?,
            basics: Self::build_repository(state, &context)?,
            transactions: TransactionManager::new(vec![context.clone()]),
            state: state.clone(),
            context,
            sessions,
            player_ids,
        })
    }

    fn build_repository<E: PlayerBound>(
        state: &AppState,
        context: &Arc<StoreContext>,
    ) -> Result<EntityRepository<E>> {
        Ok(EntityRepository::new(
            Arc::clone(context),
            state.registry.entity_cache::<E>(state.cache.clone())?,
            state.capabilities.clone(),
        ))
    }

    /// Builds a repository for any registered type on this scope's
    /// connection. Each call starts with its own read routing.
    pub fn repository<E: PlayerBound>(&self) -> Result<EntityRepository<E>> {
        Self::build_repository(&self.state, &self.context)
    }

    pub fn hasher(&self) -> Result<Arc<dyn UidHasher>> {
        self.state.hasher()
    }

    pub fn context(&self) -> &Arc<StoreContext> {
        &self.context
    }

    /// Returns the open transaction or begins one.
    pub async fn begin_transaction(&self) -> Result<Arc<TransactionCoordinator>> {
        self.transactions.begin_transaction().await
    }

    /// Ends the scope, rolling back a transaction that was never committed.
    pub async fn dispose(self) -> Result<()> {
        self.transactions.dispose().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{at, sqlite_state as app_state};
    use chrono::{DateTime, Utc};
    use playerbound_core::cache::{Cache, ReadPreference};
    use playerbound_core::entity::{Entity, EntityError, Tracked};
    use playerbound_core::storage::RepositoryError;

    type BasicFields = (
        i64,
        String,
        i64,
        i64,
        DateTime<Utc>,
        DateTime<Utc>,
        DateTime<Utc>,
        i64,
    );

    async fn basic_fields(basic: &Tracked<PlayerBasic>) -> BasicFields {
        let basic = basic.read().await;
        (
            basic.player_id(),
            basic.name().to_string(),
            basic.stamina(),
            basic.tutorial_progress(),
            basic.last_stamina_updated_at(),
            basic.last_login(),
            basic.state().created_at(),
            basic.state().version(),
        )
    }

    async fn auth_fields(auth: &Tracked<PlayerAuth>) -> (i64, String, String, DateTime<Utc>, i64) {
        let auth = auth.read().await;
        (
            auth.player_id(),
            auth.device_id().to_string(),
            auth.player_uid_hash().to_string(),
            auth.state().created_at(),
            auth.state().version(),
        )
    }

    #[tokio::test]
    async fn test_committed_transaction_is_visible_to_next_scope() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(&dir).await;

        let scope = RequestScope::open(&state).await.unwrap();
        let transaction = scope.begin_transaction().await.unwrap();
        scope
            .basics
            .create(PlayerBasic::create(1, "Alice", at(9)))
            .await
            .unwrap();
        transaction.commit().await.unwrap();
        scope.dispose().await.unwrap();

        let next = RequestScope::open(&state).await.unwrap();
        let basic = next.basics.find(1, vec![]).await.unwrap();
        assert_eq!(basic.read().await.state().version(), 1);
    }

    #[tokio::test]
    async fn test_disposed_without_commit_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(&dir).await;

        let scope = RequestScope::open(&state).await.unwrap();
        scope.begin_transaction().await.unwrap();
        let created = scope
            .basics
            .create(PlayerBasic::create(1, "Alice", at(9)))
            .await
            .unwrap();
        scope.dispose().await.unwrap();

        assert!(created.read().await.state().is_staged());
        let next = RequestScope::open(&state).await.unwrap();
        assert!(next.basics.find_or_none(1, vec![]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_scopes_conflict_on_stale_version() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(&dir).await;

        let setup = RequestScope::open(&state).await.unwrap();
        setup
            .basics
            .create(PlayerBasic::create(1, "Alice", at(9)))
            .await
            .unwrap();

        let left = RequestScope::open(&state).await.unwrap();
        let right = RequestScope::open(&state).await.unwrap();
        let left_basic = left.basics.find(1, vec![]).await.unwrap();
        let right_basic = right.basics.find(1, vec![]).await.unwrap();

        left_basic.write().await.set_stamina(5, at(10));
        left.basics.update(&left_basic).await.unwrap();

        right_basic.write().await.set_stamina(7, at(11));
        let result = right.basics.update(&right_basic).await;

        assert!(matches!(
            result,
            Err(EntityError::Repository(
                RepositoryError::ConcurrencyConflict { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn test_repository_for_unregistered_type_fails() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(&dir).await;
        let scope = RequestScope::open(&state).await.unwrap();

        assert!(scope.repository::<crate::testing::Deck>().is_err());
        assert!(scope.repository::<PlayerBasic>().is_ok());
    }

    #[tokio::test]
    async fn test_created_records_read_back_identically_from_cache_and_store() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(&dir).await;

        let scope = RequestScope::open(&state).await.unwrap();
        let transaction = scope.begin_transaction().await.unwrap();
        let mut basic = PlayerBasic::create(1, "Alice", at(9));
        basic.set_tutorial_progress(3);
        basic.set_stamina(7, at(10));
        basic.set_last_login(at(11));
        let basic = scope.basics.create(basic).await.unwrap();
        let auth = PlayerAuth::create(1, "dev-1", "uid-1", scope.hasher().unwrap(), at(9)).unwrap();
        let auth = scope.auth.create(auth).await.unwrap();
        transaction.commit().await.unwrap();
        scope.dispose().await.unwrap();

        let expected_basic = basic_fields(&basic).await;
        let expected_auth = auth_fields(&auth).await;
        assert_eq!(expected_basic.7, 1);
        assert_eq!(expected_auth.4, 1);

        // Same cache as the writer: served from the cache tier.
        let warm = RequestScope::open(&state).await.unwrap();
        let warm_basic = warm.basics.find(1, vec![]).await.unwrap();
        let warm_auth = warm.auth.find(1, vec!["dev-1".into()]).await.unwrap();
        assert_eq!(basic_fields(&warm_basic).await, expected_basic);
        assert_eq!(auth_fields(&warm_auth).await, expected_auth);

        // Fresh cache over the same database: served from the store.
        let cold_state = app_state(&dir).await;
        assert!(cold_state
            .cache
            .get("test:cache:playerbasic:1", ReadPreference::PreferPrimary)
            .await
            .unwrap()
            .is_none());
        let cold = RequestScope::open(&cold_state).await.unwrap();
        let cold_basic = cold.basics.find(1, vec![]).await.unwrap();
        let cold_auth = cold.auth.find(1, vec!["dev-1".into()]).await.unwrap();
        assert_eq!(basic_fields(&cold_basic).await, expected_basic);
        assert_eq!(auth_fields(&cold_auth).await, expected_auth);
        assert!(cold_auth.read().await.verify("uid-1").unwrap());
    }

    #[tokio::test]
    async fn test_device_id_lookup_ignores_case_in_every_tier() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(&dir).await;

        let setup = RequestScope::open(&state).await.unwrap();
        let hasher = setup.hasher().unwrap();
        setup
            .auth
            .create(PlayerAuth::create(1, "dev-1", "uid-1", hasher.clone(), at(9)).unwrap())
            .await
            .unwrap();
        let duplicate = setup
            .auth
            .create(PlayerAuth::create(1, "DEV-1", "uid-2", hasher, at(9)).unwrap())
            .await;
        assert!(matches!(
            duplicate,
            Err(EntityError::Repository(RepositoryError::AlreadyExists { .. }))
        ));

        let warm = RequestScope::open(&state).await.unwrap();
        let cold_state = app_state(&dir).await;
        let cold = RequestScope::open(&cold_state).await.unwrap();

        for scope in [&warm, &cold] {
            let found = scope
                .auth
                .find_or_none(1, vec!["DEV-1".into()])
                .await
                .unwrap()
                .expect("record found whatever the case of the device id");
            assert_eq!(found.read().await.device_id(), "dev-1");

            let canonical = scope.auth.find(1, vec!["dev-1".into()]).await.unwrap();
            assert!(canonical.ptr_eq(&found));
        }
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_instance() {
        let dir = tempfile::tempdir().unwrap();
        let state = app_state(&dir).await;
        let setup = RequestScope::open(&state).await.unwrap();
        setup
            .basics
            .create(PlayerBasic::create(1, "Alice", at(9)))
            .await
            .unwrap();

        // A fresh cache sends both lookups to the store.
        let cold_state = app_state(&dir).await;
        let scope = RequestScope::open(&cold_state).await.unwrap();
        let (left, right) = tokio::join!(
            scope.basics.find(1, vec![]),
            scope.basics.find(1, vec![])
        );

        let (left, right) = (left.unwrap(), right.unwrap());
        assert!(left.ptr_eq(&right));
        assert_eq!(scope.context().unit_of_work().len().await, 1);
    }
}
