//! Process-wide shared resources: the store connector, the cache
//! connections, the registration table and the capability registry.
//!
//! The cache backend is selected at compile time; see [`crate::cache`].

use std::sync::Arc;
use std::time::Duration;

use playerbound_core::cache::Cache;
use playerbound_core::entity::Capabilities;
use playerbound_core::player::UidHasher;
use playerbound_core::storage::StoreConnector;

use crate::config::Config;
use crate::credentials::BcryptHasher;
use crate::registry::Registry;

/// Shared application state, cloned into every request scope.
#[derive(Clone)]
pub struct AppState {
    /// Opens one durable store connection per request scope.
    pub connector: Arc<dyn StoreConnector>,
    /// Cache holding entity copies and sessions.
    pub cache: Arc<dyn Cache>,
    /// Cache holding data that must outlive entity copies, such as the
    /// player id counter.
    pub persistent_cache: Arc<dyn Cache>,
    pub registry: Arc<Registry>,
    /// Collaborators injected into materialized entities.
    pub capabilities: Arc<Capabilities>,
    pub session_ttl: Duration,
}

impl AppState {
    /// Assembles state from already opened backends.
    pub fn build(
        connector: Arc<dyn StoreConnector>,
        cache: Arc<dyn Cache>,
        persistent_cache: Arc<dyn Cache>,
        config: &Config,
    ) -> Self {
        let hasher: Arc<dyn UidHasher> = Arc::new(BcryptHasher::new(config.uid_hash_cost));
        Self {
            connector,
            cache,
            persistent_cache,
            registry: Arc::new(Registry::from_config(config)),
            capabilities: Arc::new(Capabilities::new().with(hasher)),
            session_ttl: config.session_ttl(),
        }
    }

    /// The uid hasher registered as a capability.
    pub fn hasher(&self) -> playerbound_core::entity::Result<Arc<dyn UidHasher>> {
        self.capabilities.get::<dyn UidHasher>()
    }
}

#[cfg(feature = "memory")]
mod sqlite_memory {
    use super::*;
    use crate::cache::memory::MemoryCache;
    use crate::error::StartupError;
    use crate::storage::SqliteConnector;

    impl AppState {
        /// Creates AppState with SQLite storage and an in-memory cache.
        ///
        /// The in-memory cache doubles as the persistent cache, so player
        /// ids restart when the process does.
        pub async fn new(config: &Config) -> Result<Self, StartupError> {
            let connector = Arc::new(SqliteConnector::open(config.sqlite_path.clone()).await?);
            let memory_cache = Arc::new(MemoryCache::new(config.cache_max_entries));

            Ok(Self::build(
                connector,
                memory_cache.clone(),
                memory_cache,
                config,
            ))
        }
    }
}

#[cfg(feature = "redis")]
mod sqlite_redis {
    use super::*;
    use crate::cache::redis_impl::RedisCache;
    use crate::error::StartupError;
    use crate::storage::SqliteConnector;

    impl AppState {
        /// Creates AppState with SQLite storage and Redis caches.
        pub async fn new(config: &Config) -> Result<Self, StartupError> {
            let connector = Arc::new(SqliteConnector::open(config.sqlite_path.clone()).await?);
            let redis_cache = Arc::new(
                RedisCache::new(&config.redis_url, config.redis_replica_url.as_deref()).await?,
            );
            let persistent_cache =
                Arc::new(RedisCache::new(&config.persistent_redis_url, None).await?);

            Ok(Self::build(
                connector,
                redis_cache,
                persistent_cache,
                config,
            ))
        }
    }
}
