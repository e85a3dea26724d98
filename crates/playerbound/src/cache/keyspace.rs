//! Environment- and dataset-scoped view over a shared [`Cache`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use playerbound_core::cache::{namespaced_key, Cache, ReadPreference, ReadRouting, Result};

/// A namespaced slice of the distributed cache owning one read routing policy.
///
/// Clones share the routing policy, so a write issued through any clone (for
/// example from a deferred commit callback) switches every clone to primary
/// reads.
#[derive(Clone)]
pub struct CacheKeyspace {
    cache: Arc<dyn Cache>,
    environment: Arc<str>,
    data_name: &'static str,
    routing: Arc<ReadRouting>,
}

impl CacheKeyspace {
    pub fn new(cache: Arc<dyn Cache>, environment: &str, data_name: &'static str) -> Self {
        Self {
            cache,
            environment: Arc::from(environment),
            data_name,
            routing: Arc::new(ReadRouting::new()),
        }
    }

    /// Fully namespaced form of `key`.
    pub fn key(&self, key: &str) -> String {
        namespaced_key(&self.environment, self.data_name, key)
    }

    pub fn read_preference(&self) -> ReadPreference {
        self.routing.preference()
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let preference = self.routing.preference();
        self.cache.get(&self.key(key), preference).await
    }

    pub async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        self.routing.record_write();
        self.cache.set(&self.key(key), value, ttl).await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.routing.record_write();
        self.cache.delete(&self.key(key)).await
    }

    pub async fn incr(&self, key: &str, delta: i64, ttl: Option<Duration>) -> Result<i64> {
        self.routing.record_write();
        self.cache.incr(&self.key(key), delta, ttl).await
    }
}

impl fmt::Debug for CacheKeyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheKeyspace")
            .field("environment", &self.environment)
            .field("data_name", &self.data_name)
            .field("read_preference", &self.routing.preference())
            .finish()
    }
}
