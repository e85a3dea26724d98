//! Static registration table: which entity types exist and how each is cached.

use std::sync::Arc;
use std::time::Duration;

use playerbound_core::cache::{Cache, ENTITY_DATA_NAME};
use playerbound_core::entity::{EntityError, PlayerBound, Result};
use playerbound_core::player::{PlayerAuth, PlayerBasic};
use playerbound_core::storage::TableSpec;

use crate::cache::{CacheKeyspace, EntityCache};
use crate::config::Config;

/// One registered entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub name: &'static str,
    pub table: &'static TableSpec,
    pub cache_eligible: bool,
    /// `None` never expires.
    pub cache_ttl: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Registry {
    environment: String,
    rows: Vec<Registration>,
}

impl Registry {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            rows: Vec::new(),
        }
    }

    /// The game's entity types with their configured cache policy.
    pub fn from_config(config: &Config) -> Self {
        let player_ttl = Some(config.player_cache_ttl());
        Self::new(config.environment.clone())
            .register::<PlayerAuth>(player_ttl)
            .register::<PlayerBasic>(player_ttl)
    }

    /// Registers `E`, replacing any previous row for it.
    pub fn register<E: PlayerBound>(mut self, cache_ttl: Option<Duration>) -> Self {
        self.rows.retain(|row| row.name != E::NAME);
        self.rows.push(Registration {
            name: E::NAME,
            table: E::table(),
            cache_eligible: E::is_cache_eligible(),
            cache_ttl,
        });
        self
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn registrations(&self) -> &[Registration] {
        &self.rows
    }

    pub fn registration<E: PlayerBound>(&self) -> Result<&Registration> {
        self.rows
            .iter()
            .find(|row| row.name == E::NAME)
            .ok_or_else(|| {
                EntityError::InvalidOperation(format!("{} is not registered", E::NAME))
            })
    }

    /// Builds the cache tier for `E` in a fresh keyspace with its own read
    /// routing policy.
    pub fn entity_cache<E: PlayerBound>(&self, cache: Arc<dyn Cache>) -> Result<EntityCache<E>> {
        let registration = self.registration::<E>()?;
        let keyspace = CacheKeyspace::new(cache, &self.environment, ENTITY_DATA_NAME);
        Ok(EntityCache::new(keyspace, registration.cache_ttl))
    }
}
