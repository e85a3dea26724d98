//! Cache backends and the cache-backed repositories built on them.
//!
//! The backend implementing `playerbound_core::cache::Cache` is selected at
//! compile time via feature flags.
//!
//! - `memory` (default): one process, LRU eviction, player ids reset on restart
//! - `redis`: primary plus optional read replica, and a separate persistent node
//!
//! Exactly one backend must be enabled.

#[cfg(all(feature = "memory", feature = "redis"))]
compile_error!(
    "The 'memory' and 'redis' cache backends cannot be enabled together. \
    Build with --no-default-features --features redis for redis."
);

#[cfg(not(any(feature = "memory", feature = "redis")))]
compile_error!("Enable one cache backend: 'memory' or 'redis'.");

mod entity_cache;
mod keyspace;
mod player_id;
mod session;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

pub use entity_cache::EntityCache;
pub use keyspace::CacheKeyspace;
pub use player_id::PlayerIdRepository;
pub use session::SessionRepository;

#[cfg(feature = "memory")]
pub use memory::MemoryCache;

#[cfg(feature = "redis")]
pub use redis_impl::RedisCache;
