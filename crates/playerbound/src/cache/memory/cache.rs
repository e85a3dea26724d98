//! Single-node cache backed by an LRU map.
//!
//! Entries carry an optional deadline and read as absent once it passes.
//! There are no replicas, so read preferences are accepted and ignored.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::Mutex;

use playerbound_core::cache::{Cache, CacheError, ReadPreference, Result};

#[derive(Debug, Clone)]
struct Slot {
    bytes: Vec<u8>,
    deadline: Option<Instant>,
}

impl Slot {
    fn live(&self, now: Instant) -> bool {
        self.deadline.map_or(true, |deadline| now <= deadline)
    }
}

fn deadline_after(ttl: Option<Duration>) -> Option<Instant> {
    ttl.map(|ttl| Instant::now() + ttl)
}

/// Cache for single-process deployments and local development.
///
/// Holds at most `capacity` keys; the least recently read or written key is
/// evicted first. Expired slots stay in the map until they are evicted or
/// overwritten.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    slots: Arc<Mutex<LruCache<String, Slot>>>,
}

impl MemoryCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            slots: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str, _preference: ReadPreference) -> Result<Option<Vec<u8>>> {
        let mut slots = self.slots.lock().await;
        let now = Instant::now();

        Ok(slots
            .get(key)
            .filter(|slot| slot.live(now))
            .map(|slot| slot.bytes.clone()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let slot = Slot {
            bytes: value.to_vec(),
            deadline: deadline_after(ttl),
        };
        self.slots.lock().await.put(key.to_owned(), slot);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.slots.lock().await.pop(key);
        Ok(())
    }

    async fn incr(&self, key: &str, delta: i64, ttl: Option<Duration>) -> Result<i64> {
        let mut slots = self.slots.lock().await;
        let now = Instant::now();

        let (counter, deadline) = match slots.get(key).filter(|slot| slot.live(now)) {
            Some(slot) => (parse_counter(key, &slot.bytes)?, slot.deadline),
            None => (0, None),
        };

        let counter = counter
            .checked_add(delta)
            .ok_or_else(|| CacheError::OperationFailed(format!("counter {key} overflowed")))?;

        slots.put(
            key.to_owned(),
            Slot {
                bytes: counter.to_string().into_bytes(),
                deadline: deadline_after(ttl).or(deadline),
            },
        );
        Ok(counter)
    }
}

fn parse_counter(key: &str, bytes: &[u8]) -> Result<i64> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| CacheError::OperationFailed(format!("{key} does not hold a counter")))
}
