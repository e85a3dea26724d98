//! Hand-written collaborators shared by the crate's unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use playerbound_core::cache::{Cache, CacheError, ReadPreference, Result as CacheResult};
use playerbound_core::entity::{
    Capabilities, CompositeKey, Entity, EntityState, KeyValue, PlayerBound, Result as EntityResult,
};
use playerbound_core::storage::{
    ColumnSpec, EntityStore, FieldValue, Record, RelationSpec, RepositoryError, Result, Row,
    StoreTransaction, TableSpec, CREATED_AT_COLUMN, VERSION_COLUMN,
};

use crate::config::Config;
use crate::state::AppState;
use crate::storage::SqliteConnector;

pub(crate) fn test_config() -> Config {
    Config {
        environment: "test".to_string(),
        sqlite_path: "test.db".to_string(),
        redis_url: "redis://localhost:6379".to_string(),
        redis_replica_url: None,
        persistent_redis_url: "redis://localhost:6379".to_string(),
        cache_max_entries: 100,
        player_cache_ttl_seconds: 600,
        session_ttl_seconds: 3_600,
        uid_hash_cost: 4,
    }
}

/// App state over a SQLite file in `dir` and a shared [`MockCache`].
pub(crate) async fn sqlite_state(dir: &tempfile::TempDir) -> AppState {
    let path = dir.path().join("playerbound.db").to_string_lossy().into_owned();
    let connector = Arc::new(SqliteConnector::open(path).await.unwrap());
    let cache: Arc<dyn Cache> = Arc::new(MockCache::new());
    AppState::build(connector, cache.clone(), cache, &test_config())
}

pub(crate) fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

/// Cache that records read preferences and TTLs, and can be told to fail.
#[derive(Default)]
pub(crate) struct MockCache {
    store: RwLock<HashMap<String, (Vec<u8>, Option<Duration>)>>,
    preferences: RwLock<Vec<ReadPreference>>,
    failure: StdMutex<Option<CacheError>>,
    get_calls: AtomicUsize,
    set_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl MockCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every subsequent operation fails with `error`.
    pub(crate) fn fail_with(&self, error: CacheError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub(crate) async fn read_preferences(&self) -> Vec<ReadPreference> {
        self.preferences.read().await.clone()
    }

    /// `None` if absent, otherwise the TTL the entry was written with.
    pub(crate) async fn ttl_of(&self, key: &str) -> Option<Option<Duration>> {
        self.store.read().await.get(key).map(|(_, ttl)| *ttl)
    }

    pub(crate) async fn contains(&self, key: &str) -> bool {
        self.store.read().await.contains_key(key)
    }

    pub(crate) async fn value_of(&self, key: &str) -> Option<Vec<u8>> {
        self.store.read().await.get(key).map(|(value, _)| value.clone())
    }

    pub(crate) fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn set_calls(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> CacheResult<()> {
        match self.failure.lock().unwrap().as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Cache for MockCache {
    async fn get(&self, key: &str, preference: ReadPreference) -> CacheResult<Option<Vec<u8>>> {
        self.preferences.write().await.push(preference);
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.store.read().await.get(key).map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> CacheResult<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.store
            .write()
            .await
            .insert(key.to_string(), (value.to_vec(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.store.write().await.remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str, delta: i64, ttl: Option<Duration>) -> CacheResult<i64> {
        self.check()?;
        let mut store = self.store.write().await;
        let current = match store.get(key) {
            Some((value, _)) => String::from_utf8_lossy(value)
                .parse::<i64>()
                .map_err(|_| CacheError::OperationFailed(format!("{key} is not an integer")))?,
            None => 0,
        };
        let next = current + delta;
        store.insert(key.to_string(), (next.to_string().into_bytes(), ttl));
        Ok(next)
    }
}

/// Counters and failure switches shared by a [`MockStore`] and its
/// transactions.
#[derive(Default)]
pub(crate) struct StoreProbe {
    pub(crate) fetch_calls: AtomicUsize,
    pub(crate) begins: AtomicUsize,
    pub(crate) commits: AtomicUsize,
    pub(crate) rollbacks: AtomicUsize,
    pub(crate) releases: AtomicUsize,
    commit_failure: StdMutex<Option<RepositoryError>>,
}

impl StoreProbe {
    pub(crate) fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Versioned in-memory store. Writes apply immediately; transactions only
/// record what the coordinator asked of them.
#[derive(Default)]
pub(crate) struct MockStore {
    records: RwLock<HashMap<(&'static str, String), Record>>,
    pub(crate) probe: Arc<StoreProbe>,
}

impl MockStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every commit on this store fail with `error`.
    pub(crate) fn fail_commits_with(&self, error: RepositoryError) {
        *self.probe.commit_failure.lock().unwrap() = Some(error);
    }

    pub(crate) async fn seed(&self, table: &'static TableSpec, record: Record) {
        let key = row_key(table, &record.row);
        self.records.write().await.insert((table.name, key), record);
    }

    pub(crate) async fn version_of(&self, table: &'static TableSpec, key: &str) -> Option<i64> {
        self.records
            .read()
            .await
            .get(&(table.name, key.to_string()))
            .and_then(|record| record.row.integer(VERSION_COLUMN).ok())
    }

    pub(crate) async fn contains(&self, table: &'static TableSpec, key: &str) -> bool {
        self.records
            .read()
            .await
            .contains_key(&(table.name, key.to_string()))
    }

    pub(crate) fn fetch_calls(&self) -> usize {
        StoreProbe::count(&self.probe.fetch_calls)
    }

    async fn check_version(
        &self,
        table: &'static TableSpec,
        key: &CompositeKey,
        expected_version: i64,
    ) -> Result<()> {
        let stored = self.version_of(table, &key.to_string()).await;
        if stored != Some(expected_version) {
            return Err(RepositoryError::ConcurrencyConflict {
                entity_type: table.name,
                key: key.to_string(),
                expected_version,
            });
        }
        Ok(())
    }
}

fn row_key(table: &TableSpec, row: &Row) -> String {
    table
        .key
        .iter()
        .map(|column| match row.get(column) {
            Some(FieldValue::Integer(value)) => value.to_string(),
            Some(FieldValue::Text(value)) => value.clone(),
            _ => String::new(),
        })
        .collect::<Vec<_>>()
        .join(":")
}

#[async_trait]
impl EntityStore for MockStore {
    async fn begin_transaction(&self) -> Result<Box<dyn StoreTransaction>> {
        self.probe.begins.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockTransaction {
            probe: self.probe.clone(),
            open: true,
        }))
    }

    async fn fetch_one(
        &self,
        table: &'static TableSpec,
        key: &CompositeKey,
    ) -> Result<Option<Record>> {
        self.probe.fetch_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .read()
            .await
            .get(&(table.name, key.to_string()))
            .cloned())
    }

    async fn insert(&self, table: &'static TableSpec, row: Row) -> Result<()> {
        let key = row_key(table, &row);
        let mut records = self.records.write().await;
        if records.contains_key(&(table.name, key.clone())) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: table.name,
                id: key,
            });
        }
        records.insert((table.name, key), Record::new(row));
        Ok(())
    }

    async fn update_versioned(
        &self,
        table: &'static TableSpec,
        key: &CompositeKey,
        row: Row,
        expected_version: i64,
    ) -> Result<()> {
        self.check_version(table, key, expected_version).await?;
        if let Some(record) = self
            .records
            .write()
            .await
            .get_mut(&(table.name, key.to_string()))
        {
            record.row = row;
        }
        Ok(())
    }

    async fn delete_versioned(
        &self,
        table: &'static TableSpec,
        key: &CompositeKey,
        expected_version: i64,
    ) -> Result<()> {
        self.check_version(table, key, expected_version).await?;
        self.records
            .write()
            .await
            .remove(&(table.name, key.to_string()));
        Ok(())
    }
}

pub(crate) struct MockTransaction {
    probe: Arc<StoreProbe>,
    open: bool,
}

#[async_trait]
impl StoreTransaction for MockTransaction {
    async fn commit(&mut self) -> Result<()> {
        self.probe.commits.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.probe.commit_failure.lock().unwrap().clone() {
            return Err(error);
        }
        self.open = false;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.probe.rollbacks.fetch_add(1, Ordering::SeqCst);
        self.open = false;
        Ok(())
    }

    async fn release(&mut self) -> Result<()> {
        self.probe.releases.fetch_add(1, Ordering::SeqCst);
        if self.open {
            self.rollback().await?;
        }
        Ok(())
    }
}

/// Lookup injected into [`Card`] children after materialization.
pub(crate) trait CardCatalog: Send + Sync {
    fn title(&self, card_id: i64) -> String;
}

pub(crate) struct NumberedCatalog;

impl CardCatalog for NumberedCatalog {
    fn title(&self, card_id: i64) -> String {
        format!("card #{card_id}")
    }
}

pub(crate) static CARD_TABLE: TableSpec = TableSpec {
    name: "deck_cards",
    columns: &[
        ColumnSpec::text("deck_name"),
        ColumnSpec::integer("player_id"),
        ColumnSpec::integer("slot"),
        ColumnSpec::integer("card_id"),
    ],
    key: &["deck_name", "player_id", "slot"],
    owner_column: "player_id",
    relations: &[],
};

pub(crate) static DECK_TABLE: TableSpec = TableSpec {
    name: "decks",
    columns: &[
        ColumnSpec::text("deck_name"),
        ColumnSpec::integer("player_id"),
        ColumnSpec::timestamp(CREATED_AT_COLUMN),
        ColumnSpec::integer(VERSION_COLUMN),
    ],
    key: &["deck_name", "player_id"],
    owner_column: "player_id",
    relations: &[RelationSpec {
        name: "cards",
        table: &CARD_TABLE,
        foreign_key: &["deck_name", "player_id"],
    }],
};

#[derive(Serialize, Deserialize)]
pub(crate) struct Card {
    pub(crate) slot: i64,
    pub(crate) card_id: i64,
    #[serde(skip)]
    pub(crate) title: Option<String>,
}

/// A record with nested children, so never cached.
#[derive(Serialize, Deserialize)]
pub(crate) struct Deck {
    pub(crate) deck_name: String,
    pub(crate) player_id: i64,
    pub(crate) cards: Vec<Card>,
    state: EntityState,
}

impl Deck {
    pub(crate) fn record(player_id: i64, deck_name: &str, card_ids: &[i64]) -> Record {
        let mut record = Record::new(
            Row::new()
                .with("deck_name", deck_name)
                .with("player_id", player_id)
                .with(CREATED_AT_COLUMN, at(8))
                .with(VERSION_COLUMN, 1_i64),
        );
        let cards = card_ids
            .iter()
            .enumerate()
            .map(|(slot, card_id)| {
                Row::new()
                    .with("deck_name", deck_name)
                    .with("player_id", player_id)
                    .with("slot", slot as i64)
                    .with("card_id", *card_id)
            })
            .collect();
        record.children.push(("cards", cards));
        record
    }
}

impl Entity for Deck {
    fn state(&self) -> &EntityState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EntityState {
        &mut self.state
    }
}

impl PlayerBound for Deck {
    const NAME: &'static str = "Deck";

    fn table() -> &'static TableSpec {
        &DECK_TABLE
    }

    fn owner_id(&self) -> i64 {
        self.player_id
    }

    fn key(&self) -> CompositeKey {
        CompositeKey::new(vec![
            KeyValue::Text(self.deck_name.clone()),
            KeyValue::Integer(self.player_id),
        ])
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new()
            .with("deck_name", self.deck_name.as_str())
            .with("player_id", self.player_id);
        self.state.write_columns(&mut row);
        row
    }

    fn from_record(record: Record) -> Result<Self> {
        let cards = record
            .children("cards")
            .iter()
            .map(|row| {
                Ok(Card {
                    slot: row.integer("slot")?,
                    card_id: row.integer("card_id")?,
                    title: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            deck_name: record.row.text("deck_name")?,
            player_id: record.row.integer("player_id")?,
            cards,
            state: EntityState::from_row(&record.row)?,
        })
    }

    fn resolve(&mut self, capabilities: &Capabilities) -> EntityResult<()> {
        let catalog = capabilities.get::<dyn CardCatalog>()?;
        for card in &mut self.cards {
            card.title = Some(catalog.title(card.card_id));
        }
        Ok(())
    }
}
