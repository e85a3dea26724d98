use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{CompositeKey, Entity, EntityState, KeyValue, PlayerBound};
use crate::storage::{
    ColumnSpec, Record, RepositoryError, Row, TableSpec, CREATED_AT_COLUMN, VERSION_COLUMN,
};

/// Stamina granted to a freshly registered player.
pub const INITIAL_STAMINA: i64 = 10;

pub static PLAYER_BASIC_TABLE: TableSpec = TableSpec {
    name: "player_basics",
    columns: &[
        ColumnSpec::integer("player_id"),
        ColumnSpec::text("name"),
        ColumnSpec::integer("tutorial_progress"),
        ColumnSpec::integer("stamina"),
        ColumnSpec::timestamp("last_stamina_updated_at"),
        ColumnSpec::timestamp("last_login"),
        ColumnSpec::timestamp(CREATED_AT_COLUMN),
        ColumnSpec::integer(VERSION_COLUMN),
    ],
    key: &["player_id"],
    owner_column: "player_id",
    relations: &[],
};

/// The player's profile.
#[derive(Debug, Serialize, Deserialize)]
pub struct PlayerBasic {
    player_id: i64,
    name: String,
    tutorial_progress: i64,
    stamina: i64,
    last_stamina_updated_at: DateTime<Utc>,
    last_login: DateTime<Utc>,
    state: EntityState,
}

impl PlayerBasic {
    /// A new profile; `last_login` stays at the epoch until the first login.
    pub fn create(player_id: i64, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            player_id,
            name: name.into(),
            tutorial_progress: 0,
            stamina: INITIAL_STAMINA,
            last_stamina_updated_at: now,
            last_login: DateTime::<Utc>::UNIX_EPOCH,
            state: EntityState::new(now),
        }
    }

    pub fn player_id(&self) -> i64 {
        self.player_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tutorial_progress(&self) -> i64 {
        self.tutorial_progress
    }

    pub fn stamina(&self) -> i64 {
        self.stamina
    }

    pub fn last_stamina_updated_at(&self) -> DateTime<Utc> {
        self.last_stamina_updated_at
    }

    pub fn last_login(&self) -> DateTime<Utc> {
        self.last_login
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.state.touch();
    }

    pub fn set_tutorial_progress(&mut self, progress: i64) {
        self.tutorial_progress = progress;
        self.state.touch();
    }

    /// Sets stamina and stamps the update time.
    pub fn set_stamina(&mut self, stamina: i64, at: DateTime<Utc>) {
        self.stamina = stamina;
        self.last_stamina_updated_at = at;
        self.state.touch();
    }

    pub fn set_last_login(&mut self, at: DateTime<Utc>) {
        self.last_login = at;
        self.state.touch();
    }
}

impl Entity for PlayerBasic {
    fn state(&self) -> &EntityState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EntityState {
        &mut self.state
    }
}

impl PlayerBound for PlayerBasic {
    const NAME: &'static str = "PlayerBasic";

    fn table() -> &'static TableSpec {
        &PLAYER_BASIC_TABLE
    }

    fn owner_id(&self) -> i64 {
        self.player_id
    }

    fn key(&self) -> CompositeKey {
        CompositeKey::new(vec![KeyValue::Integer(self.player_id)])
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new()
            .with("player_id", self.player_id)
            .with("name", self.name.as_str())
            .with("tutorial_progress", self.tutorial_progress)
            .with("stamina", self.stamina)
            .with("last_stamina_updated_at", self.last_stamina_updated_at)
            .with("last_login", self.last_login);
        self.state.write_columns(&mut row);
        row
    }

    fn from_record(record: Record) -> Result<Self, RepositoryError> {
        let row = &record.row;
        Ok(Self {
            player_id: row.integer("player_id")?,
            name: row.text("name")?,
            tutorial_progress: row.integer("tutorial_progress")?,
            stamina: row.integer("stamina")?,
            last_stamina_updated_at: row.timestamp("last_stamina_updated_at")?,
            last_login: row.timestamp("last_login")?,
            state: EntityState::from_row(row)?,
        })
    }
}
