use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{
    Capabilities, CompositeKey, Entity, EntityState, KeyValue, PlayerBound, Result as EntityResult,
};
use crate::storage::{
    ColumnSpec, Record, RepositoryError, Row, TableSpec, CREATED_AT_COLUMN, VERSION_COLUMN,
};

use super::{PlayerError, Result, UidHasher};

/// Longest accepted device id.
pub const MAX_DEVICE_ID_LEN: usize = 32;

pub static PLAYER_AUTH_TABLE: TableSpec = TableSpec {
    name: "player_auth",
    columns: &[
        ColumnSpec::integer("player_id"),
        ColumnSpec::text("device_id"),
        ColumnSpec::text("player_uid_hash"),
        ColumnSpec::timestamp(CREATED_AT_COLUMN),
        ColumnSpec::integer(VERSION_COLUMN),
    ],
    key: &["player_id", "device_id"],
    owner_column: "player_id",
    relations: &[],
};

/// Credentials binding a device to a player.
#[derive(Serialize, Deserialize)]
pub struct PlayerAuth {
    player_id: i64,
    device_id: String,
    player_uid_hash: String,
    state: EntityState,
    #[serde(skip)]
    hasher: Option<Arc<dyn UidHasher>>,
}

impl PlayerAuth {
    pub fn create(
        player_id: i64,
        device_id: impl Into<String>,
        uid: &str,
        hasher: Arc<dyn UidHasher>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let device_id = device_id.into();
        if device_id.chars().count() > MAX_DEVICE_ID_LEN {
            return Err(PlayerError::InvalidDeviceId {
                len: device_id.chars().count(),
                max: MAX_DEVICE_ID_LEN,
            });
        }

        Ok(Self {
            player_id,
            player_uid_hash: hasher.hash(uid)?,
            device_id,
            state: EntityState::new(now),
            hasher: Some(hasher),
        })
    }

    pub fn player_id(&self) -> i64 {
        self.player_id
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn player_uid_hash(&self) -> &str {
        &self.player_uid_hash
    }

    /// Checks `uid` against the stored hash.
    pub fn verify(&self, uid: &str) -> Result<bool> {
        let hasher = self.hasher.as_ref().ok_or(PlayerError::MissingHasher)?;
        hasher.verify(uid, &self.player_uid_hash)
    }

    pub fn generate_session_id() -> String {
        Uuid::new_v4().to_string()
    }
}

impl fmt::Debug for PlayerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerAuth")
            .field("player_id", &self.player_id)
            .field("device_id", &self.device_id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Entity for PlayerAuth {
    fn state(&self) -> &EntityState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut EntityState {
        &mut self.state
    }
}

impl PlayerBound for PlayerAuth {
    const NAME: &'static str = "PlayerAuth";

    fn table() -> &'static TableSpec {
        &PLAYER_AUTH_TABLE
    }

    fn owner_id(&self) -> i64 {
        self.player_id
    }

    fn key(&self) -> CompositeKey {
        CompositeKey::new(vec![
            KeyValue::Integer(self.player_id),
            KeyValue::Text(self.device_id.clone()),
        ])
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new()
            .with("player_id", self.player_id)
            .with("device_id", self.device_id.as_str())
            .with("player_uid_hash", self.player_uid_hash.as_str());
        self.state.write_columns(&mut row);
        row
    }

    fn from_record(record: Record) -> std::result::Result<Self, RepositoryError> {
        let row = &record.row;
        Ok(Self {
            player_id: row.integer("player_id")?,
            device_id: row.text("device_id")?,
            player_uid_hash: row.text("player_uid_hash")?,
            state: EntityState::from_row(row)?,
            hasher: None,
        })
    }

    fn resolve(&mut self, capabilities: &Capabilities) -> EntityResult<()> {
        self.hasher = Some(capabilities.get::<dyn UidHasher>()?);
        Ok(())
    }
}
