//! Versioning and commit-staging state carried by every persisted entity.
//!
//! Lifecycle: a new entity is dirty at version 0. `prepare_to_submit`
//! stages it with an optional callback, and committing runs the callback
//! and bumps the version by exactly one. Any mutator call re-dirties it,
//! even when the new value equals the old one.

use std::fmt;
use std::future::Future;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use serde::{ser::SerializeStruct, Deserialize, Deserializer, Serialize, Serializer};

use crate::storage::{RepositoryError, Row, CREATED_AT_COLUMN, VERSION_COLUMN};

use super::{EntityError, Result};

/// Future returned by a deferred commit callback.
pub type SubmitFuture = BoxFuture<'static, Result<()>>;

/// Deferred work run once the owning transaction has committed.
pub type SubmitCallback = Box<dyn FnOnce() -> SubmitFuture + Send + Sync>;

/// Boxes an async closure as a [`SubmitCallback`].
pub fn submit_callback<F, Fut>(f: F) -> SubmitCallback
where
    F: FnOnce() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Box::new(move || Box::pin(f()))
}

pub struct EntityState {
    created_at: DateTime<Utc>,
    version: i64,
    dirty: bool,
    staged: bool,
    on_submit: Option<SubmitCallback>,
}

impl EntityState {
    /// State of a freshly created entity: dirty, version 0.
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            version: 0,
            dirty: true,
            staged: false,
            on_submit: None,
        }
    }

    /// State of an entity loaded from a store or cache: clean.
    pub fn restored(created_at: DateTime<Utc>, version: i64) -> Self {
        Self {
            created_at,
            version,
            dirty: false,
            staged: false,
            on_submit: None,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last committed version.
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Version presented to the store: one past the committed version while
    /// there are uncommitted changes.
    pub fn effective_version(&self) -> i64 {
        if self.dirty {
            self.version + 1
        } else {
            self.version
        }
    }

    /// Version currently held by the durable store row. A staged write has
    /// already stored the effective version.
    pub fn stored_version(&self) -> i64 {
        if self.staged {
            self.version + 1
        } else {
            self.version
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_staged(&self) -> bool {
        self.staged
    }

    pub fn is_first_commit(&self) -> bool {
        self.version == 0 && !self.staged
    }

    /// Marks the entity as changed. Called by every mutator.
    pub fn touch(&mut self) {
        self.dirty = true;
    }

    /// Stages the entity for commit, replacing any previously staged callback.
    pub fn prepare_to_submit(&mut self, callback: Option<SubmitCallback>) -> Result<()> {
        if !self.dirty {
            return Err(EntityError::InvalidOperation(
                "cannot stage an entity without changes".to_string(),
            ));
        }
        self.staged = true;
        self.on_submit = callback;
        Ok(())
    }

    pub fn take_submit_callback(&mut self) -> Option<SubmitCallback> {
        self.on_submit.take()
    }

    /// Completes a commit: bumps the version and clears the change flags.
    pub fn mark_committed(&mut self) {
        self.version += 1;
        self.dirty = false;
        self.staged = false;
        self.on_submit = None;
    }
}

impl EntityState {
    /// Writes `created_at` and the effective version into a store row.
    pub fn write_columns(&self, row: &mut Row) {
        row.push(CREATED_AT_COLUMN, self.created_at);
        row.push(VERSION_COLUMN, self.effective_version());
    }

    /// Restores a clean state from a store row.
    pub fn from_row(row: &Row) -> std::result::Result<Self, RepositoryError> {
        Ok(Self::restored(
            row.timestamp(CREATED_AT_COLUMN)?,
            row.integer(VERSION_COLUMN)?,
        ))
    }
}

impl fmt::Debug for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityState")
            .field("created_at", &self.created_at)
            .field("version", &self.version)
            .field("dirty", &self.dirty)
            .field("staged", &self.staged)
            .field("has_callback", &self.on_submit.is_some())
            .finish()
    }
}

impl Serialize for EntityState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EntityState", 2)?;
        state.serialize_field("created_at", &self.created_at)?;
        state.serialize_field("version", &self.effective_version())?;
        state.end()
    }
}

#[derive(Deserialize)]
struct PersistedState {
    created_at: DateTime<Utc>,
    version: i64,
}

impl<'de> Deserialize<'de> for EntityState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let persisted = PersistedState::deserialize(deserializer)?;
        Ok(Self::restored(persisted.created_at, persisted.version))
    }
}
