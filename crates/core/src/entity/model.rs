use serde::{de::DeserializeOwned, Serialize};

use crate::storage::{Record, RepositoryError, Row, TableSpec};

use super::{Capabilities, CompositeKey, EntityState, Result};

/// Anything carrying versioning state.
pub trait Entity: Send + Sync + 'static {
    fn state(&self) -> &EntityState;

    fn state_mut(&mut self) -> &mut EntityState;
}

/// A persisted entity owned by a player and addressed by a composite key.
///
/// The key columns are declared once on [`PlayerBound::table`]; their order
/// is used for store predicates and cache keys alike.
pub trait PlayerBound: Entity + Serialize + DeserializeOwned + Sized {
    /// Type name used in logs and cache keys.
    const NAME: &'static str;

    fn table() -> &'static TableSpec;

    fn owner_id(&self) -> i64;

    fn key(&self) -> CompositeKey;

    /// Column values for insert and update, versioning columns included.
    fn to_row(&self) -> Row;

    /// Materializes the entity from a store record with its children.
    fn from_record(record: Record) -> std::result::Result<Self, RepositoryError>;

    /// Populates runtime collaborators on the entity and its children.
    fn resolve(&mut self, _capabilities: &Capabilities) -> Result<()> {
        Ok(())
    }

    /// Only types without nested children are cached as flat blobs.
    fn is_cache_eligible() -> bool {
        !Self::table().has_relations()
    }
}
