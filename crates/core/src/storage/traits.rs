use std::sync::Arc;

use async_trait::async_trait;

use crate::entity::CompositeKey;

use super::{Record, Result, Row, TableSpec};

/// A durable store connection used by entity repositories.
///
/// Every write is optimistic: versioned updates and deletes only match the
/// row if its stored version equals `expected_version`, otherwise they fail
/// with [`super::RepositoryError::ConcurrencyConflict`].
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Opens a native transaction on this connection.
    async fn begin_transaction(&self) -> Result<Box<dyn StoreTransaction>>;

    /// Fetches a single row by its composite key, eager-loading first-level
    /// children for every relation declared on `table`.
    async fn fetch_one(
        &self,
        table: &'static TableSpec,
        key: &CompositeKey,
    ) -> Result<Option<Record>>;

    /// Inserts a new row.
    async fn insert(&self, table: &'static TableSpec, row: Row) -> Result<()>;

    /// Rewrites the non-key columns of the row matching `key` and
    /// `expected_version`.
    async fn update_versioned(
        &self,
        table: &'static TableSpec,
        key: &CompositeKey,
        row: Row,
        expected_version: i64,
    ) -> Result<()>;

    /// Deletes the row matching `key` and `expected_version`.
    async fn delete_versioned(
        &self,
        table: &'static TableSpec,
        key: &CompositeKey,
        expected_version: i64,
    ) -> Result<()>;
}

/// A native transaction handle on one store connection.
#[async_trait]
pub trait StoreTransaction: Send + Sync {
    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;

    /// Releases the handle. A handle that was neither committed nor rolled
    /// back is rolled back.
    async fn release(&mut self) -> Result<()>;
}

/// Opens store connections, one per request scope.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn EntityStore>>;
}
