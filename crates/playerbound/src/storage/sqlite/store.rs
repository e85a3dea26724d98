//! SQLite durable store.
//!
//! Implements `EntityStore` over one `tokio_rusqlite::Connection`. A
//! transaction is a `BEGIN` issued on that connection, so every write made
//! through the store while it is open joins it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::params_from_iter;
use tokio_rusqlite::Connection;

use playerbound_core::entity::CompositeKey;
use playerbound_core::storage::{
    EntityStore, Record, RepositoryError, Result, Row, StoreConnector, StoreTransaction, TableSpec,
};

use super::conversions::{key_to_value, non_key_values, read_row, row_key, row_values};
use super::error::{map_row_error, map_transaction_error};
use super::{schema, sql};

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// SQLite-backed entity store on a single connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens a file-based database, creating the file and schema if needed.
    pub async fn open(path: &str) -> Result<Self> {
        let store = Self::connect(path).await?;
        store.execute_batch(schema::CREATE_TABLES).await?;
        Ok(store)
    }

    /// Opens an in-memory database with the schema created.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;
        let store = Self::configure(conn).await?;
        store.execute_batch(schema::CREATE_TABLES).await?;
        Ok(store)
    }

    /// Opens a connection to an existing database without touching the schema.
    pub async fn connect(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;
        Self::configure(conn).await
    }

    async fn configure(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT).map_err(wrap_err)?;
            conn.execute_batch(schema::CONNECTION_PRAGMAS)
                .map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Runs raw SQL, e.g. schema for additional tables.
    pub async fn execute_batch(&self, batch: &'static str) -> Result<()> {
        self.conn
            .call(move |conn| conn.execute_batch(batch).map_err(wrap_err))
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }
}

#[async_trait]
impl EntityStore for SqliteStore {
    async fn begin_transaction(&self) -> Result<Box<dyn StoreTransaction>> {
        self.conn
            .call(|conn| conn.execute_batch(schema::BEGIN).map_err(wrap_err))
            .await
            .map_err(map_transaction_error)?;

        tracing::trace!("SQLite transaction started");
        Ok(Box::new(SqliteTransaction {
            conn: self.conn.clone(),
            state: TransactionState::Open,
        }))
    }

    async fn fetch_one(
        &self,
        table: &'static TableSpec,
        key: &CompositeKey,
    ) -> Result<Option<Record>> {
        let params: Vec<_> = key.values().iter().map(key_to_value).collect();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql::select_by_key(table)).map_err(wrap_err)?;
                let row = match stmt.query_row(params_from_iter(params.iter()), |r| {
                    read_row(table.columns, r)
                }) {
                    Ok(row) => row,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(wrap_err(e)),
                };

                let mut record = Record::new(row);
                for relation in table.relations {
                    let mut stmt = conn
                        .prepare(&sql::select_children(relation))
                        .map_err(wrap_err)?;
                    let rows = stmt
                        .query_map(params_from_iter(params.iter()), |r| {
                            read_row(relation.table.columns, r)
                        })
                        .map_err(wrap_err)?;

                    let mut children = Vec::new();
                    for row_result in rows {
                        children.push(row_result.map_err(wrap_err)?);
                    }
                    record.children.push((relation.name, children));
                }
                Ok(Some(record))
            })
            .await
            .map_err(|e| map_row_error(e, table.name, key.to_string()))
    }

    async fn insert(&self, table: &'static TableSpec, row: Row) -> Result<()> {
        let id = row_key(table, &row);
        let params = row_values(table, &row);

        self.conn
            .call(move |conn| {
                conn.execute(&sql::insert(table), params_from_iter(params.iter()))
                    .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_row_error(e, table.name, id))
    }

    async fn update_versioned(
        &self,
        table: &'static TableSpec,
        key: &CompositeKey,
        row: Row,
        expected_version: i64,
    ) -> Result<()> {
        let mut params = non_key_values(table, &row);
        params.extend(key.values().iter().map(key_to_value));
        params.push(rusqlite::types::Value::Integer(expected_version));

        let affected = self
            .conn
            .call(move |conn| {
                conn.execute(&sql::update_versioned(table), params_from_iter(params.iter()))
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_row_error(e, table.name, key.to_string()))?;

        if affected == 0 {
            return Err(RepositoryError::ConcurrencyConflict {
                entity_type: table.name,
                key: key.to_string(),
                expected_version,
            });
        }
        Ok(())
    }

    async fn delete_versioned(
        &self,
        table: &'static TableSpec,
        key: &CompositeKey,
        expected_version: i64,
    ) -> Result<()> {
        let mut params: Vec<_> = key.values().iter().map(key_to_value).collect();
        params.push(rusqlite::types::Value::Integer(expected_version));

        let affected = self
            .conn
            .call(move |conn| {
                conn.execute(&sql::delete_versioned(table), params_from_iter(params.iter()))
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_row_error(e, table.name, key.to_string()))?;

        if affected == 0 {
            return Err(RepositoryError::ConcurrencyConflict {
                entity_type: table.name,
                key: key.to_string(),
                expected_version,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionState {
    Open,
    Committed,
    RolledBack,
}

/// An open `BEGIN` on a SQLite connection.
pub struct SqliteTransaction {
    conn: Connection,
    state: TransactionState,
}

impl SqliteTransaction {
    async fn finish(&mut self, statement: &'static str, next: TransactionState) -> Result<()> {
        if self.state != TransactionState::Open {
            return Err(RepositoryError::TransactionFailed(format!(
                "transaction already {:?}",
                self.state
            )));
        }
        let result = self
            .conn
            .call(move |conn| conn.execute_batch(statement).map_err(wrap_err))
            .await
            .map_err(map_transaction_error);

        // A failed COMMIT leaves the transaction open so release can roll it back.
        if result.is_ok() || next == TransactionState::RolledBack {
            self.state = next;
        }
        result
    }
}

#[async_trait]
impl StoreTransaction for SqliteTransaction {
    async fn commit(&mut self) -> Result<()> {
        self.finish(schema::COMMIT, TransactionState::Committed)
            .await
    }

    async fn rollback(&mut self) -> Result<()> {
        self.finish(schema::ROLLBACK, TransactionState::RolledBack)
            .await
    }

    async fn release(&mut self) -> Result<()> {
        if self.state == TransactionState::Open {
            self.rollback().await?;
        }
        Ok(())
    }
}

/// Opens one SQLite connection per request scope.
pub struct SqliteConnector {
    path: String,
}

impl SqliteConnector {
    /// Prepares the database at `path`, creating the schema once.
    pub async fn open(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        SqliteStore::open(&path).await?;
        Ok(Self { path })
    }
}

#[async_trait]
impl StoreConnector for SqliteConnector {
    async fn connect(&self) -> Result<Arc<dyn EntityStore>> {
        Ok(Arc::new(SqliteStore::connect(&self.path).await?))
    }
}
