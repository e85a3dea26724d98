//! SQLite storage backend implementation.
//!
//! Implements `EntityStore` using `rusqlite` for synchronous operations and
//! `tokio-rusqlite` for async wrapping. Statements are generated from the
//! table descriptors each entity type declares.

mod conversions;
mod error;
mod schema;
mod sql;
mod store;

pub use schema::CREATE_TABLES;
pub use store::{SqliteConnector, SqliteStore, SqliteTransaction};
