//! Durable store backends.

pub mod sqlite;

pub use sqlite::{SqliteConnector, SqliteStore};
