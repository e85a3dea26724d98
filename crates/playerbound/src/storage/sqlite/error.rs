//! Translation of SQLite failures into `RepositoryError`.

use rusqlite::ffi;
use rusqlite::ErrorCode;

use playerbound_core::storage::RepositoryError;

fn closed() -> RepositoryError {
    RepositoryError::ConnectionFailed("SQLite connection closed".to_string())
}

fn map_row_failure(err: &rusqlite::Error, table: &'static str, key: &str) -> RepositoryError {
    let rusqlite::Error::SqliteFailure(failure, _) = err else {
        return match err {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..) => RepositoryError::InvalidData(err.to_string()),
            _ => RepositoryError::QueryFailed(err.to_string()),
        };
    };

    match (failure.code, failure.extended_code) {
        (_, ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE) => {
            RepositoryError::AlreadyExists {
                entity_type: table,
                id: key.to_string(),
            }
        }
        (_, ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
            RepositoryError::InvalidData(format!("{table} row {key} references a missing parent"))
        }
        (ErrorCode::CannotOpen | ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked, _) => {
            RepositoryError::ConnectionFailed(err.to_string())
        }
        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

/// Maps a failure while reading or writing the row `key` of `table`.
///
/// Key collisions become `AlreadyExists`, unreadable columns and dangling
/// references become `InvalidData`, a busy or unopenable database becomes
/// `ConnectionFailed`.
pub fn map_row_error(
    err: tokio_rusqlite::Error,
    table: &'static str,
    key: impl Into<String>,
) -> RepositoryError {
    match &err {
        tokio_rusqlite::Error::Rusqlite(inner) => map_row_failure(inner, table, &key.into()),
        tokio_rusqlite::Error::ConnectionClosed | tokio_rusqlite::Error::Close(_) => closed(),
        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

/// Maps a failed BEGIN, COMMIT or ROLLBACK.
pub fn map_transaction_error(err: tokio_rusqlite::Error) -> RepositoryError {
    match &err {
        tokio_rusqlite::Error::ConnectionClosed | tokio_rusqlite::Error::Close(_) => closed(),
        _ => RepositoryError::TransactionFailed(err.to_string()),
    }
}
