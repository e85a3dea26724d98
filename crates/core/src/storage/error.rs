use thiserror::Error;

/// Errors that can occur during durable store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    /// A version-checked write matched no row: the stored version moved on.
    #[error("{entity_type} {key} was modified concurrently (expected version {expected_version})")]
    ConcurrencyConflict {
        entity_type: &'static str,
        key: String,
        expected_version: i64,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl RepositoryError {
    /// Returns true if this error is an optimistic concurrency rejection.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, RepositoryError::ConcurrencyConflict { .. })
    }
}

/// Result type for durable store operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
