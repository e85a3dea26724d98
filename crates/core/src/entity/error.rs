use thiserror::Error;

use crate::cache::CacheError;
use crate::storage::RepositoryError;

/// Errors surfaced by entity repositories and transaction coordination.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntityError {
    /// The key is absent from the identity map, the cache and the store.
    #[error("{entity_type} not found: {key}")]
    NotFound {
        entity_type: &'static str,
        key: String,
    },
    /// Any distributed cache I/O failure, wrapped at the repository boundary.
    #[error("Cache failure: {0}")]
    Cache(#[from] CacheError),
    /// Durable store failures, concurrency conflicts included, unchanged.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    /// At least one store committed before another failed. The stores now
    /// disagree and need manual remediation.
    #[error("The transaction was broken between databases ({} failed commits)", errors.len())]
    CrossStoreCommit { errors: Vec<RepositoryError> },
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
    #[error("Invalid key for {entity_type}: {reason}")]
    InvalidKey {
        entity_type: &'static str,
        reason: String,
    },
    #[error("Missing capability: {0}")]
    MissingCapability(&'static str),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl EntityError {
    /// True for failures that must never be retried automatically.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EntityError::CrossStoreCommit { .. })
    }

    /// True if the durable store rejected a stale version.
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, EntityError::Repository(e) if e.is_concurrency_conflict())
    }
}

/// Result type for entity operations.
pub type Result<T> = std::result::Result<T, EntityError>;
