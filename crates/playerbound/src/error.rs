use thiserror::Error;

use playerbound_core::cache::CacheError;
use playerbound_core::storage::RepositoryError;

/// Failures while wiring the application's backends.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to open durable store: {0}")]
    Store(#[from] RepositoryError),
    #[error("Failed to connect to cache: {0}")]
    Cache(#[from] CacheError),
}
