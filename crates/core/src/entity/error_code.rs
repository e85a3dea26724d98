//! Pure mapping of entity errors to the externally visible error codes.

use super::EntityError;

/// Error codes returned to game clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    BadRequest = 10400,
    Unauthorized = 10401,
    NotFound = 10402,
    Unknown = 99999,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Maps an [`EntityError`] to its client-facing [`ErrorCode`].
///
/// - `NotFound` -> `NotFound`
/// - `Cache` -> `NotFound` (cache failures are reported like missing data)
/// - `InvalidKey` -> `BadRequest`
/// - everything else, `CrossStoreCommit` included -> `Unknown`
///
/// # Examples
///
/// ```
/// use playerbound_core::cache::CacheError;
/// use playerbound_core::entity::{entity_error_code, EntityError, ErrorCode};
///
/// let error = EntityError::Cache(CacheError::ConnectionFailed("refused".to_string()));
/// assert_eq!(entity_error_code(&error), ErrorCode::NotFound);
/// ```
pub fn entity_error_code(error: &EntityError) -> ErrorCode {
    match error {
        EntityError::NotFound { .. } => ErrorCode::NotFound,
        EntityError::Cache(_) => ErrorCode::NotFound,
        EntityError::InvalidKey { .. } => ErrorCode::BadRequest,
        EntityError::Repository(_)
        | EntityError::CrossStoreCommit { .. }
        | EntityError::InvalidOperation(_)
        | EntityError::MissingCapability(_)
        | EntityError::Serialization(_) => ErrorCode::Unknown,
    }
}
