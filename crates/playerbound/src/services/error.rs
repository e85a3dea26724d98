use thiserror::Error;

use playerbound_core::entity::{entity_error_code, EntityError, ErrorCode};
use playerbound_core::player::PlayerError;

/// Errors returned by the player services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error(transparent)]
    Player(#[from] PlayerError),
    #[error("Uid does not match for player {player_id}")]
    Unauthorized { player_id: i64 },
}

impl ServiceError {
    /// Client-facing code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ServiceError::Entity(e) => entity_error_code(e),
            ServiceError::Player(PlayerError::InvalidDeviceId { .. }) => ErrorCode::BadRequest,
            ServiceError::Player(_) => ErrorCode::Unknown,
            ServiceError::Unauthorized { .. } => ErrorCode::Unauthorized,
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ServiceError::Unauthorized { player_id: 1 }.error_code(),
            ErrorCode::Unauthorized
        );
        assert_eq!(
            ServiceError::from(PlayerError::InvalidDeviceId { len: 40, max: 32 }).error_code(),
            ErrorCode::BadRequest
        );
        assert_eq!(
            ServiceError::from(EntityError::NotFound {
                entity_type: "PlayerAuth",
                key: "1:dev-1".to_string()
            })
            .error_code(),
            ErrorCode::NotFound
        );
        assert_eq!(
            ServiceError::from(EntityError::CrossStoreCommit { errors: vec![] }).error_code(),
            ErrorCode::Unknown
        );
    }

    #[test]
    fn test_unauthorized_display() {
        assert_eq!(
            ServiceError::Unauthorized { player_id: 7 }.to_string(),
            "Uid does not match for player 7"
        );
    }
}
