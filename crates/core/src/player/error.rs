use thiserror::Error;

/// Errors raised by player records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("Device id must be at most {max} characters, got {len}")]
    InvalidDeviceId { len: usize, max: usize },
    #[error("Uid hashing failed: {0}")]
    Hashing(String),
    #[error("No uid hasher resolved for this record")]
    MissingHasher,
}

pub type Result<T> = std::result::Result<T, PlayerError>;
