//! bcrypt-backed uid hashing.

use playerbound_core::player::{PlayerError, Result, UidHasher};

/// Hashes device uids with bcrypt at a fixed cost.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl UidHasher for BcryptHasher {
    fn hash(&self, uid: &str) -> Result<String> {
        bcrypt::hash(uid, self.cost).map_err(|e| PlayerError::Hashing(e.to_string()))
    }

    fn verify(&self, uid: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(uid, hash).map_err(|e| PlayerError::Hashing(e.to_string()))
    }
}
