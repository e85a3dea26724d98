use super::Result;

/// Hashes and verifies player uids. Injected into [`super::PlayerAuth`]
/// as a capability.
pub trait UidHasher: Send + Sync {
    fn hash(&self, uid: &str) -> Result<String>;

    fn verify(&self, uid: &str, hash: &str) -> Result<bool>;
}
