use chrono::{DateTime, Utc};

use playerbound_core::player::{PlayerAuth, PlayerBasic};

use crate::scope::RequestScope;

use super::Result;

/// Creates new players.
pub struct RegistrationService<'a> {
    scope: &'a RequestScope,
}

impl<'a> RegistrationService<'a> {
    pub fn new(scope: &'a RequestScope) -> Self {
        Self { scope }
    }

    /// Allocates a player id and creates the player's auth and profile
    /// records. Returns the new player id.
    pub async fn register(
        &self,
        device_id: &str,
        uid: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<i64> {
        let player_id = self.scope.player_ids.next_id().await?;
        let hasher = self.scope.hasher()?;

        let auth = PlayerAuth::create(player_id, device_id, uid, hasher, now)?;
        self.scope.auth.create(auth).await?;
        self.scope
            .basics
            .create(PlayerBasic::create(player_id, name, now))
            .await?;

        tracing::info!(player_id, device_id, "Player registered");
        Ok(player_id)
    }
}
