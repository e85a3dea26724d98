use chrono::{DateTime, Utc};

use playerbound_core::player::{PlayerAuth, Session};

use crate::scope::RequestScope;

use super::{Result, ServiceError};

/// Authenticates players and opens sessions.
pub struct LoginService<'a> {
    scope: &'a RequestScope,
}

impl<'a> LoginService<'a> {
    pub fn new(scope: &'a RequestScope) -> Self {
        Self { scope }
    }

    /// Verifies `uid` against the player's auth record for `device_id`,
    /// stores a fresh session and records the login time on the profile.
    pub async fn login(
        &self,
        player_id: i64,
        device_id: &str,
        uid: &str,
        now: DateTime<Utc>,
    ) -> Result<Session> {
        let auth = self
            .scope
            .auth
            .find(player_id, vec![device_id.into()])
            .await?;
        if !auth.read().await.verify(uid)? {
            tracing::warn!(player_id, device_id, "Login rejected");
            return Err(ServiceError::Unauthorized { player_id });
        }

        let session = Session::new(PlayerAuth::generate_session_id(), now);
        self.scope.sessions.set(player_id, &session).await?;

        let basic = self.scope.basics.find(player_id, vec![]).await?;
        basic.write().await.set_last_login(now);
        self.scope.basics.update(&basic).await?;

        tracing::info!(player_id, "Player logged in");
        Ok(session)
    }
}
