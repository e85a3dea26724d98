use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The active session of a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub last_login: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>, last_login: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            last_login,
        }
    }
}
