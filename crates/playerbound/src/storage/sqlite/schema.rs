//! SQLite schema definitions and transaction statements.
//!
//! Pure data, no I/O. Row-level statements are generated from table
//! descriptors in [`super::sql`].

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
-- Device credentials, one row per (player, device).
-- Text key columns compare case-insensitively, like cache keys do.
CREATE TABLE IF NOT EXISTS player_auth (
    player_id INTEGER NOT NULL,
    device_id TEXT NOT NULL COLLATE NOCASE,
    player_uid_hash TEXT NOT NULL,
    created_at TEXT NOT NULL,
    version INTEGER NOT NULL,
    PRIMARY KEY (player_id, device_id)
);

-- Player profiles
CREATE TABLE IF NOT EXISTS player_basics (
    player_id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    tutorial_progress INTEGER NOT NULL,
    stamina INTEGER NOT NULL,
    last_stamina_updated_at TEXT NOT NULL,
    last_login TEXT NOT NULL,
    created_at TEXT NOT NULL,
    version INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_player_basics_created_at ON player_basics(created_at);
"#;

/// Connection settings applied to every new connection.
pub const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

pub const BEGIN: &str = "BEGIN";
pub const COMMIT: &str = "COMMIT";
pub const ROLLBACK: &str = "ROLLBACK";
