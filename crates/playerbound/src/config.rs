use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Deployment environment, used to namespace cache keys (default: "development")
    pub environment: String,
    /// Path to SQLite database file (default: "playerbound.db")
    pub sqlite_path: String,
    /// Primary Redis node; read only by the `redis` backend.
    #[allow(dead_code)]
    pub redis_url: String,
    /// Optional Redis replica URL served to replica-preferred reads.
    #[allow(dead_code)]
    pub redis_replica_url: Option<String>,
    /// Redis URL for data that must survive cache flushes, such as the
    /// player id counter (default: same as `redis_url`)
    #[allow(dead_code)]
    pub persistent_redis_url: String,
    /// Maximum number of in-memory cache entries (default: 10,000)
    pub cache_max_entries: usize,
    /// TTL for cached player-scoped entities in seconds (default: 1,800)
    pub player_cache_ttl_seconds: u64,
    /// TTL for player sessions in seconds (default: 86,400)
    pub session_ttl_seconds: u64,
    /// bcrypt cost used to hash device uids (default: 10)
    pub uid_hash_cost: u32,
}

fn text_var(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Unset and unparsable values both fall back to the default.
fn parsed_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `APP_ENVIRONMENT` | `development` |
    /// | `SQLITE_PATH` | `playerbound.db` |
    /// | `REDIS_URL` | `redis://localhost:6379` |
    /// | `REDIS_REPLICA_URL` | unset |
    /// | `PERSISTENT_REDIS_URL` | value of `REDIS_URL` |
    /// | `CACHE_MAX_ENTRIES` | 10000 |
    /// | `PLAYER_CACHE_TTL_SECONDS` | 1800 |
    /// | `SESSION_TTL_SECONDS` | 86400 |
    /// | `UID_HASH_COST` | 10 |
    pub fn from_env() -> Self {
        let redis_url = text_var("REDIS_URL", "redis://localhost:6379");

        Self {
            environment: text_var("APP_ENVIRONMENT", "development"),
            sqlite_path: text_var("SQLITE_PATH", "playerbound.db"),
            redis_replica_url: env::var("REDIS_REPLICA_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            persistent_redis_url: text_var("PERSISTENT_REDIS_URL", &redis_url),
            redis_url,
            cache_max_entries: parsed_var("CACHE_MAX_ENTRIES", 10_000),
            player_cache_ttl_seconds: parsed_var("PLAYER_CACHE_TTL_SECONDS", 1_800),
            session_ttl_seconds: parsed_var("SESSION_TTL_SECONDS", 86_400),
            uid_hash_cost: parsed_var("UID_HASH_COST", 10),
        }
    }

    /// How long cached `PlayerAuth` and `PlayerBasic` copies live.
    pub fn player_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.player_cache_ttl_seconds)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
