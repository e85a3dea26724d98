use crate::entity::CompositeKey;

/// Data name of the entity cache keyspace.
pub const ENTITY_DATA_NAME: &str = "Cache";

/// Data name and counter key used for player id allocation.
pub const PLAYER_ID_DATA_NAME: &str = "player_id";
pub const PLAYER_ID_KEY: &str = "player_id";

/// Data name of the session keyspace.
pub const SESSION_DATA_NAME: &str = "session_data";

/// Builds a fully namespaced cache key: `environment:data_name:key`, lower-cased.
pub fn namespaced_key(environment: &str, data_name: &str, key: &str) -> String {
    format!("{}:{}:{}", environment, data_name, key).to_lowercase()
}

/// Returns the keyspace-relative cache key for an entity: its type name
/// followed by each composite key value, in key order.
pub fn entity_key(type_name: &str, key: &CompositeKey) -> String {
    let mut out = String::from(type_name);
    for value in key.values() {
        out.push(':');
        out.push_str(&value.to_string());
    }
    out
}

/// Returns the keyspace-relative session key for a player.
pub fn session_key(player_id: i64) -> String {
    player_id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::KeyValue;

    #[test]
    fn test_namespaced_key_is_lowercase() {
        assert_eq!(
            namespaced_key("Production", "Cache", "PlayerAuth:1:Dev-1"),
            "production:cache:playerauth:1:dev-1"
        );
    }

    #[test]
    fn test_entity_key_joins_values_in_order() {
        let key = CompositeKey::new(vec![KeyValue::Integer(42), KeyValue::from("dev-1")]);
        assert_eq!(entity_key("PlayerAuth", &key), "PlayerAuth:42:dev-1");
    }

    #[test]
    fn test_entity_key_single_value() {
        let key = CompositeKey::new(vec![KeyValue::Integer(7)]);
        assert_eq!(entity_key("PlayerBasic", &key), "PlayerBasic:7");
    }

    #[test]
    fn test_session_key() {
        assert_eq!(session_key(12), "12");
    }
}
