mod error;
mod keys;
mod routing;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{
    entity_key, namespaced_key, session_key, ENTITY_DATA_NAME, PLAYER_ID_DATA_NAME,
    PLAYER_ID_KEY, SESSION_DATA_NAME,
};
pub use routing::{ReadPreference, ReadRouting};
pub use serialization::{deserialize, serialize, SerializationError};
pub use traits::Cache;
