mod capability;
mod error;
mod error_code;
mod key;
mod model;
mod state;
mod tracked;

pub use capability::Capabilities;
pub use error::{EntityError, Result};
pub use error_code::{entity_error_code, ErrorCode};
pub use key::{compose_key, CompositeKey, KeyValue};
pub use model::{Entity, PlayerBound};
pub use state::{submit_callback, EntityState, SubmitCallback, SubmitFuture};
pub use tracked::{Submit, Tracked};
