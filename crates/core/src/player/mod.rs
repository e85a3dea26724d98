//! Player records and the session value.

mod auth;
mod basic;
mod credentials;
mod error;
mod session;

pub use auth::{PlayerAuth, MAX_DEVICE_ID_LEN, PLAYER_AUTH_TABLE};
pub use basic::{PlayerBasic, INITIAL_STAMINA, PLAYER_BASIC_TABLE};
pub use credentials::UidHasher;
pub use error::{PlayerError, Result};
pub use session::Session;
