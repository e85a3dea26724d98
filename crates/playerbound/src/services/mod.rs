//! Player registration and login, built on the request scope's repositories.
//!
//! Callers run each service inside one transaction: begin, call, commit.

mod error;
mod login;
mod registration;

pub use error::{Result, ServiceError};
pub use login::LoginService;
pub use registration::RegistrationService;
