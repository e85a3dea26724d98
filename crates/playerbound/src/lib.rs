//! Player-bound entity access for a game backend.
//!
//! Entities are read through three tiers (the request scope's identity map,
//! the distributed cache, the durable store) and written with optimistic
//! version checks. Cache write-through runs only after every store
//! transaction of the request has committed.

pub mod cache;
pub mod config;
pub mod context;
pub mod credentials;
pub mod error;
pub mod registry;
pub mod repository;
pub mod scope;
pub mod services;
pub mod state;
pub mod storage;
pub mod transaction;
pub mod uow;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use context::StoreContext;
pub use error::StartupError;
pub use registry::Registry;
pub use repository::EntityRepository;
pub use scope::RequestScope;
pub use state::AppState;
pub use transaction::{TransactionCoordinator, TransactionManager};
pub use uow::UnitOfWork;
