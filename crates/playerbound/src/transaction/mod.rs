mod coordinator;
mod manager;

pub use coordinator::TransactionCoordinator;
pub use manager::TransactionManager;
