use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use playerbound_core::storage::EntityStore;

use crate::uow::UnitOfWork;

/// One durable store connection as seen by a request scope: the connection,
/// the identity map of entities loaded through it, and whether a
/// transaction is currently open on it.
pub struct StoreContext {
    store: Arc<dyn EntityStore>,
    unit_of_work: UnitOfWork,
    in_transaction: AtomicBool,
}

impl StoreContext {
    pub fn new(store: Arc<dyn EntityStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            unit_of_work: UnitOfWork::new(),
            in_transaction: AtomicBool::new(false),
        })
    }

    pub fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }

    pub fn unit_of_work(&self) -> &UnitOfWork {
        &self.unit_of_work
    }

    /// While true, repositories defer entity submission to the coordinator.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction.load(Ordering::SeqCst)
    }

    pub(crate) fn set_in_transaction(&self, value: bool) {
        self.in_transaction.store(value, Ordering::SeqCst);
    }
}

impl fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreContext")
            .field("in_transaction", &self.in_transaction())
            .finish_non_exhaustive()
    }
}
