use std::sync::Arc;

use playerbound_core::entity::Result;

use crate::context::StoreContext;

use super::coordinator::{CoordinatorSlot, TransactionCoordinator};

/// Hands out the request scope's current transaction.
pub struct TransactionManager {
    contexts: Vec<Arc<StoreContext>>,
    current: Arc<CoordinatorSlot>,
}

impl TransactionManager {
    /// `contexts` are the store connections a transaction spans, in commit order.
    pub fn new(contexts: Vec<Arc<StoreContext>>) -> Self {
        Self {
            contexts,
            current: Arc::new(CoordinatorSlot::default()),
        }
    }

    /// Returns the open transaction, or opens one on every bound context.
    ///
    /// A transaction stays current until it is disposed, even once
    /// committed or rolled back.
    pub async fn begin_transaction(&self) -> Result<Arc<TransactionCoordinator>> {
        let mut current = self.current.lock().await;
        if let Some(coordinator) = current.as_ref() {
            return Ok(Arc::clone(coordinator));
        }

        let coordinator =
            TransactionCoordinator::open(&self.contexts, Arc::downgrade(&self.current)).await?;
        *current = Some(Arc::clone(&coordinator));
        Ok(coordinator)
    }

    pub async fn current(&self) -> Option<Arc<TransactionCoordinator>> {
        self.current.lock().await.clone()
    }

    /// Disposes the current transaction, if any.
    pub async fn dispose(&self) -> Result<()> {
        match self.current().await {
            Some(coordinator) => coordinator.dispose().await,
            None => Ok(()),
        }
    }
}
