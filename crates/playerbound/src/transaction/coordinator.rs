//! Logical transaction spanning one or more store connections.
//!
//! The coordinator owns one native handle per enlisted [`StoreContext`].
//! Commit walks the handles in enlistment order and only submits tracked
//! entities, firing their staged cache callbacks, once every handle has
//! committed.

use std::fmt;
use std::sync::{Arc, Weak};

use futures_util::future::join_all;
use tokio::sync::Mutex;

use playerbound_core::entity::{EntityError, Result};
use playerbound_core::storage::StoreTransaction;

use crate::context::StoreContext;

/// Slot through which a manager holds its current coordinator.
pub(crate) type CoordinatorSlot = Mutex<Option<Arc<TransactionCoordinator>>>;

/// A native handle together with the connection it was opened on.
struct Enlistment {
    context: Arc<StoreContext>,
    handle: Box<dyn StoreTransaction>,
}

#[derive(Default)]
struct Inner {
    enlistments: Vec<Enlistment>,
    /// Set by the first commit or rollback; both are one-shot.
    status_fixed: bool,
    disposed: bool,
}

pub struct TransactionCoordinator {
    inner: Mutex<Inner>,
    manager: Weak<CoordinatorSlot>,
}

impl TransactionCoordinator {
    /// Opens a native transaction on every context, in order. If one fails
    /// to open, the ones already opened are released.
    pub(crate) async fn open(
        contexts: &[Arc<StoreContext>],
        manager: Weak<CoordinatorSlot>,
    ) -> Result<Arc<Self>> {
        let mut enlistments: Vec<Enlistment> = Vec::with_capacity(contexts.len());

        for context in contexts {
            match context.store().begin_transaction().await {
                Ok(handle) => {
                    context.set_in_transaction(true);
                    enlistments.push(Enlistment {
                        context: Arc::clone(context),
                        handle,
                    });
                }
                Err(e) => {
                    release_all(enlistments).await;
                    return Err(e.into());
                }
            }
        }

        tracing::debug!(stores = enlistments.len(), "Transaction started");
        Ok(Arc::new(Self {
            inner: Mutex::new(Inner {
                enlistments,
                ..Inner::default()
            }),
            manager,
        }))
    }

    /// Commits every native handle, then submits every tracked entity.
    ///
    /// If the first commit fails its error is returned unchanged and no
    /// entity is submitted. If a later commit fails the remaining handles
    /// are still committed and every failure is reported together as
    /// [`EntityError::CrossStoreCommit`]; the stores now disagree and the
    /// error must not be retried. Calling commit again is a no-op.
    pub async fn commit(&self) -> Result<()> {
        let contexts = {
            let mut inner = self.inner.lock().await;
            if inner.status_fixed {
                return Ok(());
            }
            inner.status_fixed = true;

            let mut committed = 0;
            let mut errors = Vec::new();
            for enlistment in inner.enlistments.iter_mut() {
                match enlistment.handle.commit().await {
                    Ok(()) => committed += 1,
                    Err(e) if committed == 0 => return Err(EntityError::Repository(e)),
                    Err(e) => errors.push(e),
                }
            }

            if !errors.is_empty() {
                tracing::error!(
                    committed,
                    failed = errors.len(),
                    "Partial commit across stores, manual remediation required"
                );
                return Err(EntityError::CrossStoreCommit { errors });
            }

            let contexts: Vec<_> = inner
                .enlistments
                .iter()
                .map(|e| Arc::clone(&e.context))
                .collect();
            for context in &contexts {
                context.set_in_transaction(false);
            }
            contexts
        };
        tracing::debug!(stores = contexts.len(), "Transaction committed");

        let mut tracked = Vec::new();
        for context in &contexts {
            tracked.extend(context.unit_of_work().tracked().await);
        }

        let results = join_all(tracked.iter().map(|entity| entity.submit_changes())).await;
        results.into_iter().collect()
    }

    /// Rolls back every native handle. Tracked entities are left as they
    /// are. Calling rollback again, or after commit, is a no-op.
    pub async fn rollback(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.status_fixed {
            return Ok(());
        }
        inner.status_fixed = true;

        let mut first_error = None;
        for enlistment in inner.enlistments.iter_mut() {
            if let Err(e) = enlistment.handle.rollback().await {
                tracing::warn!(error = %e, "Rollback failed");
                first_error.get_or_insert(e);
            }
            enlistment.context.set_in_transaction(false);
        }
        tracing::debug!("Transaction rolled back");

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Rolls back unless already committed or rolled back, releases every
    /// handle and detaches from the owning manager.
    pub async fn dispose(&self) -> Result<()> {
        let rollback = self.rollback().await;

        let enlistments = {
            let mut inner = self.inner.lock().await;
            if inner.disposed {
                return rollback;
            }
            inner.disposed = true;
            std::mem::take(&mut inner.enlistments)
        };
        release_all(enlistments).await;

        if let Some(slot) = self.manager.upgrade() {
            let mut current = slot.lock().await;
            if current
                .as_ref()
                .is_some_and(|c| std::ptr::eq(Arc::as_ptr(c), self))
            {
                *current = None;
            }
        }
        rollback
    }

    /// True once commit or rollback has run.
    pub async fn is_finished(&self) -> bool {
        self.inner.lock().await.status_fixed
    }
}

async fn release_all(enlistments: Vec<Enlistment>) {
    for mut enlistment in enlistments {
        if let Err(e) = enlistment.handle.release().await {
            tracing::warn!(error = %e, "Failed to release store transaction");
        }
        enlistment.context.set_in_transaction(false);
    }
}

impl Drop for TransactionCoordinator {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if inner.disposed || inner.enlistments.is_empty() {
            return;
        }

        tracing::warn!("Transaction dropped without being disposed, rolling back");
        let enlistments = std::mem::take(&mut inner.enlistments);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(release_all(enlistments));
        } else {
            for enlistment in &enlistments {
                enlistment.context.set_in_transaction(false);
            }
        }
    }
}

impl fmt::Debug for TransactionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionCoordinator")
            .finish_non_exhaustive()
    }
}
