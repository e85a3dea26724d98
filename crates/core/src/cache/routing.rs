//! Read routing for cache-backed repositories.
//!
//! A repository instance reads from a replica until it performs its first
//! write, after which it reads from the primary for the rest of its lifetime
//! so it never observes its own writes lagging behind on a replica.

use std::sync::atomic::{AtomicBool, Ordering};

/// Which cache node a read should prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPreference {
    #[default]
    PreferReplica,
    PreferPrimary,
}

/// One-directional read routing policy owned by a single repository instance.
#[derive(Debug, Default)]
pub struct ReadRouting {
    written: AtomicBool,
}

impl ReadRouting {
    pub fn new() -> Self {
        Self::default()
    }

    /// The preference to use for the next read.
    pub fn preference(&self) -> ReadPreference {
        if self.written.load(Ordering::Acquire) {
            ReadPreference::PreferPrimary
        } else {
            ReadPreference::PreferReplica
        }
    }

    /// Records a write-class operation. Never reverts.
    pub fn record_write(&self) {
        self.written.store(true, Ordering::Release);
    }

    pub fn has_written(&self) -> bool {
        self.written.load(Ordering::Acquire)
    }
}
