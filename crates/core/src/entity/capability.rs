//! Registry of runtime collaborators injected into entities after they are
//! materialized from any tier.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{EntityError, Result};

#[derive(Default)]
pub struct Capabilities {
    entries: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a capability, builder style.
    pub fn with<T: ?Sized + Send + Sync + 'static>(mut self, value: Arc<T>) -> Self {
        self.insert(value);
        self
    }

    /// Registers a capability, replacing any previous one of the same type.
    pub fn insert<T: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<T>) {
        self.entries.insert(TypeId::of::<Arc<T>>(), Box::new(value));
    }

    /// Resolves a capability by type.
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.entries
            .get(&TypeId::of::<Arc<T>>())
            .and_then(|entry| entry.downcast_ref::<Arc<T>>())
            .cloned()
            .ok_or(EntityError::MissingCapability(type_name::<T>()))
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("len", &self.entries.len())
            .finish()
    }
}
