//! In-memory target inventory.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::model::ManagedTarget;
use crate::ports::{PortError, TargetInventory};

/// Inventory held in a map, mutable from the embedding application.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    targets: RwLock<HashMap<String, ManagedTarget>>,
}

impl MemoryInventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a target, keyed by its id.
    pub fn upsert(&self, target: ManagedTarget) {
        self.targets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(target.id.clone(), target);
    }

    /// Removes a target, returning it if present.
    pub fn remove(&self, target_id: &str) -> Option<ManagedTarget> {
        self.targets.write().unwrap_or_else(PoisonError::into_inner).remove(target_id)
    }
}

impl FromIterator<ManagedTarget> for MemoryInventory {
    fn from_iter<I: IntoIterator<Item = ManagedTarget>>(iter: I) -> Self {
        let targets = iter.into_iter().map(|t| (t.id.clone(), t)).collect();
        Self { targets: RwLock::new(targets) }
    }
}

impl TargetInventory for MemoryInventory {
    fn snapshot(&self, target_id: &str) -> Result<Option<ManagedTarget>, PortError> {
        Ok(self.targets.read().unwrap_or_else(PoisonError::into_inner).get(target_id).cloned())
    }
}
