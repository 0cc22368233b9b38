//! Target inventory port.

use super::PortError;
use crate::model::ManagedTarget;

/// Read-only access to the inventory that owns target records.
pub trait TargetInventory: Send + Sync {
    /// Returns a snapshot of the target, or `None` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error when the inventory cannot be read.
    fn snapshot(&self, target_id: &str) -> Result<Option<ManagedTarget>, PortError>;
}
