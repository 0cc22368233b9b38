//! Result sink port.

use super::PortError;
use crate::model::ReconciliationResult;

/// Receives every finalized reconciliation result.
pub trait ResultSink: Send + Sync {
    /// Stores one result.
    ///
    /// # Errors
    ///
    /// Returns an error when the store rejects or cannot persist the result.
    /// The engine logs such errors; they never alter the result itself.
    fn publish(&self, result: &ReconciliationResult) -> Result<(), PortError>;
}
