//! Result sink that keeps everything in memory.

use std::sync::{Mutex, PoisonError};

use crate::model::ReconciliationResult;
use crate::ports::{PortError, ResultSink};

/// Collects published results in publication order.
#[derive(Debug, Default)]
pub struct MemoryResultSink {
    results: Mutex<Vec<ReconciliationResult>>,
    reject: bool,
}

impl MemoryResultSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink that refuses every result, as a broken store would.
    #[must_use]
    pub fn rejecting() -> Self {
        Self { reject: true, ..Self::default() }
    }

    /// Returns a copy of everything published so far.
    #[must_use]
    pub fn results(&self) -> Vec<ReconciliationResult> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ResultSink for MemoryResultSink {
    fn publish(&self, result: &ReconciliationResult) -> Result<(), PortError> {
        if self.reject {
            return Err("result store is read-only".into());
        }
        self.results.lock().unwrap_or_else(PoisonError::into_inner).push(result.clone());
        Ok(())
    }
}
