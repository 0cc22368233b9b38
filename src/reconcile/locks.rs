//! Per-target single-flight locks.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = DashMap<String, Arc<Mutex<()>>>;

/// One async mutex per target id, created on first use and removed once no
/// request holds or waits for it.
///
/// Requests for different targets never contend; requests for the same
/// target queue in FIFO order.
#[derive(Debug, Default)]
pub struct TargetLocks {
    locks: Arc<LockTable>,
}

impl TargetLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `target_id`.
    pub async fn acquire(&self, target_id: &str) -> TargetPermit {
        let lock = Arc::clone(self.locks.entry(target_id.to_string()).or_default().value());
        let guard = lock.lock_owned().await;
        TargetPermit {
            guard: Some(guard),
            locks: Arc::clone(&self.locks),
            target_id: target_id.to_string(),
        }
    }

    /// True when a request currently holds `target_id`.
    #[must_use]
    pub fn is_held(&self, target_id: &str) -> bool {
        self.locks.get(target_id).is_some_and(|lock| lock.try_lock().is_err())
    }

    /// Number of targets with a holder or a waiter.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// True when no target is held or awaited.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held for the whole run of one request; dropping it admits the next
/// request for the same target.
#[derive(Debug)]
pub struct TargetPermit {
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockTable>,
    target_id: String,
}

impl TargetPermit {
    /// Target this permit serializes.
    #[must_use]
    pub fn target_id(&self) -> &str {
        &self.target_id
    }
}

impl Drop for TargetPermit {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Waiters hold a clone of the mutex, so only idle entries go.
        self.locks.remove_if(&self.target_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
