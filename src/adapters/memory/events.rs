//! Publish/subscribe event bus.
//!
//! Host adapters (webhook receivers, message-queue consumers, the CLI's
//! JSON-lines reader) publish onto the bus; the trigger listener subscribes.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::model::{ChangeEvent, ObjectKind};
use crate::ports::EventSource;

/// Fan-out bus keyed by object kind.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<HashMap<ObjectKind, Vec<UnboundedSender<ChangeEvent>>>>,
}

impl EventBus {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `event` to every live subscriber of its object kind and
    /// returns how many received it.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(senders) = subscribers.get_mut(&event.object_kind) else {
            return 0;
        };
        senders.retain(|tx| tx.send(event.clone()).is_ok());
        senders.len()
    }

    /// Drops every subscription; open streams end once drained.
    pub fn close(&self) {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl EventSource for EventBus {
    fn subscribe(&self, kind: ObjectKind) -> UnboundedReceiver<ChangeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(tx);
        rx
    }
}
