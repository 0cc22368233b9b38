//! Change event subscription port.

use tokio::sync::mpsc::UnboundedReceiver;

use crate::model::{ChangeEvent, ObjectKind};

/// A publish/subscribe feed of inventory change events.
///
/// Host-specific adapters publish onto an implementation of this trait; the
/// trigger surface only ever sees the stream.
pub trait EventSource: Send + Sync {
    /// Subscribes to events for records of `kind`.
    ///
    /// The stream ends when the source shuts down.
    fn subscribe(&self, kind: ObjectKind) -> UnboundedReceiver<ChangeEvent>;
}
