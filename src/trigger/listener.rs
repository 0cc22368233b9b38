//! Drains event subscriptions into the hook trigger.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::model::{ChangeEvent, ObjectKind};
use crate::ports::EventSource;

use super::{Dispatch, Triggers};

/// Dispatches every event from `events` on its own task until the stream
/// ends, then waits for all of them and returns their outcomes.
///
/// Events for different targets run concurrently; events for the same
/// target queue on the engine's per-target lock.
pub async fn listen(
    triggers: Arc<Triggers>,
    mut events: UnboundedReceiver<ChangeEvent>,
) -> Vec<Dispatch> {
    let mut tasks = JoinSet::new();
    while let Some(event) = events.recv().await {
        let triggers = Arc::clone(&triggers);
        tasks.spawn(async move { triggers.on_event(&event).await });
    }

    let mut outcomes = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => error!("event dispatch task failed: {e}"),
        }
    }
    outcomes
}

/// Subscribes to device and interface events on `source` right away and
/// returns a future that dispatches both streams until they close.
///
/// Subscribing before the future is polled means events published in the
/// meantime are not missed.
pub fn watch(
    triggers: Arc<Triggers>,
    source: &dyn EventSource,
) -> impl Future<Output = Vec<Dispatch>> + Send + 'static {
    let devices = source.subscribe(ObjectKind::Device);
    let interfaces = source.subscribe(ObjectKind::Interface);
    info!("listening for change events");

    async move {
        let (mut outcomes, more) = tokio::join!(
            listen(Arc::clone(&triggers), devices),
            listen(triggers, interfaces)
        );
        outcomes.extend(more);
        outcomes
    }
}
