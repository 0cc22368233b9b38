//! `converge watch` command.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::adapters::file::publish_from_file;
use crate::adapters::memory::EventBus;
use crate::error::{Error, Result};
use crate::trigger::{watch, Dispatch, Triggers};

/// Replays the events in `path` through the hook trigger, printing one JSON
/// line per reconciliation that ran.
///
/// # Errors
///
/// Returns an error when the events file is unreadable or malformed (after
/// dispatching the events before the bad line), or when any reconciliation
/// failed.
pub async fn run(triggers: Arc<Triggers>, path: &Path) -> Result<()> {
    let bus = EventBus::new();
    let listening = watch(triggers, &bus);
    let published = publish_from_file(path, &bus);
    bus.close();
    let outcomes = listening.await;

    let mut failed = 0;
    let mut ignored = 0;
    for outcome in &outcomes {
        match outcome {
            Dispatch::Ran(result) => {
                println!("{}", serde_json::to_string(result)?);
                if result.is_escalated() {
                    failed += 1;
                }
            }
            Dispatch::Ignored(_) => ignored += 1,
        }
    }
    info!(
        events = outcomes.len(),
        ran = outcomes.len() - ignored,
        ignored,
        failed,
        "events processed"
    );

    published.map_err(|e| Error::port("reading change events", e))?;
    if failed > 0 {
        return Err(Error::Port {
            context: "watch".to_string(),
            message: format!("{failed} reconciliation(s) failed"),
        });
    }
    Ok(())
}
