//! Replays change events from a JSON-lines file onto an [`EventBus`].

use std::path::Path;

use crate::adapters::memory::EventBus;
use crate::model::ChangeEvent;
use crate::ports::PortError;

/// Parses `path` as one [`ChangeEvent`] per line and publishes each onto
/// `bus`. Blank lines are skipped. Returns the number of events published.
///
/// # Errors
///
/// Returns an error naming the line number when the file cannot be read or
/// a line is not a valid event. Events before the bad line are already
/// published.
pub fn publish_from_file(path: &Path, bus: &EventBus) -> Result<usize, PortError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read events {}: {e}", path.display()))?;

    let mut published = 0;
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event: ChangeEvent = serde_json::from_str(line)
            .map_err(|e| format!("{}:{}: invalid event: {e}", path.display(), index + 1))?;
        bus.publish(&event);
        published += 1;
    }
    Ok(published)
}
