//! `converge render` command.

use tracing::info;

use crate::error::{Error, Result};
use crate::reconcile::{Engine, NotReady};

/// Renders the intended configuration of `target` and prints it. Nothing is
/// sent to the device.
///
/// # Errors
///
/// Returns an error when the target is unknown or rendering fails.
pub fn run(engine: &Engine, target: &str) -> Result<()> {
    let snapshot = engine
        .context()
        .inventory
        .snapshot(target)
        .map_err(|e| Error::port("reading inventory", e))?
        .ok_or_else(|| NotReady::TargetNotFound(target.to_string()))?;

    let intended = engine.render_intended(&snapshot)?;
    info!(target_id = %intended.target_id, source_hash = %intended.source_hash, "rendered");
    print!("{}", intended.rendered_text);
    if !intended.rendered_text.ends_with('\n') {
        println!();
    }
    Ok(())
}
