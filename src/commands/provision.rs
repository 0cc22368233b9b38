//! `converge provision` command.

use crate::error::Result;
use crate::trigger::Triggers;

/// Runs the pre-bound request for `target` and prints the result.
///
/// # Errors
///
/// Returns an error for a blank target or when the reconciliation failed.
pub async fn run(triggers: &Triggers, target: &str) -> Result<()> {
    let result = triggers.prebound(target).await?;
    super::report(result)
}
