//! `converge reconcile` command.

use crate::error::Result;
use crate::model::RequestOptions;
use crate::trigger::Triggers;

/// Runs a manual request for `target` with `options` and prints the result.
///
/// # Errors
///
/// Returns an error for a blank target or when the reconciliation failed.
pub async fn run(triggers: &Triggers, target: &str, options: RequestOptions) -> Result<()> {
    let result = triggers.manual(target, options).await?;
    super::report(result)
}
