//! `converge check` command.

use serde_json::json;

use crate::error::Result;
use crate::reconcile::Engine;

/// Validates `target` without connecting and prints the verdict as JSON.
///
/// # Errors
///
/// Returns the not-ready reason when the target cannot be reconciled.
pub fn run(engine: &Engine, target: &str) -> Result<()> {
    match engine.check(target) {
        Ok((snapshot, readiness)) => {
            let verdict = json!({
                "target_id": snapshot.id,
                "ready": true,
                "address": readiness.address,
                "driver_kind": readiness.driver_kind,
                "status": snapshot.status,
            });
            println!("{}", serde_json::to_string_pretty(&verdict)?);
            Ok(())
        }
        Err(reason) => {
            let verdict = json!({
                "target_id": target,
                "ready": false,
                "reason": reason.code(),
                "detail": reason.to_string(),
            });
            println!("{}", serde_json::to_string_pretty(&verdict)?);
            Err(reason.into())
        }
    }
}
