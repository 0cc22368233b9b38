//! Command dispatch and handlers.

pub mod check;
pub mod provision;
pub mod reconcile;
pub mod render;
pub mod watch;

use std::sync::Arc;

use crate::cli::{Cli, Command};
use crate::context::ServiceContext;
use crate::error::{Error, Result};
use crate::model::{ReconciliationResult, RequestOptions};
use crate::reconcile::Engine;
use crate::settings::Settings;
use crate::trigger::Triggers;

/// Dispatch a parsed command to its handler.
///
/// Settings are loaded first, then the file-backed adapters are wired and
/// the command runs on a multi-threaded runtime.
///
/// # Errors
///
/// Returns an error string if settings cannot be loaded or the command
/// fails.
pub fn dispatch(cli: &Cli) -> std::result::Result<(), String> {
    let settings = Settings::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    let ctx = ServiceContext::live(&settings);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to start runtime: {e}"))?;
    runtime.block_on(dispatch_with_context(&cli.command, &settings, ctx)).map_err(|e| e.to_string())
}

/// Dispatch a command with the given settings and service context.
///
/// # Errors
///
/// Returns the handler's error.
pub async fn dispatch_with_context(
    command: &Command,
    settings: &Settings,
    ctx: ServiceContext,
) -> Result<()> {
    let engine = Arc::new(
        Engine::new(ctx)
            .with_timeouts(settings.timeouts.stage_timeouts())
            .with_allowed_statuses(settings.readiness.allowed_statuses.iter().copied()),
    );
    let triggers = Arc::new(Triggers::new(Arc::clone(&engine), settings));

    match command {
        Command::Reconcile { target, apply, replace, no_commit } => {
            let options = RequestOptions { dry_run: !apply, replace: *replace, commit: !no_commit };
            reconcile::run(&triggers, target, options).await
        }
        Command::Provision { target } => provision::run(&triggers, target).await,
        Command::Watch { events } => watch::run(triggers, events).await,
        Command::Render { target } => render::run(&engine, target),
        Command::Check { target } => check::run(&engine, target),
    }
}

/// Prints `result` as pretty JSON on stdout and turns an escalated failure
/// into an error.
fn report(result: ReconciliationResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&result)?);
    result.into_outcome().map(|_| ()).map_err(Error::from)
}
