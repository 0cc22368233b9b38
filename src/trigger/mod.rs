//! The three ways a reconciliation gets started.
//!
//! - **manual**: an operator supplies every option, including `replace`.
//! - **pre-bound**: only the target is supplied; options come from settings.
//! - **hook**: a change event arrives; it is gated by the action switches,
//!   the relevance filter, and the readiness validator, and `replace` is
//!   always off.
//!
//! All three build a [`ReconciliationRequest`] and call [`Engine::run`] the
//! same way.

pub mod listener;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::model::{
    ChangeAction, ChangeEvent, Initiator, ReconciliationRequest, ReconciliationResult,
    RequestError, RequestOptions,
};
use crate::reconcile::{is_relevant, relevant_fields, Engine, NotReady};
use crate::settings::{HookSettings, PreboundSettings, RelevanceSettings, Settings};

pub use listener::{listen, watch};

/// Why an event did not start a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Deletions are logged and never reconciled.
    Deleted,
    /// `hook.auto_on_create` is off.
    AutoCreateDisabled,
    /// `hook.auto_on_update` is off.
    AutoUpdateDisabled,
    /// No whitelisted field changed.
    NotRelevant,
    /// The target is not ready.
    NotReady(NotReady),
    /// The request could not be built.
    InvalidRequest(RequestError),
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted => f.write_str("deleted records are not reconciled"),
            Self::AutoCreateDisabled => f.write_str("automatic reconciliation on create is off"),
            Self::AutoUpdateDisabled => f.write_str("automatic reconciliation on update is off"),
            Self::NotRelevant => f.write_str("no relevant field changed"),
            Self::NotReady(reason) => write!(f, "target not ready: {reason}"),
            Self::InvalidRequest(err) => write!(f, "invalid request: {err}"),
        }
    }
}

/// Outcome of handing one event to the hook trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The engine ran.
    Ran(ReconciliationResult),
    /// The event was dropped before reaching the engine.
    Ignored(IgnoreReason),
}

impl Dispatch {
    /// The result, when the engine ran.
    #[must_use]
    pub fn result(&self) -> Option<&ReconciliationResult> {
        match self {
            Self::Ran(result) => Some(result),
            Self::Ignored(_) => None,
        }
    }
}

/// Builds requests for each initiator and runs them on a shared engine.
pub struct Triggers {
    engine: Arc<Engine>,
    relevance: RelevanceSettings,
    hook: HookSettings,
    prebound: PreboundSettings,
}

impl Triggers {
    /// Creates the trigger surface over `engine`.
    #[must_use]
    pub fn new(engine: Arc<Engine>, settings: &Settings) -> Self {
        Self {
            engine,
            relevance: settings.relevance.clone(),
            hook: settings.hook,
            prebound: settings.prebound,
        }
    }

    /// The engine requests are run on.
    #[must_use]
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    fn request(
        &self,
        target_id: &str,
        options: RequestOptions,
        initiator: Initiator,
    ) -> Result<ReconciliationRequest, RequestError> {
        let ctx = self.engine.context();
        ReconciliationRequest::new(
            ctx.id_gen.generate_id(),
            target_id,
            options,
            initiator,
            ctx.clock.now(),
        )
    }

    /// Runs an operator request with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::EmptyTarget`] for a blank target id.
    pub async fn manual(
        &self,
        target_id: &str,
        options: RequestOptions,
    ) -> Result<ReconciliationResult, RequestError> {
        let request = self.request(target_id, options, Initiator::Manual)?;
        Ok(self.engine.run(request).await)
    }

    /// Runs a one-shot request using the configured pre-bound options.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::EmptyTarget`] for a blank target id.
    pub async fn prebound(&self, target_id: &str) -> Result<ReconciliationResult, RequestError> {
        let request = self.request(target_id, self.prebound.options(), Initiator::Button)?;
        Ok(self.engine.run(request).await)
    }

    /// Builds the request a hook would run for `event`. `replace` is always
    /// off.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::EmptyTarget`] when the event names no target.
    pub fn hook_request(&self, event: &ChangeEvent) -> Result<ReconciliationRequest, RequestError> {
        let options = RequestOptions { dry_run: self.hook.dry_run, replace: false, commit: true };
        self.request(&event.target_id, options, Initiator::Hook)
    }

    /// Applies the hook gates to `event` and runs the engine when they all
    /// pass.
    pub async fn on_event(&self, event: &ChangeEvent) -> Dispatch {
        match self.gate(event) {
            Ok(request) => Dispatch::Ran(self.engine.run(request).await),
            Err(reason) => {
                match &reason {
                    IgnoreReason::Deleted => info!(
                        target_id = %event.target_id,
                        kind = %event.object_kind,
                        "deletion observed, not reconciling"
                    ),
                    IgnoreReason::NotReady(not_ready) => info!(
                        target_id = %event.target_id,
                        reason = not_ready.code(),
                        "event ignored: {reason}"
                    ),
                    _ => debug!(
                        target_id = %event.target_id,
                        kind = %event.object_kind,
                        action = %event.action,
                        "event ignored: {reason}"
                    ),
                }
                Dispatch::Ignored(reason)
            }
        }
    }

    fn gate(&self, event: &ChangeEvent) -> Result<ReconciliationRequest, IgnoreReason> {
        match event.action {
            ChangeAction::Deleted => return Err(IgnoreReason::Deleted),
            ChangeAction::Created if !self.hook.auto_on_create => {
                return Err(IgnoreReason::AutoCreateDisabled)
            }
            ChangeAction::Updated if !self.hook.auto_on_update => {
                return Err(IgnoreReason::AutoUpdateDisabled)
            }
            ChangeAction::Created | ChangeAction::Updated => {}
        }

        let whitelist = self.relevance.whitelist(event.object_kind);
        if !is_relevant(event, whitelist) {
            return Err(IgnoreReason::NotRelevant);
        }
        debug!(
            target_id = %event.target_id,
            fields = ?relevant_fields(event, whitelist),
            "relevant change"
        );

        self.engine.check(&event.target_id).map_err(IgnoreReason::NotReady)?;
        self.hook_request(event).map_err(IgnoreReason::InvalidRequest)
    }
}
