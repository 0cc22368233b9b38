//! The reconciliation engine.
//!
//! One call to [`Engine::run`] walks a single request through
//!
//! ```text
//! INIT -> VALIDATE -> RENDER -> CONNECT -> LOAD -> DIFF -> {DISCARD | COMMIT} -> VERIFY -> DONE
//! ```
//!
//! and always returns a finalized [`ReconciliationResult`]. Stages never
//! repeat and never run out of order. The driver session is owned by a
//! [`SessionGuard`], so it is closed on every exit path.
//!
//! Requests for the same target are serialized by [`TargetLocks`]. Dropping
//! the `run` future before COMMIT abandons the run cleanly; from COMMIT on,
//! the remaining work runs on its own task, which owns the session and the
//! target lock, so a started commit always completes and publishes its
//! result.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::model::{
    ErrorKind, IntendedConfiguration, ManagedTarget, ReconciliationRequest, ReconciliationResult,
    ResultStatus, Stage, StageFailure, TargetStatus,
};
use crate::ports::{Clock, DriverFuture, PortError, ResultSink};
use crate::ServiceContext;

use super::locks::{TargetLocks, TargetPermit};
use super::readiness::{NotReady, Readiness, ReadinessValidator};
use super::session::SessionGuard;
use crate::model::result::ResultBuilder;

/// Upper bounds for the driver operations that talk to a device.
///
/// `load` also bounds `diff` and `discard`; `commit` also bounds the
/// post-commit `confirm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageTimeouts {
    /// Opening a session.
    pub connect: Duration,
    /// Loading a candidate, computing the diff, discarding.
    pub load: Duration,
    /// Committing and confirming.
    pub commit: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            load: Duration::from_secs(60),
            commit: Duration::from_secs(120),
        }
    }
}

/// Runs reconciliation requests against the targets of one inventory.
pub struct Engine {
    ctx: ServiceContext,
    validator: ReadinessValidator,
    timeouts: StageTimeouts,
    locks: TargetLocks,
}

enum Halt {
    Skip(NotReady),
    Fail(StageFailure),
}

impl From<StageFailure> for Halt {
    fn from(failure: StageFailure) -> Self {
        Self::Fail(failure)
    }
}

enum StepError {
    Driver(PortError),
    TimedOut(Duration),
}

impl StepError {
    fn describe(&self, what: &str) -> String {
        match self {
            Self::Driver(e) => format!("{what} failed: {e}"),
            Self::TimedOut(limit) => format!("{what} timed out after {limit:?}"),
        }
    }
}

async fn bounded<T>(limit: Duration, op: DriverFuture<'_, T>) -> Result<T, StepError> {
    match timeout(limit, op).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(StepError::Driver(e)),
        Err(_) => Err(StepError::TimedOut(limit)),
    }
}

impl Engine {
    /// Creates an engine validating against the context's driver registry
    /// and credential provider.
    #[must_use]
    pub fn new(ctx: ServiceContext) -> Self {
        let validator =
            ReadinessValidator::new(ctx.drivers.clone(), Arc::clone(&ctx.credentials));
        Self { ctx, validator, timeouts: StageTimeouts::default(), locks: TargetLocks::new() }
    }

    /// Replaces the stage timeouts.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: StageTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Restricts reconciliation to targets in one of `statuses`.
    #[must_use]
    pub fn with_allowed_statuses(
        mut self,
        statuses: impl IntoIterator<Item = TargetStatus>,
    ) -> Self {
        self.validator = self.validator.with_allowed_statuses(statuses.into_iter().collect());
        self
    }

    /// The collaborators this engine was built with.
    #[must_use]
    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    /// Looks a target up and validates it without connecting.
    ///
    /// # Errors
    ///
    /// Returns why the target cannot be reconciled, including when it does
    /// not exist or the inventory cannot be read.
    pub fn check(&self, target_id: &str) -> Result<(ManagedTarget, Readiness), NotReady> {
        let target = self.snapshot(target_id)?;
        let readiness = self.validator.validate(&target)?;
        Ok((target, readiness))
    }

    /// Renders the intended configuration for `target`.
    ///
    /// # Errors
    ///
    /// Returns a render-stage failure when the renderer fails or returns
    /// nothing but whitespace.
    pub fn render_intended(
        &self,
        target: &ManagedTarget,
    ) -> Result<IntendedConfiguration, StageFailure> {
        let context = target.render_context();
        let rendered_text = self
            .ctx
            .renderer
            .render(&target.id, &target.template_key, &context)
            .map_err(|e| {
                StageFailure::new(
                    ErrorKind::Render,
                    Stage::Render,
                    format!("rendering template `{}` failed: {e}", target.template_key),
                )
            })?;
        let intended = IntendedConfiguration {
            target_id: target.id.clone(),
            rendered_text,
            generated_at: self.ctx.clock.now(),
            source_hash: IntendedConfiguration::source_hash_for(&target.template_key, &context),
        };
        if intended.is_blank() {
            return Err(StageFailure::new(
                ErrorKind::Render,
                Stage::Render,
                format!("template `{}` rendered an empty configuration", target.template_key),
            ));
        }
        Ok(intended)
    }

    /// Reconciles one target and publishes the result to the result sink.
    ///
    /// Never panics on driver or collaborator failures: every outcome,
    /// including failures, is reported in the returned result.
    pub async fn run(&self, request: ReconciliationRequest) -> ReconciliationResult {
        let span = info_span!(
            "reconcile",
            request_id = %request.id(),
            target_id = %request.target_id(),
            initiator = %request.initiator(),
        );
        self.run_locked(request).instrument(span).await
    }

    async fn run_locked(&self, request: ReconciliationRequest) -> ReconciliationResult {
        let permit = self.locks.acquire(request.target_id()).await;
        let mut builder = ResultBuilder::new(&request, self.ctx.clock.now());
        info!(
            dry_run = request.dry_run(),
            mode = %request.load_mode(),
            commit = request.commit(),
            "reconciliation started"
        );

        let session = match self.prepare(&request, &mut builder).await {
            Ok(session) => session,
            Err(Halt::Skip(reason)) => {
                info!(reason = reason.code(), "target skipped: {reason}");
                let result = builder.skipped(reason.to_string(), self.ctx.clock.now());
                return finalize(self.ctx.results.as_ref(), result);
            }
            Err(Halt::Fail(failure)) => {
                let result = builder.failed(failure, self.ctx.clock.now());
                return finalize(self.ctx.results.as_ref(), result);
            }
        };

        if request.dry_run() || !request.commit() {
            let result = self.discard(session, builder).await;
            return finalize(self.ctx.results.as_ref(), result);
        }

        let tail = CommitTail {
            session,
            builder: builder.clone(),
            results: Arc::clone(&self.ctx.results),
            clock: Arc::clone(&self.ctx.clock),
            limit: self.timeouts.commit,
        };
        match tokio::spawn(tail.detach(permit).in_current_span()).await {
            Ok(result) => result,
            // Only reached when publishing itself panicked; not retried.
            Err(join_error) => {
                let failure = StageFailure::new(
                    ErrorKind::Commit,
                    Stage::Commit,
                    format!("result could not be published: {join_error}"),
                );
                error!("{failure}");
                builder.failed(failure, self.ctx.clock.now())
            }
        }
    }

    /// INIT through DIFF. On success the candidate is loaded and the diff is
    /// recorded in `builder`.
    async fn prepare(
        &self,
        request: &ReconciliationRequest,
        builder: &mut ResultBuilder,
    ) -> Result<SessionGuard, Halt> {
        let target = self.snapshot(request.target_id()).map_err(Halt::Skip)?;
        builder.complete(Stage::Init);

        let readiness = self.validator.validate(&target).map_err(Halt::Skip)?;
        builder.complete(Stage::Validate);
        debug!(driver = %readiness.driver_kind, address = %readiness.address, "target ready");

        let intended = self.render_fresh(&target, request)?;
        builder.complete(Stage::Render);
        debug!(source_hash = %intended.source_hash, "intended configuration rendered");

        let connect = readiness.factory.connect(
            &readiness.address,
            &readiness.credentials,
            self.timeouts.connect,
        );
        let mut session = bounded(self.timeouts.connect, connect)
            .await
            .map(SessionGuard::new)
            .map_err(|e| {
                let what =
                    format!("connecting to {} via {}", readiness.address, readiness.driver_kind);
                StageFailure::new(ErrorKind::Connection, Stage::Connect, e.describe(&what))
            })?;
        builder.complete(Stage::Connect);

        let mode = request.load_mode();
        bounded(self.timeouts.load, session.load(&intended.rendered_text, mode)).await.map_err(
            |e| {
                let kind = match e {
                    StepError::Driver(_) => ErrorKind::ConfigRejected,
                    StepError::TimedOut(_) => ErrorKind::Connection,
                };
                StageFailure::new(kind, Stage::Load, e.describe(&format!("{mode} load")))
            },
        )?;
        builder.complete(Stage::Load);

        let diff = bounded(self.timeouts.load, session.diff()).await.map_err(|e| {
            StageFailure::new(ErrorKind::ConfigRejected, Stage::Diff, e.describe("computing diff"))
        })?;
        builder.set_diff(diff);
        builder.complete(Stage::Diff);
        info!(empty = builder.diff_is_empty(), "diff computed");

        Ok(session)
    }

    async fn discard(
        &self,
        mut session: SessionGuard,
        mut builder: ResultBuilder,
    ) -> ReconciliationResult {
        if let Err(e) = bounded(self.timeouts.load, session.discard()).await {
            drop(session);
            let failure =
                StageFailure::new(ErrorKind::Connection, Stage::Discard, e.describe("discard"));
            return builder.failed(failure, self.ctx.clock.now());
        }
        builder.complete(Stage::Discard);
        drop(session);

        let status =
            if builder.diff_is_empty() { ResultStatus::Noop } else { ResultStatus::DryRunPreview };
        builder.finish(status, self.ctx.clock.now())
    }

    fn snapshot(&self, target_id: &str) -> Result<ManagedTarget, NotReady> {
        match self.ctx.inventory.snapshot(target_id) {
            Ok(Some(target)) => Ok(target),
            Ok(None) => Err(NotReady::TargetNotFound(target_id.to_string())),
            Err(e) => Err(NotReady::InventoryUnavailable(e.to_string())),
        }
    }

    fn render_fresh(
        &self,
        target: &ManagedTarget,
        request: &ReconciliationRequest,
    ) -> Result<IntendedConfiguration, StageFailure> {
        let intended = self.render_intended(target)?;
        if !intended.is_fresh_for(request) {
            return Err(StageFailure::new(
                ErrorKind::Render,
                Stage::Render,
                format!(
                    "rendered configuration from {} predates the request at {}",
                    intended.generated_at,
                    request.requested_at()
                ),
            ));
        }
        Ok(intended)
    }
}

/// COMMIT, VERIFY and finalization, run detached from the caller.
struct CommitTail {
    session: SessionGuard,
    builder: ResultBuilder,
    results: Arc<dyn ResultSink>,
    clock: Arc<dyn Clock>,
    limit: Duration,
}

impl CommitTail {
    /// Runs the tail on its own task while holding `permit`. A panicking
    /// driver still yields a published `Commit` failure, and the permit is
    /// released only after the result reached the sink.
    async fn detach(self, permit: TargetPermit) -> ReconciliationResult {
        let fallback = self.builder.clone();
        let results = Arc::clone(&self.results);
        let clock = Arc::clone(&self.clock);

        let result = match tokio::spawn(self.run().in_current_span()).await {
            Ok(result) => result,
            Err(join_error) => {
                let failure = StageFailure::new(
                    ErrorKind::Commit,
                    Stage::Commit,
                    format!("commit task did not finish: {join_error}"),
                );
                finalize(results.as_ref(), fallback.failed(failure, clock.now()))
            }
        };
        drop(permit);
        result
    }

    async fn run(self) -> ReconciliationResult {
        let Self { mut session, mut builder, results, clock, limit } = self;

        if let Err(e) = bounded(limit, session.commit()).await {
            drop(session);
            let failure = StageFailure::new(ErrorKind::Commit, Stage::Commit, e.describe("commit"));
            return finalize(results.as_ref(), builder.failed(failure, clock.now()));
        }
        builder.complete(Stage::Commit);
        info!("candidate committed");

        match bounded(limit, session.confirm()).await {
            Ok(marker) => {
                debug!(marker = %marker, "commit verified");
                builder.set_verified(marker);
                builder.complete(Stage::Verify);
            }
            Err(e) => {
                let warning = e.describe("post-commit verification");
                warn!("{warning}");
                builder.set_verify_warning(warning);
            }
        }
        drop(session);

        let status =
            if builder.diff_is_empty() { ResultStatus::Noop } else { ResultStatus::Success };
        finalize(results.as_ref(), builder.finish(status, clock.now()))
    }
}

/// Logs the terminal outcome and hands the result to the sink.
fn finalize(results: &dyn ResultSink, result: ReconciliationResult) -> ReconciliationResult {
    match (result.status(), result.error()) {
        (ResultStatus::Failed, Some(failure)) => error!(
            stage = %failure.stage,
            kind = %failure.kind,
            partial_state = result.partial_state(),
            "reconciliation failed: {}",
            failure.message
        ),
        (status, _) => info!(%status, "reconciliation finished"),
    }
    if result.partial_state() {
        error!("commit did not complete; the device may hold a partially applied configuration");
    }
    if let Err(e) = results.publish(&result) {
        warn!("failed to publish result: {e}");
    }
    result
}
