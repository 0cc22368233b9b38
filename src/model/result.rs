//! Reconciliation results, stages, and the failure taxonomy.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::request::{Initiator, ReconciliationRequest};

/// Engine stages in their fixed execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Target snapshot taken.
    Init,
    /// Readiness checked.
    Validate,
    /// Intended configuration rendered.
    Render,
    /// Driver session opened.
    Connect,
    /// Candidate loaded.
    Load,
    /// Pending changes computed.
    Diff,
    /// Candidate dropped without persisting.
    Discard,
    /// Candidate persisted.
    Commit,
    /// Post-commit health confirmed.
    Verify,
    /// Session closed, result final.
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::Validate => "validate",
            Self::Render => "render",
            Self::Connect => "connect",
            Self::Load => "load",
            Self::Diff => "diff",
            Self::Discard => "discard",
            Self::Commit => "commit",
            Self::Verify => "verify",
            Self::Done => "done",
        })
    }
}

/// Terminal status of a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    /// Changes were committed.
    Success,
    /// Changes were computed and discarded.
    DryRunPreview,
    /// A stage failed; see the attached error.
    Failed,
    /// The target was not ready; nothing was attempted.
    Skipped,
    /// The target already matched its intended configuration.
    Noop,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "success",
            Self::DryRunPreview => "dry_run_preview",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Noop => "noop",
        })
    }
}

/// Failure classes surfaced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Target not ready. Never escalated; reported as `Skipped`.
    #[serde(rename = "validation_error")]
    Validation,
    /// Intended configuration could not be produced.
    #[serde(rename = "render_error")]
    Render,
    /// Transport or authentication failure.
    #[serde(rename = "connection_error")]
    Connection,
    /// The driver refused the candidate.
    #[serde(rename = "config_rejected_error")]
    ConfigRejected,
    /// Persisting a loaded candidate failed; the device may be half-applied.
    #[serde(rename = "commit_error")]
    Commit,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validation => "validation_error",
            Self::Render => "render_error",
            Self::Connection => "connection_error",
            Self::ConfigRejected => "config_rejected_error",
            Self::Commit => "commit_error",
        })
    }
}

/// An escalated stage failure with enough context to act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{stage} failed ({kind}): {message}")]
pub struct StageFailure {
    /// Failure class.
    pub kind: ErrorKind,
    /// Stage that was running.
    pub stage: Stage,
    /// What was attempted and what went wrong.
    pub message: String,
}

impl StageFailure {
    /// Creates a failure for the given stage.
    pub fn new(kind: ErrorKind, stage: Stage, message: impl Into<String>) -> Self {
        Self { kind, stage, message: message.into() }
    }
}

/// The finalized outcome of one request.
///
/// Built by the engine and never modified afterwards: all fields are private
/// and exposed through accessors only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    request_id: String,
    target_id: String,
    initiator: Initiator,
    status: ResultStatus,
    diff: Option<String>,
    error: Option<StageFailure>,
    reason: Option<String>,
    verify_warning: Option<String>,
    verified_marker: Option<String>,
    partial_state: bool,
    stages_completed: Vec<Stage>,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl ReconciliationResult {
    /// Id of the request this result answers.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Target that was reconciled.
    #[must_use]
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Trigger that built the request.
    #[must_use]
    pub fn initiator(&self) -> Initiator {
        self.initiator
    }

    /// Terminal status.
    #[must_use]
    pub fn status(&self) -> ResultStatus {
        self.status
    }

    /// Pending change set, when the diff stage was reached.
    #[must_use]
    pub fn diff(&self) -> Option<&str> {
        self.diff.as_deref()
    }

    /// Escalated failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&StageFailure> {
        self.error.as_ref()
    }

    /// Failure class, `Validation` for skips.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.status {
            ResultStatus::Skipped => Some(ErrorKind::Validation),
            _ => self.error.as_ref().map(|e| e.kind),
        }
    }

    /// Why the request was skipped.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Set when the commit landed but verification failed.
    #[must_use]
    pub fn verify_warning(&self) -> Option<&str> {
        self.verify_warning.as_deref()
    }

    /// Marker re-read from the device after a commit.
    #[must_use]
    pub fn verified_marker(&self) -> Option<&str> {
        self.verified_marker.as_deref()
    }

    /// True when a commit failed after the candidate was loaded. No rollback
    /// is attempted; the device needs manual review.
    #[must_use]
    pub fn partial_state(&self) -> bool {
        self.partial_state
    }

    /// Stages that completed, in order.
    #[must_use]
    pub fn stages_completed(&self) -> &[Stage] {
        &self.stages_completed
    }

    /// When the engine picked the request up.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the result was finalized.
    #[must_use]
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// True for failures that must be surfaced to the caller.
    #[must_use]
    pub fn is_escalated(&self) -> bool {
        self.status == ResultStatus::Failed
    }

    /// Converts an escalated failure into an `Err`.
    ///
    /// # Errors
    ///
    /// Returns the stage failure when the status is [`ResultStatus::Failed`].
    pub fn into_outcome(self) -> Result<Self, StageFailure> {
        match self.error {
            Some(failure) if self.status == ResultStatus::Failed => Err(failure),
            _ => Ok(self),
        }
    }
}

/// Accumulates stage progress until the engine finalizes a result.
#[derive(Debug, Clone)]
pub(crate) struct ResultBuilder {
    request_id: String,
    target_id: String,
    initiator: Initiator,
    started_at: DateTime<Utc>,
    stages: Vec<Stage>,
    diff: Option<String>,
    verify_warning: Option<String>,
    verified_marker: Option<String>,
}

impl ResultBuilder {
    pub(crate) fn new(request: &ReconciliationRequest, started_at: DateTime<Utc>) -> Self {
        Self {
            request_id: request.id().to_string(),
            target_id: request.target_id().to_string(),
            initiator: request.initiator(),
            started_at,
            stages: Vec::new(),
            diff: None,
            verify_warning: None,
            verified_marker: None,
        }
    }

    pub(crate) fn complete(&mut self, stage: Stage) {
        debug_assert!(
            self.stages.last().map_or(true, |last| *last < stage),
            "stage order violated"
        );
        self.stages.push(stage);
    }

    pub(crate) fn set_diff(&mut self, diff: String) {
        self.diff = Some(diff);
    }

    pub(crate) fn diff_is_empty(&self) -> bool {
        self.diff.as_deref().map_or(true, |d| d.trim().is_empty())
    }

    pub(crate) fn set_verified(&mut self, marker: String) {
        self.verified_marker = Some(marker);
    }

    pub(crate) fn set_verify_warning(&mut self, warning: String) {
        self.verify_warning = Some(warning);
    }

    /// Finalizes a non-failing run. `Done` is appended.
    pub(crate) fn finish(
        mut self,
        status: ResultStatus,
        at: DateTime<Utc>,
    ) -> ReconciliationResult {
        self.stages.push(Stage::Done);
        self.build(status, None, None, at)
    }

    pub(crate) fn skipped(self, reason: String, at: DateTime<Utc>) -> ReconciliationResult {
        self.build(ResultStatus::Skipped, None, Some(reason), at)
    }

    pub(crate) fn failed(self, failure: StageFailure, at: DateTime<Utc>) -> ReconciliationResult {
        self.build(ResultStatus::Failed, Some(failure), None, at)
    }

    fn build(
        self,
        status: ResultStatus,
        error: Option<StageFailure>,
        reason: Option<String>,
        finished_at: DateTime<Utc>,
    ) -> ReconciliationResult {
        let partial_state = error.as_ref().is_some_and(|e| e.kind == ErrorKind::Commit);
        ReconciliationResult {
            request_id: self.request_id,
            target_id: self.target_id,
            initiator: self.initiator,
            status,
            diff: self.diff,
            error,
            reason,
            verify_warning: self.verify_warning,
            verified_marker: self.verified_marker,
            partial_state,
            stages_completed: self.stages,
            started_at: self.started_at,
            finished_at,
        }
    }
}
