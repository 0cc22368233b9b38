//! Reconciliation requests and the policy enforced when building them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which trigger produced a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initiator {
    /// An operator supplied every option.
    Manual,
    /// A pre-bound one-shot action keyed by target id only.
    Button,
    /// An automatic reaction to an inventory change.
    Hook,
}

impl fmt::Display for Initiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Manual => "manual",
            Self::Button => "button",
            Self::Hook => "hook",
        })
    }
}

/// How a driver applies the rendered text to its candidate configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Add or change only the statements present in the text.
    Merge,
    /// Overwrite the whole configuration with the text.
    Replace,
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Merge => "merge",
            Self::Replace => "replace",
        })
    }
}

/// Execution switches for one reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Compute and report the diff, then discard it.
    pub dry_run: bool,
    /// Load in replace mode instead of merge mode.
    pub replace: bool,
    /// Persist the candidate when not in dry-run mode.
    pub commit: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { dry_run: true, replace: false, commit: true }
    }
}

/// Rejections raised while constructing a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// Automatic triggers may never replace a whole configuration.
    #[error("replace mode cannot be requested by the hook initiator")]
    ReplaceFromHook,
    /// The request names no target.
    #[error("request has an empty target id")]
    EmptyTarget,
}

/// One invocation of the engine against one target.
///
/// Fields are private so a request cannot be altered once the trigger
/// surface has built it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationRequest {
    id: String,
    target_id: String,
    options: RequestOptions,
    initiator: Initiator,
    requested_at: DateTime<Utc>,
}

impl ReconciliationRequest {
    /// Builds a request, enforcing the initiator policy.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::ReplaceFromHook`] when a hook asks for replace
    /// mode and [`RequestError::EmptyTarget`] when the target id is blank.
    pub fn new(
        id: impl Into<String>,
        target_id: impl Into<String>,
        options: RequestOptions,
        initiator: Initiator,
        requested_at: DateTime<Utc>,
    ) -> Result<Self, RequestError> {
        let target_id = target_id.into();
        if target_id.trim().is_empty() {
            return Err(RequestError::EmptyTarget);
        }
        if initiator == Initiator::Hook && options.replace {
            return Err(RequestError::ReplaceFromHook);
        }
        Ok(Self { id: id.into(), target_id, options, initiator, requested_at })
    }

    /// Unique id of this request.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Target this request reconciles.
    #[must_use]
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// All execution switches.
    #[must_use]
    pub fn options(&self) -> RequestOptions {
        self.options
    }

    /// Whether this is a preview-only run.
    #[must_use]
    pub fn dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Whether the whole configuration is replaced.
    #[must_use]
    pub fn replace(&self) -> bool {
        self.options.replace
    }

    /// Whether the candidate is persisted outside dry-run mode.
    #[must_use]
    pub fn commit(&self) -> bool {
        self.options.commit
    }

    /// Trigger that built the request.
    #[must_use]
    pub fn initiator(&self) -> Initiator {
        self.initiator
    }

    /// When the request was built.
    #[must_use]
    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    /// Driver load mode derived from the `replace` switch.
    #[must_use]
    pub fn load_mode(&self) -> LoadMode {
        if self.options.replace {
            LoadMode::Replace
        } else {
            LoadMode::Merge
        }
    }
}
