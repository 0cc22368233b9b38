//! Crate-level error type for the binary and the settings loader.
//!
//! The engine itself never returns these: reconciliation outcomes, including
//! failures, are reported inside a `ReconciliationResult`.

use std::path::PathBuf;

use crate::model::{RequestError, StageFailure};
use crate::reconcile::NotReady;

/// Errors surfaced by the command layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The settings file could not be read.
    #[error("failed to read settings {}: {source}", path.display())]
    SettingsRead {
        /// File that was read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The settings file is not valid YAML for [`crate::Settings`].
    #[error("invalid settings {}: {source}", path.display())]
    SettingsParse {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_yaml::Error,
    },
    /// A request violated the trigger policy.
    #[error(transparent)]
    Request(#[from] RequestError),
    /// The target is not ready to be reconciled.
    #[error("target not ready ({code}): {0}", code = .0.code())]
    NotReady(#[from] NotReady),
    /// A reconciliation stage failed.
    #[error(transparent)]
    Stage(#[from] StageFailure),
    /// A collaborator behind a port failed.
    #[error("{context}: {message}")]
    Port {
        /// What was being attempted.
        context: String,
        /// Collaborator error text.
        message: String,
    },
    /// Result serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Runtime or filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps a port error with what was being attempted.
    pub fn port(context: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::Port { context: context.into(), message: source.to_string() }
    }
}

/// Result alias using the crate [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
