//! Checks that a target carries enough identity to be reconciled.
//!
//! Validation is cheap and never touches the device: it parses the driver
//! kind, looks it up in the registry, resolves credentials, and checks the
//! lifecycle status. The first failing check wins.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::model::{DriverKind, ManagedTarget, TargetStatus};
use crate::ports::{CredentialProvider, Credentials, DriverFactory, DriverRegistry};

/// Why a target cannot be reconciled right now.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotReady {
    /// The inventory has no record for the target.
    #[error("target `{0}` not found")]
    TargetNotFound(String),
    /// The inventory could not be read.
    #[error("inventory unavailable: {0}")]
    InventoryUnavailable(String),
    /// No management address.
    #[error("missing address")]
    MissingAddress,
    /// No driver kind recorded.
    #[error("missing driver kind")]
    MissingDriverKind,
    /// The driver kind names no known driver.
    #[error("unknown driver kind `{0}`")]
    UnknownDriverKind(String),
    /// The driver kind is known but nothing is registered for it.
    #[error("no driver registered for `{0}`")]
    UnregisteredDriverKind(DriverKind),
    /// No credentials reference recorded.
    #[error("missing credentials reference")]
    MissingCredentialsRef,
    /// The credential provider could not resolve the reference.
    #[error("credentials `{reference}` could not be resolved: {message}")]
    UnresolvedCredentials {
        /// The reference that failed.
        reference: String,
        /// Provider error text.
        message: String,
    },
    /// The lifecycle status is outside the allowed set.
    #[error("status `{0}` not allowed")]
    StatusNotAllowed(TargetStatus),
}

impl NotReady {
    /// Machine-readable reason code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::TargetNotFound(_) => "target_not_found",
            Self::InventoryUnavailable(_) => "inventory_unavailable",
            Self::MissingAddress => "missing_address",
            Self::MissingDriverKind => "missing_driver_kind",
            Self::UnknownDriverKind(_) => "unknown_driver_kind",
            Self::UnregisteredDriverKind(_) => "unregistered_driver_kind",
            Self::MissingCredentialsRef => "missing_credentials_ref",
            Self::UnresolvedCredentials { .. } => "unresolved_credentials",
            Self::StatusNotAllowed(_) => "status_not_allowed",
        }
    }
}

/// Everything the engine needs to open a session, produced by a passing
/// validation.
pub struct Readiness {
    /// Host part of the management address.
    pub address: String,
    /// Parsed driver kind.
    pub driver_kind: DriverKind,
    /// Factory registered for the driver kind.
    pub factory: Arc<dyn DriverFactory>,
    /// Resolved login material.
    pub credentials: Credentials,
}

impl std::fmt::Debug for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Readiness")
            .field("address", &self.address)
            .field("driver_kind", &self.driver_kind)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

/// Statuses eligible for reconciliation when nothing else is configured.
#[must_use]
pub fn default_allowed_statuses() -> BTreeSet<TargetStatus> {
    [TargetStatus::Active, TargetStatus::Planned, TargetStatus::Staged].into_iter().collect()
}

/// Validates targets against the driver registry and credential provider.
#[derive(Clone)]
pub struct ReadinessValidator {
    registry: DriverRegistry,
    credentials: Arc<dyn CredentialProvider>,
    allowed_statuses: BTreeSet<TargetStatus>,
}

impl ReadinessValidator {
    /// Creates a validator allowing [`default_allowed_statuses`].
    pub fn new(registry: DriverRegistry, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { registry, credentials, allowed_statuses: default_allowed_statuses() }
    }

    /// Replaces the allowed status set.
    #[must_use]
    pub fn with_allowed_statuses(mut self, statuses: BTreeSet<TargetStatus>) -> Self {
        self.allowed_statuses = statuses;
        self
    }

    /// Checks `target`.
    ///
    /// # Errors
    ///
    /// Returns the first [`NotReady`] reason found, checking address, driver
    /// kind, credentials, then status.
    pub fn validate(&self, target: &ManagedTarget) -> Result<Readiness, NotReady> {
        let address = target.host().ok_or(NotReady::MissingAddress)?.to_string();

        let raw_kind = target
            .driver_kind
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(NotReady::MissingDriverKind)?;
        let driver_kind: DriverKind =
            raw_kind.parse().map_err(|e: crate::model::UnknownDriverKind| {
                NotReady::UnknownDriverKind(e.0)
            })?;
        let factory = self
            .registry
            .get(driver_kind)
            .ok_or(NotReady::UnregisteredDriverKind(driver_kind))?;

        let reference = target
            .credentials_ref
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .ok_or(NotReady::MissingCredentialsRef)?;
        let credentials = self.credentials.resolve(&target.id, reference).map_err(|e| {
            NotReady::UnresolvedCredentials {
                reference: reference.to_string(),
                message: e.to_string(),
            }
        })?;

        if !self.allowed_statuses.contains(&target.status) {
            return Err(NotReady::StatusNotAllowed(target.status));
        }

        Ok(Readiness { address, driver_kind, factory, credentials })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::StaticCredentials;
    use crate::adapters::simulated::MemoryDriver;

    fn validator() -> ReadinessValidator {
        let registry = DriverRegistry::new().with(DriverKind::Memory, Arc::new(MemoryDriver::new()));
        let credentials =
            StaticCredentials::new().with("lab", Credentials::new("admin", "admin"));
        ReadinessValidator::new(registry, Arc::new(credentials))
    }

    fn ready_target() -> ManagedTarget {
        ManagedTarget::new("leaf1", "leaf1", "leaf")
            .with_address("10.0.0.1/24")
            .with_driver("memory")
            .with_credentials("lab")
    }

    fn code_for(target: &ManagedTarget) -> &'static str {
        validator().validate(target).unwrap_err().code()
    }

    #[test]
    fn ready_target_passes() {
        let readiness = validator().validate(&ready_target()).unwrap();
        assert_eq!(readiness.address, "10.0.0.1");
        assert_eq!(readiness.driver_kind, DriverKind::Memory);
        assert_eq!(readiness.credentials.username, "admin");
    }

    #[test]
    fn missing_address_fails_first() {
        let mut target = ready_target();
        target.address = None;
        target.driver_kind = None;
        assert_eq!(code_for(&target), "missing_address");
    }

    #[test]
    fn driver_kind_must_parse_and_be_registered() {
        let mut target = ready_target();
        target.driver_kind = Some("  ".into());
        assert_eq!(code_for(&target), "missing_driver_kind");

        target.driver_kind = Some("netconf-magic".into());
        assert_eq!(code_for(&target), "unknown_driver_kind");

        target.driver_kind = Some("eos".into());
        assert_eq!(code_for(&target), "unregistered_driver_kind");
    }

    #[test]
    fn credentials_must_resolve() {
        let mut target = ready_target();
        target.credentials_ref = None;
        assert_eq!(code_for(&target), "missing_credentials_ref");

        target.credentials_ref = Some("prod".into());
        assert_eq!(code_for(&target), "unresolved_credentials");
    }

    #[test]
    fn status_outside_allowed_set_is_rejected() {
        let target = ready_target().with_status(TargetStatus::Decommissioning);
        let err = validator().validate(&target).unwrap_err();
        assert_eq!(err, NotReady::StatusNotAllowed(TargetStatus::Decommissioning));
        assert_eq!(err.to_string(), "status `decommissioning` not allowed");

        let relaxed = validator()
            .with_allowed_statuses([TargetStatus::Decommissioning].into_iter().collect());
        assert!(relaxed.validate(&target).is_ok());
    }
}
