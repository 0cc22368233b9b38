//! Driver port: the capability-based transport to a managed device.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use super::credentials::Credentials;
use super::PortError;
use crate::model::{DriverKind, LoadMode};

/// Boxed future returned by driver operations, keeping the traits
/// dyn-compatible.
pub type DriverFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, PortError>> + Send + 'a>>;

/// Opens sessions to devices of one driver kind.
pub trait DriverFactory: Send + Sync {
    /// Opens a session to `address`.
    ///
    /// Implementations should give up after `timeout`; the engine enforces
    /// the same bound independently.
    fn connect<'a>(
        &'a self,
        address: &'a str,
        credentials: &'a Credentials,
        timeout: Duration,
    ) -> DriverFuture<'a, Box<dyn DriverSession>>;
}

/// One open connection to a device.
///
/// A session holds at most one candidate configuration at a time.
pub trait DriverSession: Send {
    /// Loads `text` into the candidate using `mode`.
    ///
    /// Errors mean the device rejected the candidate.
    fn load<'a>(&'a mut self, text: &'a str, mode: LoadMode) -> DriverFuture<'a, ()>;

    /// Returns the pending change set between candidate and running state.
    /// An empty string means nothing would change.
    fn diff(&mut self) -> DriverFuture<'_, String>;

    /// Persists the candidate to running and startup storage.
    fn commit(&mut self) -> DriverFuture<'_, ()>;

    /// Drops the candidate without any persistent effect.
    fn discard(&mut self) -> DriverFuture<'_, ()>;

    /// Re-reads a small marker (hostname, revision) proving the device is
    /// healthy and serving the session.
    fn confirm(&mut self) -> DriverFuture<'_, String>;

    /// Releases the transport. Must be idempotent and must not fail.
    fn close(&mut self);
}

/// Driver factories keyed by kind, populated once at startup.
#[derive(Clone, Default)]
pub struct DriverRegistry {
    factories: BTreeMap<DriverKind, Arc<dyn DriverFactory>>,
}

impl DriverRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` for `kind`, replacing any earlier entry.
    #[must_use]
    pub fn with(mut self, kind: DriverKind, factory: Arc<dyn DriverFactory>) -> Self {
        self.factories.insert(kind, factory);
        self
    }

    /// Returns the factory registered for `kind`.
    #[must_use]
    pub fn get(&self, kind: DriverKind) -> Option<Arc<dyn DriverFactory>> {
        self.factories.get(&kind).map(Arc::clone)
    }

    /// Registered kinds in sorted order.
    pub fn kinds(&self) -> impl Iterator<Item = DriverKind> + '_ {
        self.factories.keys().copied()
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.kinds()).finish()
    }
}
