//! Service context bundling all port trait objects.

use std::sync::Arc;

use crate::adapters::file::{
    EnvCredentialProvider, FileTemplateRenderer, JsonLinesResultSink, YamlInventory,
};
use crate::adapters::live::{SystemClock, UuidIdGenerator};
use crate::adapters::simulated::FileDriver;
use crate::ports::{
    Clock, CredentialProvider, DriverFactory, DriverRegistry, IdGenerator, ResultSink,
    TargetInventory, TemplateRenderer,
};
use crate::settings::Settings;

/// Bundles every collaborator the engine and triggers talk to.
///
/// Passed explicitly into the engine; nothing in the core looks anything up
/// ambiently. Cloning is cheap and shares the collaborators.
#[derive(Clone)]
pub struct ServiceContext {
    /// Source of target snapshots.
    pub inventory: Arc<dyn TargetInventory>,
    /// Produces intended configuration text.
    pub renderer: Arc<dyn TemplateRenderer>,
    /// Resolves credentials references.
    pub credentials: Arc<dyn CredentialProvider>,
    /// Driver factories by kind.
    pub drivers: DriverRegistry,
    /// Receives every finalized result.
    pub results: Arc<dyn ResultSink>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Request id source.
    pub id_gen: Arc<dyn IdGenerator>,
}

impl ServiceContext {
    /// Creates a context from explicit collaborators, using the system clock
    /// and UUID request ids.
    pub fn new(
        inventory: Arc<dyn TargetInventory>,
        renderer: Arc<dyn TemplateRenderer>,
        credentials: Arc<dyn CredentialProvider>,
        drivers: DriverRegistry,
        results: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            inventory,
            renderer,
            credentials,
            drivers,
            results,
            clock: Arc::new(SystemClock),
            id_gen: Arc::new(UuidIdGenerator),
        }
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the request id generator.
    #[must_use]
    pub fn with_id_gen(mut self, id_gen: Arc<dyn IdGenerator>) -> Self {
        self.id_gen = id_gen;
        self
    }

    /// Wires the file-backed adapters described by `settings`: YAML
    /// inventory, template directory, environment credentials, JSON-lines
    /// results, and the file-backed simulated driver for every kind listed
    /// under `drivers.simulate`.
    #[must_use]
    pub fn live(settings: &Settings) -> Self {
        let simulator: Arc<dyn DriverFactory> =
            Arc::new(FileDriver::new(settings.paths.devices.clone()));
        let drivers = settings
            .drivers
            .simulate
            .iter()
            .fold(DriverRegistry::new(), |registry, kind| {
                registry.with(*kind, Arc::clone(&simulator))
            });

        Self::new(
            Arc::new(YamlInventory::new(settings.paths.inventory.clone())),
            Arc::new(FileTemplateRenderer::new(settings.paths.templates.clone())),
            Arc::new(EnvCredentialProvider),
            drivers,
            Arc::new(JsonLinesResultSink::new(settings.paths.results.clone())),
        )
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext").field("drivers", &self.drivers).finish_non_exhaustive()
    }
}
