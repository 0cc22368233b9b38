//! Shared fixture for the engine and trigger integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;

use converge::adapters::memory::{
    ManualClock, MemoryInventory, MemoryRenderer, MemoryResultSink, SequentialIdGenerator,
    StaticCredentials,
};
use converge::adapters::simulated::MemoryDriver;
use converge::model::{
    DriverKind, Initiator, ManagedTarget, ReconciliationRequest, RequestOptions,
};
use converge::ports::{Clock, Credentials, DriverRegistry, IdGenerator};
use converge::reconcile::StageTimeouts;
use converge::{Engine, ServiceContext, Settings, Triggers};

pub const LEAF_TEMPLATE: &str = "\
hostname {{ device.name }}
interface Ethernet1
   description {{ uplink }}
";

pub const LEAF_RUNNING: &str = "\
hostname leaf-old
interface Ethernet1
   description to-spine1
";

/// A small lab: in-memory inventory, renderer, credentials, result sink, and
/// a simulated driver registered as the `memory` kind.
pub struct Lab {
    pub driver: MemoryDriver,
    pub inventory: Arc<MemoryInventory>,
    pub results: Arc<MemoryResultSink>,
    pub clock: Arc<ManualClock>,
    pub ids: Arc<SequentialIdGenerator>,
    pub engine: Arc<Engine>,
}

impl Lab {
    pub fn new() -> Self {
        Self::build(MemoryDriver::new(), StageTimeouts::default(), MemoryResultSink::new())
    }

    pub fn with_driver(driver: MemoryDriver) -> Self {
        Self::build(driver, StageTimeouts::default(), MemoryResultSink::new())
    }

    pub fn with_timeouts(driver: MemoryDriver, timeouts: StageTimeouts) -> Self {
        Self::build(driver, timeouts, MemoryResultSink::new())
    }

    pub fn with_results(results: MemoryResultSink) -> Self {
        Self::build(MemoryDriver::new(), StageTimeouts::default(), results)
    }

    fn build(driver: MemoryDriver, timeouts: StageTimeouts, results: MemoryResultSink) -> Self {
        let inventory = Arc::new(MemoryInventory::new());
        let results = Arc::new(results);
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()));
        let ids = Arc::new(SequentialIdGenerator::new("req"));

        let renderer = MemoryRenderer::new()
            .with_template("leaf", LEAF_TEMPLATE)
            .with_template("blank", "  \n");
        let credentials = StaticCredentials::new().with("lab", Credentials::new("admin", "admin"));
        let drivers = DriverRegistry::new().with(DriverKind::Memory, Arc::new(driver.clone()));

        let ctx = ServiceContext::new(
            inventory.clone(),
            Arc::new(renderer),
            Arc::new(credentials),
            drivers,
            results.clone(),
        )
        .with_clock(clock.clone())
        .with_id_gen(ids.clone());
        let engine = Arc::new(Engine::new(ctx).with_timeouts(timeouts));

        Self { driver, inventory, results, clock, ids, engine }
    }

    /// Adds a ready target named `name` whose device currently runs
    /// [`LEAF_RUNNING`].
    pub fn add_leaf(&self, id: &str, name: &str, address: &str) -> ManagedTarget {
        let target = ManagedTarget::new(id, name, "leaf")
            .with_address(format!("{address}/24"))
            .with_driver("memory")
            .with_credentials("lab")
            .with_context("uplink", json!("to-spine1"));
        self.inventory.upsert(target.clone());
        self.driver.add_device(address, LEAF_RUNNING);
        target
    }

    pub fn request(
        &self,
        target_id: &str,
        options: RequestOptions,
        initiator: Initiator,
    ) -> ReconciliationRequest {
        ReconciliationRequest::new(
            self.ids.generate_id(),
            target_id,
            options,
            initiator,
            self.clock.now(),
        )
        .unwrap()
    }

    pub fn triggers(&self, settings: &Settings) -> Arc<Triggers> {
        Arc::new(Triggers::new(Arc::clone(&self.engine), settings))
    }
}

pub fn dry_run() -> RequestOptions {
    RequestOptions { dry_run: true, replace: false, commit: true }
}

pub fn apply() -> RequestOptions {
    RequestOptions { dry_run: false, replace: false, commit: true }
}
