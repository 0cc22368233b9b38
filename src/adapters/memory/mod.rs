//! In-memory adapters for every port.
//!
//! These back the test suite and suit embedding the engine in a host that
//! already holds its inventory in memory.

pub mod clock;
pub mod credentials;
pub mod events;
pub mod inventory;
pub mod renderer;
pub mod results;

pub use clock::{ManualClock, SequentialIdGenerator};
pub use credentials::StaticCredentials;
pub use events::EventBus;
pub use inventory::MemoryInventory;
pub use renderer::MemoryRenderer;
pub use results::MemoryResultSink;
