//! Adapter implementations of the port traits.
//!
//! - [`memory`]: in-process doubles for tests and embedding.
//! - [`file`]: YAML/JSON-lines/environment backed adapters for the binary.
//! - [`simulated`]: simulated device drivers.
//! - [`live`]: system clock and UUID ids.

pub mod file;
pub mod live;
pub mod memory;
pub mod simulated;
pub mod template;
