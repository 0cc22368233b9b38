//! Simulated device drivers.
//!
//! Both drivers speak the same block-structured configuration dialect (see
//! [`config_text`]) so that diffs look like what a real network OS prints.

pub mod config_text;
pub mod file;
pub mod memory;

pub use config_text::ConfigText;
pub use file::FileDriver;
pub use memory::{CallCounts, Fault, MemoryDriver};
