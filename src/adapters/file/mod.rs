//! File-backed adapters used by the `converge` binary.

pub mod credentials;
pub mod events;
pub mod inventory;
pub mod renderer;
pub mod results;

pub use credentials::EnvCredentialProvider;
pub use events::publish_from_file;
pub use inventory::YamlInventory;
pub use renderer::FileTemplateRenderer;
pub use results::JsonLinesResultSink;
