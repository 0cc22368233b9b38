//! Port traits defining external boundaries.
//!
//! Each trait is a boundary between the reconciliation core and a system it
//! does not own: the inventory, the template renderer, the secret store, the
//! device transports, the event feed, and the result store. Implementations
//! live in `src/adapters/`.

pub mod clock;
pub mod credentials;
pub mod driver;
pub mod events;
pub mod id_gen;
pub mod inventory;
pub mod renderer;
pub mod results;

/// Error type returned across port boundaries.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

pub use clock::Clock;
pub use credentials::{CredentialProvider, Credentials};
pub use driver::{DriverFactory, DriverFuture, DriverRegistry, DriverSession};
pub use events::EventSource;
pub use id_gen::IdGenerator;
pub use inventory::TargetInventory;
pub use renderer::TemplateRenderer;
pub use results::ResultSink;
