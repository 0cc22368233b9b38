//! Data model shared by the triggers, the engine, and the adapters.
//!
//! Everything here is a plain value: targets are read-only snapshots of the
//! external inventory, events are consumed once, and requests and results are
//! immutable after construction.

pub mod event;
pub mod intended;
pub mod request;
pub mod result;
pub mod target;

pub use event::{ChangeAction, ChangeEvent, FieldChange, ObjectKind};
pub use intended::IntendedConfiguration;
pub use request::{
    Initiator, LoadMode, ReconciliationRequest, RequestError, RequestOptions,
};
pub use result::{ErrorKind, ReconciliationResult, ResultStatus, Stage, StageFailure};
pub use target::{DriverKind, ManagedTarget, TargetStatus, UnknownDriverKind};
