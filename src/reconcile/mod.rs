//! The reconciliation core: relevance filtering, readiness validation, and
//! the staged engine that converges one target at a time.

pub mod engine;
pub mod locks;
pub mod readiness;
pub mod relevance;
pub mod session;

pub use engine::{Engine, StageTimeouts};
pub use locks::{TargetLocks, TargetPermit};
pub use readiness::{default_allowed_statuses, NotReady, Readiness, ReadinessValidator};
pub use relevance::{is_relevant, relevant_fields};
pub use session::SessionGuard;
