//! Id generator port for request identifiers.

/// Generates unique request identifiers.
///
/// Tests substitute a predictable sequence so result ids can be asserted.
pub trait IdGenerator: Send + Sync {
    /// Generates a new unique identifier string.
    fn generate_id(&self) -> String;
}
