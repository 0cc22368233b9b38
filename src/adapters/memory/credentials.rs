//! Fixed credential table.

use std::collections::HashMap;

use crate::ports::{CredentialProvider, Credentials, PortError};

/// Resolves credentials references from a table populated up front.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    entries: HashMap<String, Credentials>,
}

impl StaticCredentials {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry for `credentials_ref`.
    #[must_use]
    pub fn with(mut self, credentials_ref: impl Into<String>, credentials: Credentials) -> Self {
        self.entries.insert(credentials_ref.into(), credentials);
        self
    }
}

impl CredentialProvider for StaticCredentials {
    fn resolve(&self, target_id: &str, credentials_ref: &str) -> Result<Credentials, PortError> {
        self.entries
            .get(credentials_ref)
            .cloned()
            .ok_or_else(|| format!("no credentials `{credentials_ref}` for {target_id}").into())
    }
}
