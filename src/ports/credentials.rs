//! Credential provider port.

use std::fmt;

use super::PortError;

/// Login material for one driver session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    secret: String,
}

impl Credentials {
    /// Creates credentials from a username and secret.
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self { username: username.into(), secret: secret.into() }
    }

    /// Returns the secret. Callers must not log it.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Resolves a target's credentials reference into usable credentials.
///
/// Injected into the engine; nothing in the core reaches for a secret store
/// on its own.
pub trait CredentialProvider: Send + Sync {
    /// Resolves `credentials_ref` for `target_id`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reference is unknown or the secret store is
    /// unavailable.
    fn resolve(&self, target_id: &str, credentials_ref: &str) -> Result<Credentials, PortError>;
}
