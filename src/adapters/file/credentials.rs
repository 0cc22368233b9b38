//! Credentials resolved from environment variables.
//!
//! A reference `lab-admin` resolves to `CONVERGE_CRED_LAB_ADMIN_USERNAME` and
//! `CONVERGE_CRED_LAB_ADMIN_PASSWORD`.

use crate::ports::{CredentialProvider, Credentials, PortError};

/// Reads credentials from the process environment at resolve time.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    /// Name of the environment variable holding `field` for `credentials_ref`.
    #[must_use]
    pub fn variable(credentials_ref: &str, field: &str) -> String {
        let key: String = credentials_ref
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("CONVERGE_CRED_{key}_{field}")
    }
}

impl CredentialProvider for EnvCredentialProvider {
    fn resolve(&self, target_id: &str, credentials_ref: &str) -> Result<Credentials, PortError> {
        let read = |field: &str| {
            let name = Self::variable(credentials_ref, field);
            std::env::var(&name)
                .map_err(|_| format!("{name} is not set (credentials for {target_id})"))
        };
        Ok(Credentials::new(read("USERNAME")?, read("PASSWORD")?))
    }
}
