//! Freshly rendered intended configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::request::ReconciliationRequest;

/// The desired configuration of one target, rendered for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntendedConfiguration {
    /// Target the text was rendered for.
    pub target_id: String,
    /// Rendered configuration text.
    pub rendered_text: String,
    /// When rendering finished.
    pub generated_at: DateTime<Utc>,
    /// Hex SHA-256 over the template key and render context.
    pub source_hash: String,
}

impl IntendedConfiguration {
    /// Hashes the inputs a rendering was produced from.
    #[must_use]
    pub fn source_hash_for(template_key: &str, context: &Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(template_key.as_bytes());
        hasher.update(b"\n");
        hasher.update(context.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// True when the text contains nothing but whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.rendered_text.trim().is_empty()
    }

    /// True when this rendering belongs to the request's target and was
    /// produced no earlier than the request itself.
    #[must_use]
    pub fn is_fresh_for(&self, request: &ReconciliationRequest) -> bool {
        self.target_id == request.target_id() && self.generated_at >= request.requested_at()
    }
}
