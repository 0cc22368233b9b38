//! Template renderer port.

use serde_json::Value;

use super::PortError;

/// Renders the intended configuration text for a target.
///
/// The renderer is an external collaborator; the engine only requires that
/// it returns text or an error.
pub trait TemplateRenderer: Send + Sync {
    /// Renders `template_key` for `target_id` with `context`.
    ///
    /// # Errors
    ///
    /// Returns an error when the template is missing or cannot be rendered
    /// with the given context.
    fn render(&self, target_id: &str, template_key: &str, context: &Value)
        -> Result<String, PortError>;
}
