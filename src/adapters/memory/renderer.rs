//! In-memory template renderer.

use std::collections::HashMap;

use serde_json::Value;

use crate::adapters::template::substitute;
use crate::ports::{PortError, TemplateRenderer};

/// Renders templates registered by key.
#[derive(Debug, Clone, Default)]
pub struct MemoryRenderer {
    templates: HashMap<String, String>,
}

impl MemoryRenderer {
    /// Creates a renderer with no templates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `template` under `key`.
    #[must_use]
    pub fn with_template(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(key.into(), template.into());
        self
    }
}

impl TemplateRenderer for MemoryRenderer {
    fn render(
        &self,
        target_id: &str,
        template_key: &str,
        context: &Value,
    ) -> Result<String, PortError> {
        let template = self
            .templates
            .get(template_key)
            .ok_or_else(|| format!("no template `{template_key}` for {target_id}"))?;
        Ok(substitute(template, context)?)
    }
}
