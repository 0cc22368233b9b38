//! Renderer reading `<dir>/<template_key>.tmpl` files.

use std::path::PathBuf;

use serde_json::Value;

use crate::adapters::template::substitute;
use crate::ports::{PortError, TemplateRenderer};

/// Renders templates stored as files in one directory.
#[derive(Debug, Clone)]
pub struct FileTemplateRenderer {
    dir: PathBuf,
}

impl FileTemplateRenderer {
    /// Creates a renderer over `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl TemplateRenderer for FileTemplateRenderer {
    fn render(
        &self,
        target_id: &str,
        template_key: &str,
        context: &Value,
    ) -> Result<String, PortError> {
        if template_key.is_empty() || template_key.contains(['/', '\\']) || template_key == ".." {
            return Err(format!("invalid template key `{template_key}` for {target_id}").into());
        }
        let path = self.dir.join(format!("{template_key}.tmpl"));
        let template = std::fs::read_to_string(&path)
            .map_err(|e| format!("failed to read template {}: {e}", path.display()))?;
        Ok(substitute(&template, context)?)
    }
}
