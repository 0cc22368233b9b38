//! YAML file inventory.
//!
//! ```yaml
//! targets:
//!   - id: leaf1
//!     display_name: leaf1
//!     address: 172.20.20.11/24
//!     driver_kind: file
//!     credentials_ref: lab
//!     status: active
//!     template_key: leaf
//!     config_context:
//!       ntp_server: 10.0.0.1
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use crate::model::ManagedTarget;
use crate::ports::{PortError, TargetInventory};

#[derive(Debug, Deserialize)]
struct InventoryFile {
    #[serde(default)]
    targets: Vec<ManagedTarget>,
}

/// Inventory read from a YAML file.
///
/// The file is re-read on every snapshot, so edits are picked up without a
/// restart and every reconciliation sees the latest record.
#[derive(Debug, Clone)]
pub struct YamlInventory {
    path: PathBuf,
}

impl YamlInventory {
    /// Creates an inventory backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads every target in the file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn load_all(&self) -> Result<Vec<ManagedTarget>, PortError> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| format!("failed to read inventory {}: {e}", self.path.display()))?;
        let file: InventoryFile = serde_yaml::from_str(&content)
            .map_err(|e| format!("failed to parse inventory {}: {e}", self.path.display()))?;
        Ok(file.targets)
    }
}

impl TargetInventory for YamlInventory {
    fn snapshot(&self, target_id: &str) -> Result<Option<ManagedTarget>, PortError> {
        Ok(self.load_all()?.into_iter().find(|t| t.id == target_id))
    }
}
