//! Change events emitted by the inventory.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What happened to the inventory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    /// The record was created.
    Created,
    /// One or more fields changed.
    Updated,
    /// The record was deleted.
    Deleted,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        })
    }
}

/// Kind of inventory record an event describes.
///
/// Sub-resources such as interfaces report the id of their parent device as
/// the event's `target_id`, so every event reconciles a physical target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A device record.
    Device,
    /// An interface belonging to a device.
    Interface,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Device => "device",
            Self::Interface => "interface",
        })
    }
}

/// Before and after values of one changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Value before the change.
    pub old: Value,
    /// Value after the change.
    pub new: Value,
}

/// A single mutation of an inventory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Target the event reconciles.
    pub target_id: String,
    /// Record kind that changed.
    #[serde(default = "default_object_kind")]
    pub object_kind: ObjectKind,
    /// What happened.
    pub action: ChangeAction,
    /// Only the fields whose value actually changed.
    #[serde(default)]
    pub changed_fields: BTreeMap<String, FieldChange>,
    /// When the change was recorded.
    pub timestamp: DateTime<Utc>,
}

fn default_object_kind() -> ObjectKind {
    ObjectKind::Device
}

impl ChangeEvent {
    /// Creates an event with no changed fields.
    pub fn new(
        target_id: impl Into<String>,
        object_kind: ObjectKind,
        action: ChangeAction,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            object_kind,
            action,
            changed_fields: BTreeMap::new(),
            timestamp,
        }
    }

    /// Records a field change. Identical old and new values are dropped.
    #[must_use]
    pub fn with_change(mut self, field: impl Into<String>, old: Value, new: Value) -> Self {
        if old != new {
            self.changed_fields.insert(field.into(), FieldChange { old, new });
        }
        self
    }
}
