//! Managed target snapshots and their driver kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Lifecycle status of a target as recorded by the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    /// In service.
    Active,
    /// Planned but not yet in service.
    Planned,
    /// Racked and being brought up.
    Staged,
    /// Known to be unreachable.
    Offline,
    /// Hardware or software failure.
    Failed,
    /// Sitting in inventory, not deployed.
    Inventory,
    /// Being removed from service.
    Decommissioning,
}

impl TargetStatus {
    /// Returns the lowercase wire name of this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Planned => "planned",
            Self::Staged => "staged",
            Self::Offline => "offline",
            Self::Failed => "failed",
            Self::Inventory => "inventory",
            Self::Decommissioning => "decommissioning",
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of driver kinds a registry can be populated with.
///
/// Inventory records carry the driver kind as free text; it is parsed into
/// this enum during readiness validation so that lookups never go through
/// runtime string dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    /// Arista EOS.
    Eos,
    /// Nokia SR Linux.
    Srl,
    /// Juniper Junos.
    Junos,
    /// Cisco IOS / IOS-XE.
    Ios,
    /// Cisco NX-OS.
    Nxos,
    /// In-process simulated device.
    Memory,
    /// File-backed simulated device.
    File,
}

impl DriverKind {
    /// Returns the canonical name of this driver kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eos => "eos",
            Self::Srl => "srl",
            Self::Junos => "junos",
            Self::Ios => "ios",
            Self::Nxos => "nxos",
            Self::Memory => "memory",
            Self::File => "file",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an inventory driver string names no known driver kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown driver kind `{0}`")]
pub struct UnknownDriverKind(pub String);

impl FromStr for DriverKind {
    type Err = UnknownDriverKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eos" | "arista_eos" => Ok(Self::Eos),
            "srl" | "nokia_srl" => Ok(Self::Srl),
            "junos" | "juniper_junos" => Ok(Self::Junos),
            "ios" | "cisco_ios" => Ok(Self::Ios),
            "nxos" | "cisco_nxos" => Ok(Self::Nxos),
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            other => Err(UnknownDriverKind(other.to_string())),
        }
    }
}

/// A read-only snapshot of one managed network endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedTarget {
    /// Inventory primary key.
    pub id: String,
    /// Human-readable name, usually the hostname.
    pub display_name: String,
    /// Management address; may carry a prefix length (`10.0.0.1/24`).
    #[serde(default)]
    pub address: Option<String>,
    /// Driver kind as recorded by the inventory (e.g. `eos`).
    #[serde(default)]
    pub driver_kind: Option<String>,
    /// Reference handed to the credential provider.
    #[serde(default)]
    pub credentials_ref: Option<String>,
    /// Lifecycle status.
    pub status: TargetStatus,
    /// Template used to render the intended configuration.
    pub template_key: String,
    /// Device role (e.g. `leaf`).
    #[serde(default)]
    pub role: Option<String>,
    /// Parent location name.
    #[serde(default)]
    pub location: Option<String>,
    /// Extra per-target context data merged into the render context.
    #[serde(default)]
    pub config_context: Map<String, Value>,
}

impl ManagedTarget {
    /// Creates an active target with no address, driver, or credentials.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        template_key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            address: None,
            driver_kind: None,
            credentials_ref: None,
            status: TargetStatus::Active,
            template_key: template_key.into(),
            role: None,
            location: None,
            config_context: Map::new(),
        }
    }

    /// Sets the management address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Sets the driver kind string.
    #[must_use]
    pub fn with_driver(mut self, driver_kind: impl Into<String>) -> Self {
        self.driver_kind = Some(driver_kind.into());
        self
    }

    /// Sets the credentials reference.
    #[must_use]
    pub fn with_credentials(mut self, credentials_ref: impl Into<String>) -> Self {
        self.credentials_ref = Some(credentials_ref.into());
        self
    }

    /// Sets the lifecycle status.
    #[must_use]
    pub fn with_status(mut self, status: TargetStatus) -> Self {
        self.status = status;
        self
    }

    /// Adds one key to the per-target context data.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config_context.insert(key.into(), value);
        self
    }

    /// Returns the host part of the management address, if one is set.
    ///
    /// Blank addresses count as absent and any prefix length is stripped.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        let address = self.address.as_deref()?.trim();
        let host = address.split('/').next().unwrap_or(address);
        (!host.is_empty()).then_some(host)
    }

    /// Builds the data handed to the template renderer.
    ///
    /// The target's own fields live under `device`; `config_context` keys are
    /// merged at the top level and may not shadow `device`.
    #[must_use]
    pub fn render_context(&self) -> Value {
        let mut context = self.config_context.clone();
        context.insert(
            "device".to_string(),
            json!({
                "id": self.id,
                "name": self.display_name,
                "address": self.address,
                "host": self.host(),
                "driver_kind": self.driver_kind,
                "status": self.status.as_str(),
                "role": self.role,
                "location": self.location,
            }),
        );
        Value::Object(context)
    }
}
