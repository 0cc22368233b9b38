//! Runtime settings loaded from YAML.
//!
//! Every key is optional. A minimal file:
//!
//! ```yaml
//! hook:
//!   auto_on_update: true
//!   dry_run: false
//! timeouts:
//!   connect_secs: 10
//! paths:
//!   inventory: lab/inventory.yaml
//! ```
//!
//! The file is taken from `--config`, then `CONVERGE_CONFIG`, then
//! `converge.yaml` in the working directory. Without any of them the
//! defaults apply.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{DriverKind, ObjectKind, RequestOptions, TargetStatus};
use crate::reconcile::{default_allowed_statuses, StageTimeouts};

/// Environment variable naming the settings file.
pub const CONFIG_ENV: &str = "CONVERGE_CONFIG";

/// Settings file used when neither `--config` nor [`CONFIG_ENV`] is given.
pub const DEFAULT_CONFIG_FILE: &str = "converge.yaml";

/// All runtime settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Field whitelists for the relevance filter.
    pub relevance: RelevanceSettings,
    /// Readiness validator settings.
    pub readiness: ReadinessSettings,
    /// Event-driven trigger switches.
    pub hook: HookSettings,
    /// Defaults for the pre-bound trigger.
    pub prebound: PreboundSettings,
    /// Stage timeouts.
    pub timeouts: TimeoutSettings,
    /// File locations used by the bundled adapters.
    pub paths: PathSettings,
    /// Driver registry population.
    pub drivers: DriverSettings,
}

/// Changed-field whitelists, one per object kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelevanceSettings {
    /// Device fields whose change triggers reconciliation.
    pub device: BTreeSet<String>,
    /// Interface fields whose change triggers reconciliation of the parent
    /// device.
    pub interface: BTreeSet<String>,
}

impl RelevanceSettings {
    /// Whitelist for events about `kind`.
    #[must_use]
    pub fn whitelist(&self, kind: ObjectKind) -> &BTreeSet<String> {
        match kind {
            ObjectKind::Device => &self.device,
            ObjectKind::Interface => &self.interface,
        }
    }
}

fn strings(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for RelevanceSettings {
    fn default() -> Self {
        Self {
            device: strings(&["name", "primary_ip4", "platform", "role", "location", "status"]),
            interface: strings(&["description", "enabled", "mode", "mtu", "type"]),
        }
    }
}

/// Readiness validator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadinessSettings {
    /// Statuses eligible for reconciliation.
    pub allowed_statuses: BTreeSet<TargetStatus>,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self { allowed_statuses: default_allowed_statuses() }
    }
}

/// Switches for the event-driven trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HookSettings {
    /// Reconcile when a record is created.
    pub auto_on_create: bool,
    /// Reconcile when a record is updated.
    pub auto_on_update: bool,
    /// Only preview changes.
    pub dry_run: bool,
}

impl Default for HookSettings {
    fn default() -> Self {
        Self { auto_on_create: false, auto_on_update: true, dry_run: true }
    }
}

/// Options applied by the pre-bound trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreboundSettings {
    /// Only preview changes.
    pub dry_run: bool,
    /// Load in replace mode.
    pub replace: bool,
    /// Persist when not a dry run.
    pub commit: bool,
}

impl Default for PreboundSettings {
    fn default() -> Self {
        let options = RequestOptions::default();
        Self { dry_run: options.dry_run, replace: options.replace, commit: options.commit }
    }
}

impl PreboundSettings {
    /// The request options these settings describe.
    #[must_use]
    pub fn options(self) -> RequestOptions {
        RequestOptions { dry_run: self.dry_run, replace: self.replace, commit: self.commit }
    }
}

/// Stage timeouts in whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutSettings {
    /// Connect timeout.
    pub connect_secs: u64,
    /// Load, diff, and discard timeout.
    pub load_secs: u64,
    /// Commit and confirm timeout.
    pub commit_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        let defaults = StageTimeouts::default();
        Self {
            connect_secs: defaults.connect.as_secs(),
            load_secs: defaults.load.as_secs(),
            commit_secs: defaults.commit.as_secs(),
        }
    }
}

impl TimeoutSettings {
    /// Converts to engine timeouts.
    #[must_use]
    pub fn stage_timeouts(self) -> StageTimeouts {
        StageTimeouts {
            connect: Duration::from_secs(self.connect_secs),
            load: Duration::from_secs(self.load_secs),
            commit: Duration::from_secs(self.commit_secs),
        }
    }
}

/// File locations for the bundled adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathSettings {
    /// YAML inventory file.
    pub inventory: PathBuf,
    /// Directory of `<template_key>.tmpl` files.
    pub templates: PathBuf,
    /// Directory holding simulated device state.
    pub devices: PathBuf,
    /// JSON-lines file results are appended to.
    pub results: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            inventory: PathBuf::from("inventory.yaml"),
            templates: PathBuf::from("templates"),
            devices: PathBuf::from("devices"),
            results: PathBuf::from("results.jsonl"),
        }
    }
}

/// Which driver kinds the registry serves, and with what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverSettings {
    /// Driver kinds served by the file-backed simulated driver.
    pub simulate: BTreeSet<DriverKind>,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self { simulate: [DriverKind::File].into_iter().collect() }
    }
}

impl Settings {
    /// Parses settings from YAML text. An empty document yields defaults.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the text is not valid settings YAML.
    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Loads settings from `explicit`, [`CONFIG_ENV`], or
    /// [`DEFAULT_CONFIG_FILE`], in that order.
    ///
    /// # Errors
    ///
    /// Returns an error when an explicitly named file (by flag or
    /// environment) cannot be read, or when any chosen file fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        match named {
            Some(path) => Self::read(&path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::read(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| Error::SettingsRead { path: path.to_path_buf(), source })?;
        Self::from_yaml(&text)
            .map_err(|source| Error::SettingsParse { path: path.to_path_buf(), source })
    }
}
