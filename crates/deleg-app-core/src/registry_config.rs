// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Registry bootstrap document.

use deleg_core::{Principal, Registry};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ConfigError, ConfigService, ConfigStore};

/// Config key the registry document is stored under by default.
pub const DEFAULT_CONFIG_KEY: &str = "registry";

/// Owner assignment for one top-level name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopLevelOwner {
    /// Single label, e.g. `eth`.
    pub label: String,
    /// Principal that owns the label and everything beneath it.
    pub owner: Principal,
}

/// Everything needed to stand up a registry.
///
/// ```json
/// {
///   "admin": "0x1111111111111111111111111111111111111111",
///   "top_level": [{ "label": "eth", "owner": "0x2222222222222222222222222222222222222222" }],
///   "log_filter": "deleg_core=debug"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Deploying principal; owns the root name.
    pub admin: Principal,
    /// Top-level owners registered at bootstrap.
    #[serde(default)]
    pub top_level: Vec<TopLevelOwner>,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl RegistryConfig {
    /// A config with only an admin.
    pub fn new(admin: Principal) -> Self {
        Self {
            admin,
            top_level: Vec::new(),
            log_filter: None,
        }
    }

    /// Parses a JSON document.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Loads the document stored under `key`; `Ok(None)` if absent.
    pub fn load<S: ConfigStore>(
        service: &ConfigService<S>,
        key: &str,
    ) -> Result<Option<Self>, ConfigError> {
        service.load(key)
    }

    /// Builds an in-memory registry with every top-level owner registered.
    ///
    /// Fails if a label is not a single label or appears twice.
    pub fn build_registry(&self) -> Result<Registry, ConfigError> {
        let mut registry = Registry::new(self.admin);
        for entry in &self.top_level {
            registry.register_top_level(&entry.label, entry.owner)?;
        }
        // Bootstrap registrations are not part of the caller's history.
        registry.drain_events();
        info!(
            admin = %self.admin,
            top_level = self.top_level.len(),
            "registry bootstrapped"
        );
        Ok(registry)
    }
}
