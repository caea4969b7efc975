// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for deleg tools (config storage, registry bootstrap).
//! Keeps CLI and adapters thin.

pub mod config;
pub mod registry_config;

pub use config::{ConfigError, ConfigService, ConfigStore, MemoryConfigStore};
pub use registry_config::{RegistryConfig, TopLevelOwner, DEFAULT_CONFIG_KEY};
