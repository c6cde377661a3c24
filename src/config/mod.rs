//! Configuration
//!
//! Layered configuration built with the `config` crate. Precedence, lowest first:
//! built-in defaults, `$XDG_CONFIG_HOME/canopy/config.toml`, `<workspace>/canopy.toml`,
//! `CANOPY__*` environment variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod workspace;

use crate::logging::LoggingConfig;
use crate::tree::{DepthPolicy, OrphanPolicy};
use serde::{Deserialize, Serialize};

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use workspace::storage_paths::StorageConfig;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanopyConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub tree: TreeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Behaviour of the tree core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Whether a move rewrites descendants' stored depth
    #[serde(default)]
    pub depth_policy: DepthPolicy,

    /// What tree reads do with nodes whose parent is missing or hidden
    #[serde(default)]
    pub orphan_policy: OrphanPolicy,

    /// Memoize assembled trees per audience
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            depth_policy: DepthPolicy::default(),
            orphan_policy: OrphanPolicy::default(),
            cache_enabled: default_true(),
        }
    }
}

impl CanopyConfig {
    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, crate::error::TreeError> {
        toml::to_string_pretty(self).map_err(|e| {
            crate::error::TreeError::ConfigError(format!("Failed to serialize config: {}", e))
        })
    }
}
