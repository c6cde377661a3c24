//! StorageConfig and store path resolution.

use crate::config::xdg;
use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Node store location, relative to the workspace root. Unset means the
    /// workspace's XDG data directory.
    #[serde(default)]
    pub store_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the store directory for `workspace_root`
    pub fn resolve_store_path(&self, workspace_root: &Path) -> Result<PathBuf, TreeError> {
        match &self.store_path {
            Some(path) if path.is_absolute() => Ok(path.clone()),
            Some(path) => Ok(workspace_root.join(path)),
            None => Ok(xdg::workspace_data_dir(workspace_root)?.join("store")),
        }
    }
}
