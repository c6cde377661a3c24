//! Entry point for loading configuration.

use super::merge::service::MergeService;
use super::CanopyConfig;
use crate::error::TreeError;
use std::path::Path;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Layered load for a workspace: defaults, global file, workspace file, environment
    pub fn load(workspace_root: &Path) -> Result<CanopyConfig, TreeError> {
        Ok(MergeService::load(workspace_root)?)
    }

    /// Defaults overlaid by one required file and the environment
    pub fn load_from_file(path: &Path) -> Result<CanopyConfig, TreeError> {
        Ok(MergeService::load_from_file(path)?)
    }

    /// Use `explicit` when given, otherwise the workspace layers
    pub fn resolve(workspace_root: &Path, explicit: Option<&Path>) -> Result<CanopyConfig, TreeError> {
        match explicit {
            Some(path) => {
                debug!(path = %path.display(), "Loading explicit config file");
                Self::load_from_file(path)
            }
            None => Self::load(workspace_root),
        }
    }
}
