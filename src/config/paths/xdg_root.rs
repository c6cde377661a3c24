//! XDG base directories for per-workspace data.

use crate::error::TreeError;
use std::path::{Component, Path, PathBuf};

/// `$XDG_DATA_HOME`, falling back to `$HOME/.local/share`
pub fn data_home() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("XDG_DATA_HOME") {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir));
        }
    }

    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local").join("share"))
}

/// `$XDG_CONFIG_HOME`, falling back to `$HOME/.config`
pub fn config_home() -> Result<PathBuf, TreeError> {
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    let home = std::env::var("HOME").map_err(|_| {
        TreeError::ConfigError(
            "Could not determine XDG config home directory (HOME not set)".to_string(),
        )
    })?;
    Ok(PathBuf::from(home).join(".config"))
}

/// Data directory for one workspace
///
/// The canonical workspace path is mirrored under `$XDG_DATA_HOME/canopy/`, so
/// `/srv/site` maps to `$XDG_DATA_HOME/canopy/srv/site/`.
pub fn workspace_data_dir(workspace_root: &Path) -> Result<PathBuf, TreeError> {
    let data_home = data_home().ok_or_else(|| {
        TreeError::ConfigError(
            "Could not determine XDG data home directory (HOME not set)".to_string(),
        )
    })?;
    let canonical = workspace_root.canonicalize().map_err(|e| {
        TreeError::ConfigError(format!("Failed to canonicalize workspace path: {}", e))
    })?;

    Ok(mirror_path(data_home.join("canopy"), &canonical))
}

/// Append the normal components of `path` to `base`
pub(crate) fn mirror_path(base: PathBuf, path: &Path) -> PathBuf {
    path.components().fold(base, |acc, component| match component {
        Component::Normal(name) => acc.join(name),
        _ => acc,
    })
}
