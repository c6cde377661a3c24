//! MergeService: layers the sources and deserializes the result into CanopyConfig.

use crate::config::sources;
use crate::config::CanopyConfig;
use config::ConfigError;
use std::path::Path;

pub struct MergeService;

impl MergeService {
    /// Defaults, then the global file, then the workspace file, then environment.
    pub fn load(workspace_root: &Path) -> Result<CanopyConfig, ConfigError> {
        let builder = sources::defaults()?;
        let builder = sources::add_global_file(builder);
        let builder = sources::add_workspace_file(builder, workspace_root);
        let builder = sources::add_environment(builder);

        builder.build()?.try_deserialize()
    }

    /// Defaults, then `path` (which must exist), then environment.
    pub fn load_from_file(path: &Path) -> Result<CanopyConfig, ConfigError> {
        let builder = sources::add_explicit_file(sources::defaults()?, path);
        let builder = sources::add_environment(builder);

        builder.build()?.try_deserialize()
    }
}
