//! Configuration sources, each optional and layered in order by the merge service.

use crate::config::xdg;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File, FileFormat};
use std::path::{Path, PathBuf};

type Builder = ConfigBuilder<DefaultState>;

/// File name looked up at the workspace root
pub const WORKSPACE_CONFIG_FILE: &str = "canopy.toml";

/// Prefix for overrides such as `CANOPY__TREE__DEPTH_POLICY=node_only`
pub const ENV_PREFIX: &str = "CANOPY";

/// `$XDG_CONFIG_HOME/canopy/config.toml`, if a config home can be determined
pub fn global_config_path() -> Option<PathBuf> {
    xdg::config_home()
        .ok()
        .map(|home| home.join("canopy").join("config.toml"))
}

fn toml_file(path: PathBuf, required: bool) -> File<config::FileSourceFile, FileFormat> {
    File::from(path).format(FileFormat::Toml).required(required)
}

pub fn add_global_file(builder: Builder) -> Builder {
    match global_config_path() {
        Some(path) => builder.add_source(toml_file(path, false)),
        None => builder,
    }
}

pub fn add_workspace_file(builder: Builder, workspace_root: &Path) -> Builder {
    builder.add_source(toml_file(workspace_root.join(WORKSPACE_CONFIG_FILE), false))
}

/// An explicitly named file must exist
pub fn add_explicit_file(builder: Builder, path: &Path) -> Builder {
    builder.add_source(toml_file(path.to_path_buf(), true))
}

/// `CANOPY__SECTION__KEY` overlay; values are parsed as bool/number where possible
pub fn add_environment(builder: Builder) -> Builder {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    )
}

/// Builder seeded with the values every other source overrides
pub fn defaults() -> Result<Builder, ConfigError> {
    config::Config::builder()
        .set_default("tree.depth_policy", "cascade")?
        .set_default("tree.orphan_policy", "exclude")?
        .set_default("tree.cache_enabled", true)
}
