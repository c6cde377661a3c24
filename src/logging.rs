//! Logging
//!
//! Structured logging through `tracing`. The `[logging]` config section picks the
//! level, format, and destination; `CANOPY_LOG`, `CANOPY_LOG_FORMAT`,
//! `CANOPY_LOG_OUTPUT` and `CANOPY_LOG_FILE` override it for one run.

use crate::config::paths::xdg_root::mirror_path;
use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt as stdfmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

const LOG_FILE_NAME: &str = "canopy.log";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(TreeError::ConfigError(format!(
                "unknown log format '{}', expected text or json",
                other
            ))),
        }
    }
}

/// Where log lines go
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogOutput {
    #[serde(rename = "stdout")]
    Stdout,
    #[default]
    #[serde(rename = "stderr")]
    Stderr,
    #[serde(rename = "file")]
    File,
    #[serde(rename = "file+stderr")]
    FileAndStderr,
    /// stdout and stderr
    #[serde(rename = "both")]
    Both,
}

impl LogOutput {
    fn writes_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::FileAndStderr)
    }
}

impl FromStr for LogOutput {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "stdout" => LogOutput::Stdout,
            "stderr" => LogOutput::Stderr,
            "file" => LogOutput::File,
            "file+stderr" => LogOutput::FileAndStderr,
            "both" => LogOutput::Both,
            other => {
                return Err(TreeError::ConfigError(format!(
                    "unknown log output '{}', expected stdout, stderr, file, file+stderr or both",
                    other
                )))
            }
        })
    }
}

impl stdfmt::Display for LogOutput {
    fn fmt(&self, f: &mut stdfmt::Formatter<'_>) -> stdfmt::Result {
        let name = match self {
            LogOutput::Stdout => "stdout",
            LogOutput::Stderr => "stderr",
            LogOutput::File => "file",
            LogOutput::FileAndStderr => "file+stderr",
            LogOutput::Both => "both",
        };
        f.write_str(name)
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// trace, debug, info, warn, error or off
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Used when output includes a file; unset means the platform state directory
    pub file: Option<PathBuf>,
    /// ANSI colours for text written to a terminal
    pub color: bool,
    /// Extra per-target directives, e.g. `"canopy::store" = "debug"`
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Text,
            output: LogOutput::Stderr,
            file: None,
            color: true,
            modules: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Copy with the `CANOPY_LOG_FORMAT` and `CANOPY_LOG_OUTPUT` overrides applied
    fn with_env_overrides(&self) -> Result<Self, TreeError> {
        self.with_overrides(env_value("CANOPY_LOG_FORMAT"), env_value("CANOPY_LOG_OUTPUT"))
    }

    /// Unknown values are rejected, as they are in the config section
    fn with_overrides(&self, format: Option<String>, output: Option<String>) -> Result<Self, TreeError> {
        let mut effective = self.clone();
        if let Some(format) = format {
            effective.format = format.parse()?;
        }
        if let Some(output) = output {
            effective.output = output.parse()?;
        }
        Ok(effective)
    }

    /// `CANOPY_LOG` wins outright; otherwise the level plus module directives
    fn filter(&self) -> Result<EnvFilter, TreeError> {
        if let Ok(filter) = EnvFilter::try_from_env("CANOPY_LOG") {
            return Ok(filter);
        }
        if self.level == "off" {
            return Ok(EnvFilter::new("off"));
        }

        self.modules
            .iter()
            .try_fold(EnvFilter::new(&self.level), |filter, (target, level)| {
                let directive = format!("{}={}", target, level).parse().map_err(|e| {
                    TreeError::ConfigError(format!("bad log directive for {}: {}", target, e))
                })?;
                Ok(filter.add_directive(directive))
            })
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Log file location: explicit path, then `CANOPY_LOG_FILE`, then the configured
/// file, then `<state dir>/canopy.log` (mirrored per workspace when one is given).
pub fn resolve_log_file_path(
    explicit: Option<PathBuf>,
    configured: Option<PathBuf>,
    workspace: Option<&Path>,
) -> Result<PathBuf, TreeError> {
    let non_empty = |p: &PathBuf| !p.as_os_str().is_empty();
    if let Some(path) = explicit.filter(non_empty) {
        return Ok(path);
    }
    if let Some(path) = env_value("CANOPY_LOG_FILE") {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = configured.filter(non_empty) {
        return Ok(path);
    }

    let dirs = directories::ProjectDirs::from("", "canopy", "canopy").ok_or_else(|| {
        TreeError::ConfigError("no home directory for the default log file".to_string())
    })?;
    // state_dir only exists on Linux
    let state = dirs
        .state_dir()
        .unwrap_or_else(|| dirs.data_local_dir())
        .to_path_buf();

    let dir = match workspace {
        Some(ws) => {
            let canonical = ws.canonicalize().map_err(|e| {
                TreeError::ConfigError(format!("cannot resolve workspace {}: {}", ws.display(), e))
            })?;
            mirror_path(state, &canonical)
        }
        None => state,
    };
    Ok(dir.join(LOG_FILE_NAME))
}

fn open_append(path: &Path) -> Result<File, TreeError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| {
            TreeError::ConfigError(format!("cannot create log directory {}: {}", dir.display(), e))
        })?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| TreeError::ConfigError(format!("cannot open log file {}: {}", path.display(), e)))
}

fn make_writer(config: &LoggingConfig, workspace: Option<&Path>) -> Result<BoxMakeWriter, TreeError> {
    let writer = match config.output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::Both => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
        LogOutput::File | LogOutput::FileAndStderr => {
            let path = resolve_log_file_path(None, config.file.clone(), workspace)?;
            let file = open_append(&path)?;
            if config.output == LogOutput::File {
                BoxMakeWriter::new(file)
            } else {
                BoxMakeWriter::new(file.and(std::io::stderr))
            }
        }
    };
    Ok(writer)
}

/// Install the global subscriber
///
/// Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig, workspace: Option<&Path>) -> Result<(), TreeError> {
    let installed = if !config.enabled {
        Registry::default().with(EnvFilter::new("off")).try_init()
    } else {
        let config = config.with_env_overrides()?;
        let filter = config.filter()?;
        let writer = make_writer(&config, workspace)?;
        let layer = fmt::layer()
            .with_target(true)
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(writer);

        match config.format {
            LogFormat::Json => Registry::default().with(filter).with(layer.json()).try_init(),
            LogFormat::Text => {
                let ansi = config.color && !config.output.writes_file();
                Registry::default()
                    .with(filter)
                    .with(layer.with_ansi(ansi))
                    .try_init()
            }
        }
    };

    installed.map_err(|e| TreeError::ConfigError(format!("logger already installed: {}", e)))
}
