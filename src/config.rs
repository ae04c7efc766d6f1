//! Runtime configuration loaded from TOML.
//!
//! Every field has a default, so an empty or missing file yields a working
//! configuration that looks for a bundled engine next to the executable and
//! falls back to `plantuml` on `PATH`.

use crate::engine::FramingMode;
use crate::error::{PumlpadError, Result};
use crate::export::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default render deadline in milliseconds
pub const DEFAULT_RENDER_TIMEOUT_MS: u64 = 5_000;

/// Delimiter line the engine prints after each streamed document
pub const DEFAULT_PIPE_DELIMITER: &str = "__PUMLPAD_DOCUMENT_END__";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub render: RenderConfig,
    pub export: ExportConfig,
}

/// How to launch the diagram engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Executable to run. `None` resolves a bundled runtime or `plantuml` on PATH.
    pub program: Option<PathBuf>,
    /// Arguments placed before the mode flags (e.g. `["-jar", "plantuml.jar"]`)
    pub args: Vec<String>,
    pub charset: String,
    pub framing: FramingMode,
    /// Only used with [`FramingMode::Delimiter`]
    pub delimiter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: Vec::new(),
            charset: "UTF-8".to_string(),
            framing: FramingMode::Delimiter,
            delimiter: DEFAULT_PIPE_DELIMITER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub timeout_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_RENDER_TIMEOUT_MS,
        }
    }
}

impl RenderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ImageFormat,
    /// Working directory for temporary sources. `None` picks a directory
    /// next to the executable (release) or inside the crate (debug).
    pub temp_dir: Option<PathBuf>,
    /// File stem suggested by the save dialog
    pub default_file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ImageFormat::Svg,
            temp_dir: None,
            default_file_name: "diagram".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, the user config file, or defaults.
    ///
    /// An explicit path must exist; the user config file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.is_file() => path,
                _ => {
                    log::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        log::debug!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            PumlpadError::file_error(format!("Failed to read config: {}", path.display()), e)
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).map_err(|e| PumlpadError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// `<config_dir>/pumlpad/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pumlpad").join("config.toml"))
    }

    fn validate(&self) -> Result<()> {
        if self.render.timeout_ms == 0 {
            return Err(PumlpadError::config("render.timeout_ms must be greater than 0"));
        }
        if self.engine.framing == FramingMode::Delimiter && self.engine.delimiter.trim().is_empty()
        {
            return Err(PumlpadError::config(
                "engine.delimiter must not be empty when framing = \"delimiter\"",
            ));
        }
        if self.export.default_file_name.trim().is_empty() {
            return Err(PumlpadError::config("export.default_file_name must not be empty"));
        }
        Ok(())
    }
}
