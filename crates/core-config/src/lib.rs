//! Runtime configuration.
//!
//! Parses `tangram.toml` (or an override path provided by the binary).
//! Unknown fields are ignored so documents from newer builds still
//! load. Precedence for every knob: CLI flag, then config file, then
//! project document, then the built-in default — applied in
//! [`Config::effective`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::info;

/// Parsed `tangram.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub runtime: RuntimeSection,
    pub logging: LoggingSection,
    pub cloud: CloudSection,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeSection {
    /// Target fps override; 0 or absent defers to the project.
    pub fps: Option<u32>,
    pub vsync: Option<bool>,
    /// Renderer backend hint: "gl" (default) or "vulkan".
    pub renderer: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSection {
    /// `EnvFilter` directive string, e.g. "info,exec=debug".
    pub filter: Option<String>,
    /// Log file path; absent logs to stderr only.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CloudSection {
    /// Cloud-variable mirror file.
    pub file: Option<PathBuf>,
}

/// CLI-level overrides, already parsed by the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct CliOverrides {
    pub fps: Option<u32>,
    pub vsync: Option<bool>,
    pub use_vulkan: Option<bool>,
}

/// Fully-resolved settings the engine and binary consume.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    /// `None` defers to the project's own `speed`.
    pub fps_override: Option<u32>,
    pub vsync: bool,
    pub use_vulkan: bool,
    pub log_filter: String,
    pub log_file: Option<PathBuf>,
    pub cloud_file: PathBuf,
}

/// Load a config: explicit path must exist; the discovery path
/// (`tangram.toml` in the working directory) is optional.
pub fn load_from(explicit: Option<&std::path::Path>) -> Result<Config> {
    let (path, required) = match explicit {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from("tangram.toml"), false),
    };
    if !path.exists() {
        if required {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Ok(Config::default());
    }
    let text = fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: Config =
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    info!(target: "config", path = %path.display(), "configuration loaded");
    Ok(config)
}

impl Config {
    /// Resolve against CLI flags. Fps values of 0 are treated as unset.
    pub fn effective(&self, cli: CliOverrides) -> EffectiveConfig {
        let fps_override = cli
            .fps
            .or(self.runtime.fps)
            .filter(|fps| *fps > 0);
        let vsync = cli.vsync.or(self.runtime.vsync).unwrap_or(true);
        let use_vulkan = cli
            .use_vulkan
            .or(self
                .runtime
                .renderer
                .as_deref()
                .map(|r| r.eq_ignore_ascii_case("vulkan")))
            .unwrap_or(false);
        EffectiveConfig {
            fps_override,
            vsync,
            use_vulkan,
            log_filter: self
                .logging
                .filter
                .clone()
                .unwrap_or_else(|| "info".to_owned()),
            log_file: self.logging.file.clone(),
            cloud_file: self
                .cloud
                .file
                .clone()
                .unwrap_or_else(|| PathBuf::from("cloud_variables.json")),
        }
    }
}
