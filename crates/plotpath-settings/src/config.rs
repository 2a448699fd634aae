//! Conversion configuration
//!
//! One section per front end. Files are JSON or TOML, chosen by extension,
//! and are validated on both load and save.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{SettingsError, SettingsResult};

/// SVG front end settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvgSettings {
    /// SVG user units to device units
    pub scale: f64,
}

impl Default for SvgSettings {
    fn default() -> Self {
        Self { scale: 100.0 }
    }
}

/// GCode front end settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcodeSettings {
    /// GCode units to device units
    pub scale: f64,
    /// Extrusion changes up to this magnitude are ignored
    pub extrusion_proximity: f64,
}

impl Default for GcodeSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            extrusion_proximity: 0.0,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub svg: SvgSettings,
    pub gcode: GcodeSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

impl Format {
    fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("toml") => Ok(Format::Toml),
            _ => Err(SettingsError::UnsupportedFormat(format!(
                "{} (config file must be .json or .toml)",
                path.display()
            ))),
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// `<config dir>/plotpath/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("plotpath").join("config.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".into())
            })
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = Format::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::from_path(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content).map_err(|e| {
            SettingsError::SaveError(format!("Failed to write {}: {}", path.display(), e))
        })?;

        debug!(path = %path.display(), "saved configuration");
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        if !(self.svg.scale.is_finite() && self.svg.scale > 0.0) {
            return Err(SettingsError::invalid("svg.scale", "must be a finite value > 0"));
        }

        if !(self.gcode.scale.is_finite() && self.gcode.scale > 0.0) {
            return Err(SettingsError::invalid("gcode.scale", "must be a finite value > 0"));
        }

        let proximity = self.gcode.extrusion_proximity;
        if !(proximity.is_finite() && proximity >= 0.0) {
            return Err(SettingsError::invalid(
                "gcode.extrusion_proximity",
                "must be a finite value >= 0",
            ));
        }

        Ok(())
    }
}
