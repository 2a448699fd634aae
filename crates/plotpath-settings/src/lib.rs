//! # Plotpath Settings
//!
//! Conversion parameters for the SVG and GCode front ends, with JSON/TOML
//! persistence.

pub mod config;
pub mod error;

pub use config::{Config, GcodeSettings, SvgSettings};
pub use error::{SettingsError, SettingsResult};
