//! # Plotpath
//!
//! Converts SVG shape trees and GCode programs into one line-oriented
//! instruction stream for a 2D/2.5D plotting or fabrication device.
//!
//! ## Architecture
//!
//! Plotpath is organized as a workspace with multiple crates:
//!
//! 1. **plotpath-core** - Geometry, Bézier flattening, the `PathEmitter`
//! 2. **plotpath-svg** - Shape tree walker and SVG path-data grammar
//! 3. **plotpath-gcode** - GCode tokenizer and modal interpreter
//! 4. **plotpath-settings** - Conversion settings and their persistence
//! 5. **plotpath** - This facade: configured entry points and logging setup

pub use plotpath_core::{
    AffineMatrix, CurveFlattener, EmitterError, FlattenedCurve, Instruction, PathEmitter, Point,
    Statement,
};
pub use plotpath_gcode::{GcodeConversion, GcodeError, GcodeInterpreter, GcodeOptions};
pub use plotpath_settings::{Config, GcodeSettings, SettingsError, SvgSettings};
pub use plotpath_svg::{ShapeNode, ShapeWalker, SvgConversion, SvgError, SvgNode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// GCode interpreter options from the `gcode` section of `config`
pub fn gcode_options(config: &Config) -> GcodeOptions {
    GcodeOptions {
        scale: config.gcode.scale,
        extrusion_proximity: config.gcode.extrusion_proximity,
    }
}

/// Convert the children of `root` with the `svg` settings of `config`
pub fn convert_svg<N: ShapeNode>(root: &N, config: &Config) -> plotpath_svg::Result<SvgConversion> {
    tracing::debug!(scale = config.svg.scale, "converting SVG");
    plotpath_svg::svg_to_path(root, config.svg.scale)
}

/// Convert a GCode program with the `gcode` settings of `config`
pub fn convert_gcode(text: &str, config: &Config) -> plotpath_gcode::Result<GcodeConversion> {
    tracing::debug!(
        scale = config.gcode.scale,
        proximity = config.gcode.extrusion_proximity,
        "converting G-Code"
    );
    plotpath_gcode::gcode_to_path(text, &gcode_options(config))
}

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
///
/// Fails if a global subscriber is already installed.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
