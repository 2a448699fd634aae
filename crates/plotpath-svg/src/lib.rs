//! # Plotpath SVG
//!
//! SVG front end: walks an externally parsed shape tree and lowers `rect`,
//! `polygon`, `polyline` and `path` elements (nested in transformed groups)
//! onto a `PathEmitter`.

pub mod error;
pub mod node;
pub mod path_data;
pub mod shapes;
pub mod walker;

pub use error::{Result, SvgError};
pub use node::{ShapeNode, SvgNode};
pub use path_data::{normalize, tokenize, CommandKind, PathCommand, SvgPathGrammar, Token};
pub use shapes::ShapeKind;
pub use walker::{svg_to_path, ShapeWalker, SvgConversion, DEFAULT_SVG_SCALE, SVG_WELCOME};
