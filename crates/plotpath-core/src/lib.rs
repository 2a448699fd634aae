//! # Plotpath Core
//!
//! Geometry and code-emission core shared by the plotpath front ends.
//! Provides the 2D primitives, Bézier flattening, and the `PathEmitter`
//! that turns local-frame drawing calls into the device instruction stream.

pub mod emitter;
pub mod error;
pub mod flatten;
pub mod geometry;

pub use emitter::{
    format_number, Axis, Instruction, PathEmitter, Statement, DEFAULT_LONG_WAIT, DEFAULT_WAIT,
    DEFAULT_WELCOME,
};
pub use error::{EmitterError, Error, FlattenError, Result};
pub use flatten::{sample_count, simplify, CurveFlattener, FlattenedCurve};
pub use geometry::{AffineMatrix, Point};
