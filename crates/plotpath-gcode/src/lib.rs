//! # Plotpath GCode
//!
//! GCode front end: a forward-only modal interpreter that turns linear
//! moves, dwells, homing, positioning modes and position resets into
//! `PathEmitter` calls.

pub mod block;
pub mod command;
pub mod error;
pub mod interpreter;

pub use block::{strip_comments, Block, Word};
pub use command::Command;
pub use error::{GcodeError, Result};
pub use interpreter::{
    gcode_to_path, CarriedFields, GcodeConversion, GcodeInterpreter, GcodeOptions, GCODE_WELCOME,
};
