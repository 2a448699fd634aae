//! Error handling for the SVG front end
//!
//! Input errors are local to one shape element: the element's partial
//! output is rolled back and the error is reported next to the output.
//! Only `Emitter` errors abort a conversion.

use plotpath_core::EmitterError;
use thiserror::Error;

/// SVG conversion error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SvgError {
    /// Path command the grammar does not implement (elliptical arcs)
    #[error("Path command '{command}' not supported")]
    UnsupportedPathCommand {
        /// The command letter.
        command: char,
    },

    /// Element with no handler
    #[error("Element <{tag}> not supported")]
    UnsupportedElement {
        /// The lowercased tag name.
        tag: String,
    },

    /// Coordinate token that is not a finite number
    #[error("Invalid coordinate: '{token}'")]
    MalformedCoordinate {
        /// The offending token.
        token: String,
    },

    /// Path data ended in the middle of a command's coordinates
    #[error("Command '{command}' expects {expected} coordinates, found {found}")]
    MissingCoordinates {
        /// The active command letter.
        command: char,
        /// Coordinates needed by one repetition of the command.
        expected: usize,
        /// Coordinates left in the data.
        found: usize,
    },

    /// Coordinate with no active command before it
    #[error("Coordinate '{token}' has no command")]
    UnexpectedNumber {
        /// The offending token.
        token: String,
    },

    /// Point list with an odd number of values
    #[error("Odd point list: {count} values")]
    OddPointList {
        /// Number of values in the list.
        count: usize,
    },

    /// Required attribute absent
    #[error("<{element}> is missing attribute '{attribute}'")]
    MissingAttribute {
        /// The element tag.
        element: &'static str,
        /// The attribute name.
        attribute: &'static str,
    },

    /// `z`/`Z` before any move command
    #[error("Close command before any move")]
    CloseBeforeMove,

    /// Emitter stack contract violation
    #[error(transparent)]
    Emitter(#[from] EmitterError),
}

/// Result type for SVG conversion
pub type Result<T> = std::result::Result<T, SvgError>;
