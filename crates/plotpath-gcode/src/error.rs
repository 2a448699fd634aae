//! Error handling for the GCode front end
//!
//! Every input error names its 1-based source line. Input errors skip the
//! offending line and are reported next to the output; only `Emitter`
//! errors abort a conversion.

use plotpath_core::EmitterError;
use thiserror::Error;

/// GCode conversion error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// Line that does not split into letter/number fields
    #[error("Invalid G-Code syntax at line {line_number}: {reason}")]
    InvalidSyntax {
        /// 1-based line number.
        line_number: usize,
        /// What could not be parsed.
        reason: String,
    },

    /// Command code with no handler
    #[error("Unknown command {code} at line {line_number}")]
    UnknownCode {
        /// 1-based line number.
        line_number: usize,
        /// The command word, e.g. `M104`.
        code: String,
    },

    /// Recognised command that is not implemented (arc moves)
    #[error("Unsupported command {code} at line {line_number}")]
    UnsupportedCode {
        /// 1-based line number.
        line_number: usize,
        /// The command word, e.g. `G2`.
        code: String,
    },

    /// Line with fields but no command and nothing to repeat
    #[error("No command at line {line_number}")]
    NoCommand {
        /// 1-based line number.
        line_number: usize,
    },

    /// Emitter stack contract violation
    #[error(transparent)]
    Emitter(#[from] EmitterError),
}

impl GcodeError {
    /// Source line of an input error
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::InvalidSyntax { line_number, .. }
            | Self::UnknownCode { line_number, .. }
            | Self::UnsupportedCode { line_number, .. }
            | Self::NoCommand { line_number } => Some(*line_number),
            Self::Emitter(_) => None,
        }
    }
}

/// Result type for GCode conversion
pub type Result<T> = std::result::Result<T, GcodeError>;
