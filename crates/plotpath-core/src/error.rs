//! Error handling for the plotpath core
//!
//! Provides the error types raised by the shared geometry core:
//! - Emitter errors (context and code-buffer stack discipline)
//! - Flattening errors (invalid Bézier input)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Emitter error type
///
/// Every variant is a broken push/pop contract on one of the emitter's
/// stacks. None of them can be produced by malformed input; they indicate
/// a caller that did not pair its stack operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmitterError {
    /// `release_context` called with no stored context
    #[error("Context stack underflow: release without matching store")]
    ContextUnderflow,

    /// `release_code` or `restore_code` called with no stored snapshot
    #[error("Code stack underflow: {operation} without matching store")]
    CodeUnderflow {
        /// The operation that found the stack empty.
        operation: &'static str,
    },

    /// Output requested while code snapshots are still pending
    #[error("Unbalanced code stack: {depth} snapshot(s) still pending")]
    UnbalancedCodeStack {
        /// Number of snapshots left on the stack.
        depth: usize,
    },

    /// Output requested while transform contexts are still pushed
    #[error("Unbalanced context stack: {depth} context(s) still pushed")]
    UnbalancedContextStack {
        /// Number of contexts left on the stack.
        depth: usize,
    },
}

/// Curve flattening error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlattenError {
    /// Fewer than 3 control points were supplied
    #[error("Too few control points for a Bézier curve: {count} (need 3 or 4)")]
    TooFewControlPoints {
        /// The number of points supplied.
        count: usize,
    },

    /// More than 4 control points were supplied
    #[error("Unsupported Bézier degree: {count} control points (need 3 or 4)")]
    TooManyControlPoints {
        /// The number of points supplied.
        count: usize,
    },
}

/// Main error type for the plotpath core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Emitter stack error
    #[error(transparent)]
    Emitter(#[from] EmitterError),

    /// Curve flattening error
    #[error(transparent)]
    Flatten(#[from] FlattenError),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;
