//! Core error type.
//!
//! Sub-crates define their own error enums and either convert into
//! `CoreError` or wrap it as one variant.  Prefer whichever keeps error sites
//! clean.

use thiserror::Error;

use crate::ValueKind;

/// Errors raised by `fl-core` constructors and conversions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid run period: begin {begin} must be before end {end}")]
    EmptyPeriod { begin: i64, end: i64 },

    #[error("invalid step duration {0}s: must be at least 1s")]
    StepDuration(u64),

    #[error("matrix of {rows}x{cols} needs {expected} values, got {got}")]
    MatrixShape {
        rows:     usize,
        cols:     usize,
        expected: usize,
        got:      usize,
    },

    #[error("value of kind {got} cannot be read as {expected}")]
    Conversion { expected: ValueKind, got: ValueKind },
}

/// Shorthand result type for `fl-core`.
pub type CoreResult<T> = Result<T, CoreError>;
