//! Store error type.

use thiserror::Error;

use fl_core::{Step, ValueKind};

/// Failed variable write.  Returned to the calling ware, which decides
/// whether to escalate it to an execution error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("variable `{name}` already has a value at {step}")]
    DuplicateWrite { name: String, step: Step },

    #[error("variable `{name}`: cannot write {step} before {next}")]
    FutureStep { name: String, step: Step, next: Step },

    #[error("variable `{name}` holds {expected} values, got {got}")]
    TypeMismatch {
        name:     String,
        expected: ValueKind,
        got:      ValueKind,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;
