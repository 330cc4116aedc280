//! Spatial-subsystem error type.

use thiserror::Error;

use fl_core::{UnitIndex, UnitKey};

/// Structural failures.  These are recoverable signals for the caller, never
/// fatal to a run on their own.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpatialError {
    #[error("unit {0} already exists")]
    AlreadyExists(UnitKey),

    #[error("unit {0} not found")]
    UnknownUnit(UnitKey),

    #[error("no live unit in slot {0}")]
    UnknownSlot(UnitIndex),

    #[error("unit {0} cannot be connected to itself")]
    SelfLoop(UnitKey),

    #[error("a {rows}x{cols} grid has more units than a u32 id can number")]
    GridTooLarge { rows: u32, cols: u32 },
}

pub type SpatialResult<T> = Result<T, SpatialError>;
