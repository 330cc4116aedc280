use thiserror::Error;

use fl_core::{CoreError, Step};
use fl_spatial::SpatialError;
use fl_store::StoreError;

use crate::{Capabilities, Phase};

/// A refused or failed operation on the simulation state.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("ware `{ware}` lacks the {missing} capability")]
    CapabilityDenied { ware: String, missing: Capabilities },

    #[error("{what} is not allowed during {phase}")]
    WrongPhase { what: &'static str, phase: Phase },

    #[error("variable `{name}`: {step} is past the current step {current}")]
    OutsideWindow { name: String, step: Step, current: Step },

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AccessResult<T> = Result<T, AccessError>;

/// Error returned from a ware hook.
#[derive(Debug, Error)]
pub enum WareError {
    #[error("missing parameter `{0}`")]
    MissingParam(String),

    #[error("parameter `{name}`: cannot read `{value}` as {expected}")]
    InvalidParam {
        name:     String,
        value:    String,
        expected: &'static str,
    },

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Value(#[from] CoreError),

    #[error("{0}")]
    Failed(String),
}

impl WareError {
    pub fn failed(text: impl Into<String>) -> Self {
        WareError::Failed(text.into())
    }
}

pub type WareResult<T> = Result<T, WareError>;

/// Failure to resolve or instantiate a ware from the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no ware registered under `{0}`")]
    UnknownWare(String),

    #[error("ware `{0}` is already registered")]
    Duplicate(String),

    #[error("ware `{ware}` was built for ABI {found}, host expects {expected}")]
    AbiMismatch {
        ware:     String,
        found:    String,
        expected: String,
    },
}

pub type RegistryResult<T> = Result<T, RegistryError>;
