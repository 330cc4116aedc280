use thiserror::Error;

use fl_ware::{RegistryError, WareError};

use crate::WareState;

/// Setup failures.  All of them are reported before the first step runs.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("ware `{ware}`: cannot {attempted} while {state}")]
    Lifecycle {
        ware:      String,
        state:     WareState,
        attempted: &'static str,
    },

    #[error("ware `{ware}` failed in {phase}: {source}")]
    SetupHook {
        ware:   String,
        phase:  &'static str,
        #[source]
        source: WareError,
    },

    #[error("ware `{ware}` reports an inconsistent model: {reason}")]
    Inconsistent { ware: String, reason: String },

    #[error("execution error raised during {phase}")]
    FatalDuringSetup { phase: &'static str },

    #[error("engine configuration error: {0}")]
    Config(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
