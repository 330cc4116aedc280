//! Engine configuration.

use fl_store::WritePolicy;

/// What the engine does when an execution error is raised mid-step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HaltPolicy {
    /// Stop right after the ware that raised the error; later wares of the
    /// step and the monitoring pass do not run.
    #[default]
    Immediate,
    /// Let every simulator and observer finish the current step, then stop.
    CompleteStep,
}

/// Engine-wide settings.
///
/// Typically loaded by the application together with the model description.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Upper bound on the workers of any single ware.  `None` caps at the
    /// size of the global Rayon pool (one worker without `parallel`).
    pub max_threads: Option<usize>,

    /// Same-step double writes: reject (default) or overwrite.
    pub write_policy: WritePolicy,

    pub halt_policy: HaltPolicy,
}

impl EngineConfig {
    /// The global worker cap applied to every ware.
    pub fn thread_cap(&self) -> usize {
        self.max_threads.unwrap_or_else(default_thread_cap)
    }
}

#[cfg(feature = "parallel")]
fn default_thread_cap() -> usize {
    rayon::current_num_threads()
}

#[cfg(not(feature = "parallel"))]
fn default_thread_cap() -> usize {
    1
}
