//! The `Ware` trait — the extension point for simulators and observers.

use crate::{WareAccess, WareParams, WareResult};

/// A pluggable computational module.
///
/// The engine drives every ware through the same lifecycle:
///
/// ```text
/// init_params → prepare_data → check_consistency → initialize_run
///             → run_step × N → finalize_run
/// ```
///
/// Every hook after `init_params` receives a [`WareAccess`] bound to the
/// current phase.  What the ware may write depends on the capabilities in its
/// signature and on the phase; see the capability traits in [`crate::access`].
///
/// # Errors
///
/// An `Err` from `prepare_data` or `initialize_run` aborts the run before
/// stepping; an `Err` from `check_consistency` reports an inconsistent model.
/// An `Err` from `run_step` is recorded as an execution error and halts the
/// run; `finalize_run` is still called on every ware.
///
/// Only [`run_step`][Self::run_step] is required.
pub trait Ware: Send + 'static {
    fn init_params(&mut self, _params: &WareParams) -> WareResult<()> {
        Ok(())
    }

    fn prepare_data(&mut self, _access: &mut WareAccess<'_>) -> WareResult<()> {
        Ok(())
    }

    fn check_consistency(&mut self, _access: &mut WareAccess<'_>) -> WareResult<()> {
        Ok(())
    }

    /// Returns the ware's preferred lead time in seconds.  Diagnostic only:
    /// the engine always steps at the run's fixed step length.
    fn initialize_run(&mut self, _access: &mut WareAccess<'_>) -> WareResult<u64> {
        Ok(0)
    }

    fn run_step(&mut self, access: &mut WareAccess<'_>) -> WareResult<()>;

    fn finalize_run(&mut self, _access: &mut WareAccess<'_>) -> WareResult<()> {
        Ok(())
    }

    /// Worker count wanted for `par_for_each_unit`, overriding the signature.
    /// Consulted once, right after `init_params`.
    fn max_threads_hint(&self) -> Option<usize> {
        None
    }
}
