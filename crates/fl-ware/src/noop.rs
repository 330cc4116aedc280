//! A ware that does nothing.

use crate::{Ware, WareAccess, WareResult, WareSignature};

/// A [`Ware`] whose every hook succeeds without touching the state.
///
/// Useful as a placeholder in model descriptions and in tests.
#[derive(Default)]
pub struct NoopWare;

impl NoopWare {
    pub const ID: &'static str = "tests.noop";

    pub fn signature() -> WareSignature {
        WareSignature::simulator(Self::ID).describe("does nothing")
    }
}

impl Ware for NoopWare {
    fn run_step(&mut self, _access: &mut WareAccess<'_>) -> WareResult<()> {
        Ok(())
    }
}
