//! `WareHost` — one ware instance and its lifecycle state machine.
//!
//! ```text
//! Created ─init_params→ Parameterized ─prepare_data→ DataPrepared
//!   ─check_consistency→ ConsistencyChecked ─initialize_run→ RunInitialized
//!   ─run_step→ Stepping ─run_step→ Stepping …
//! RunInitialized | Stepping ─finalize_run→ Finalized
//! ```
//!
//! Any other transition is an [`EngineError::Lifecycle`].

use std::fmt;

use fl_core::{ExecutionMessages, RunDescriptor, RunEnv, Step};
use fl_ware::{Phase, Ware, WareAccess, WareParams, WareSignature, World};

use crate::{EngineError, EngineResult};

// ── WareState ─────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WareState {
    Created,
    Parameterized,
    DataPrepared,
    ConsistencyChecked,
    RunInitialized,
    Stepping,
    Finalized,
}

impl fmt::Display for WareState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WareState::Created            => "created",
            WareState::Parameterized      => "parameterized",
            WareState::DataPrepared       => "data-prepared",
            WareState::ConsistencyChecked => "consistency-checked",
            WareState::RunInitialized     => "run-initialized",
            WareState::Stepping           => "stepping",
            WareState::Finalized          => "finalized",
        };
        f.write_str(s)
    }
}

// ── RunContext ────────────────────────────────────────────────────────────────

/// Borrowed run state handed to every hook call.
pub struct RunContext<'a> {
    pub run:      &'a RunDescriptor,
    pub env:      &'a RunEnv,
    pub world:    &'a mut World,
    pub messages: &'a ExecutionMessages,
}

// ── WareHost ──────────────────────────────────────────────────────────────────

pub struct WareHost {
    signature:   WareSignature,
    ware:        Box<dyn Ware>,
    params:      WareParams,
    state:       WareState,
    max_threads: usize,
    #[cfg(feature = "parallel")]
    pool:        Option<rayon::ThreadPool>,
}

impl WareHost {
    /// Wrap a fresh instance.  Declared parameter defaults are filled in.
    pub fn new(signature: WareSignature, ware: Box<dyn Ware>, mut params: WareParams) -> Self {
        params.apply_defaults(&signature);
        let max_threads = signature.max_threads;
        Self {
            signature,
            ware,
            params,
            state: WareState::Created,
            max_threads,
            #[cfg(feature = "parallel")]
            pool: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.signature.id
    }

    pub fn signature(&self) -> &WareSignature {
        &self.signature
    }

    pub fn params(&self) -> &WareParams {
        &self.params
    }

    pub fn state(&self) -> WareState {
        self.state
    }

    /// Effective worker count after parameterization.
    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    pub fn is_observer(&self) -> bool {
        self.signature.is_observer()
    }

    fn require_state(&self, allowed: &[WareState], attempted: &'static str) -> EngineResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(EngineError::Lifecycle { ware: self.signature.id.clone(), state: self.state, attempted })
        }
    }

    fn setup_error(&self, phase: &'static str, source: fl_ware::WareError) -> EngineError {
        EngineError::SetupHook { ware: self.signature.id.clone(), phase, source }
    }

    /// Run `hook` with an access object bound to `phase`.
    fn call<T>(
        &mut self,
        ctx:   &mut RunContext<'_>,
        phase: Phase,
        hook:  impl FnOnce(&mut dyn Ware, &mut WareAccess<'_>) -> T,
    ) -> T {
        // Explicit field borrows so the borrow checker sees disjoint access.
        let signature = &self.signature;
        let ware = self.ware.as_mut();
        let access = WareAccess::new(
            &signature.id,
            signature.granted(),
            phase,
            ctx.run,
            ctx.env,
            &mut *ctx.world,
            ctx.messages,
        );
        #[cfg(feature = "parallel")]
        let access = access.with_pool(self.pool.as_ref().filter(|_| phase.step().is_some()));
        let mut access = access;
        hook(ware, &mut access)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Bind parameters and settle the worker count, capped by `global_cap`.
    pub fn parameterize(&mut self, global_cap: Option<usize>) -> EngineResult<()> {
        self.require_state(&[WareState::Created], "init_params")?;
        if let Err(e) = self.ware.init_params(&self.params) {
            return Err(self.setup_error("init-params", e));
        }
        if let Some(n) = self.ware.max_threads_hint() {
            self.max_threads = n.max(1);
        }
        if let Some(cap) = global_cap {
            self.max_threads = self.max_threads.min(cap.max(1));
        }

        #[cfg(feature = "parallel")]
        {
            if self.max_threads > 1 {
                let id = self.signature.id.clone();
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(self.max_threads)
                    .thread_name(move |i| format!("{id}-{i}"))
                    .build()
                    .map_err(|e| EngineError::Config(format!("thread pool for `{}`: {e}", self.signature.id)))?;
                self.pool = Some(pool);
            }
        }

        log::debug!("ware {} parameterized ({} thread(s))", self.signature.id, self.max_threads);
        self.state = WareState::Parameterized;
        Ok(())
    }

    pub fn prepare_data(&mut self, ctx: &mut RunContext<'_>) -> EngineResult<()> {
        self.require_state(&[WareState::Parameterized], "prepare_data")?;
        if let Err(e) = self.call(ctx, Phase::Prepare, |w, a| w.prepare_data(a)) {
            return Err(self.setup_error("prepare-data", e));
        }
        self.state = WareState::DataPrepared;
        Ok(())
    }

    pub fn check_consistency(&mut self, ctx: &mut RunContext<'_>) -> EngineResult<()> {
        self.require_state(&[WareState::DataPrepared], "check_consistency")?;
        if let Err(e) = self.call(ctx, Phase::Check, |w, a| w.check_consistency(a)) {
            return Err(EngineError::Inconsistent { ware: self.signature.id.clone(), reason: e.to_string() });
        }
        self.state = WareState::ConsistencyChecked;
        Ok(())
    }

    /// Returns the ware's preferred lead time in seconds.
    pub fn initialize_run(&mut self, ctx: &mut RunContext<'_>) -> EngineResult<u64> {
        self.require_state(&[WareState::ConsistencyChecked], "initialize_run")?;
        let lead = match self.call(ctx, Phase::Initialize, |w, a| w.initialize_run(a)) {
            Ok(lead) => lead,
            Err(e) => return Err(self.setup_error("initialize-run", e)),
        };
        self.state = WareState::RunInitialized;
        Ok(lead)
    }

    /// Run one step.  A hook error becomes an execution error message, not
    /// an `Err`; only an out-of-order call fails here.
    pub fn run_step(&mut self, step: Step, ctx: &mut RunContext<'_>) -> EngineResult<()> {
        self.require_state(&[WareState::RunInitialized, WareState::Stepping], "run_step")?;
        self.state = WareState::Stepping;
        if let Err(e) = self.call(ctx, Phase::Step(step), |w, a| w.run_step(a)) {
            ctx.messages.error(&self.signature.id, None, Some(step), e.to_string());
        }
        Ok(())
    }

    /// Finalize.  Like `run_step`, hook errors are recorded as messages.
    pub fn finalize(&mut self, ctx: &mut RunContext<'_>) -> EngineResult<()> {
        self.require_state(&[WareState::RunInitialized, WareState::Stepping], "finalize_run")?;
        self.state = WareState::Finalized;
        if let Err(e) = self.call(ctx, Phase::Finalize, |w, a| w.finalize_run(a)) {
            ctx.messages.error(&self.signature.id, None, None, e.to_string());
        }
        Ok(())
    }
}

impl fmt::Debug for WareHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WareHost")
            .field("id", &self.signature.id)
            .field("state", &self.state)
            .field("max_threads", &self.max_threads)
            .finish()
    }
}
