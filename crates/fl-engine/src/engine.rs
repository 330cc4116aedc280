//! The `SimulationEngine` and its lifecycle driver.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fl_core::{ExecutionMessages, RunClock, RunDescriptor, RunEnv, Step};
use fl_ware::World;

use crate::{
    EngineConfig, EngineError, EngineResult, HaltPolicy, ModelInstance, RunContext, RunOutcome,
    RunReport, WareHost, WareState,
};

// ── StopHandle ────────────────────────────────────────────────────────────────

/// Cloneable external stop request.
///
/// Checked at the same checkpoints as the fatal flag (before each step and
/// after each ware), so a stop always ends in a clean finalize pass.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ── SimulationEngine ──────────────────────────────────────────────────────────

/// Top-level driver.
///
/// Owns the run period, the unit graph and stores, the message log and the
/// two ordered ware lists.  [`run`](Self::run) walks every ware through
///
/// ```text
/// parameterize → prepare_data → check_consistency → initialize_run
///   → for step in 0..step_count { modeling pass; monitoring pass }
///   → finalize_run
/// ```
///
/// Create via [`EngineBuilder`][crate::EngineBuilder].
pub struct SimulationEngine {
    run:        RunDescriptor,
    env:        RunEnv,
    config:     EngineConfig,
    world:      World,
    messages:   ExecutionMessages,
    /// Simulators, in declared order.
    modeling:   ModelInstance,
    /// Observers, run after the modeling pass with read-only access.
    monitoring: ModelInstance,
    stop:       StopHandle,
    clock:      RunClock,
}

impl SimulationEngine {
    pub(crate) fn new(
        run:        RunDescriptor,
        env:        RunEnv,
        config:     EngineConfig,
        world:      World,
        modeling:   ModelInstance,
        monitoring: ModelInstance,
    ) -> Self {
        let clock = run.make_clock();
        Self {
            run,
            env,
            config,
            world,
            messages: ExecutionMessages::new(),
            modeling,
            monitoring,
            stop: StopHandle::default(),
            clock,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn run_descriptor(&self) -> &RunDescriptor {
        &self.run
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn env(&self) -> &RunEnv {
        &self.env
    }

    /// Graph, variables and events, as left by the last run.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn messages(&self) -> &ExecutionMessages {
        &self.messages
    }

    pub fn modeling(&self) -> &ModelInstance {
        &self.modeling
    }

    pub fn monitoring(&self) -> &ModelInstance {
        &self.monitoring
    }

    /// Handle for requesting a stop from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Step the clock currently points at.
    pub fn current_step(&self) -> Step {
        self.clock.current_step
    }

    // ── Run ───────────────────────────────────────────────────────────────

    /// Drive the whole lifecycle.
    ///
    /// Setup failures (lifecycle order, hook errors, inconsistency, an error
    /// message raised during setup) return `Err` before any step runs.  Once
    /// stepping has started, the run always ends with a finalize pass over
    /// every ware and returns `Ok` with the outcome and all messages.
    pub fn run(&mut self) -> EngineResult<RunReport> {
        log::info!(
            "run {}: {} simulator(s), {} observer(s), {} unit(s)",
            self.run,
            self.modeling.len(),
            self.monitoring.len(),
            self.world.repository.unit_count(),
        );

        let cap = Some(self.config.thread_cap());
        for host in self.modeling.iter_mut().chain(self.monitoring.iter_mut()) {
            host.parameterize(cap)?;
        }
        self.checkpoint("init-params")?;

        let mut lead_times = Vec::new();
        if let Err(e) = self.setup(&mut lead_times) {
            // Wares that already reached RunInitialized still get to release
            // their resources.
            self.finalize_where(|state| state == WareState::RunInitialized);
            return Err(e);
        }

        let outcome = self.step_loop()?;
        let steps_run = match outcome {
            RunOutcome::Completed => self.run.step_count(),
            // The clock moves past `step` only if its passes started.
            RunOutcome::Halted { step } | RunOutcome::Stopped { step } => {
                if self.clock.current_step > step { step.0 + 1 } else { step.0 }
            }
        };

        log::info!("finalizing after {steps_run} step(s)");
        self.finalize_where(|_| true);

        if log::log_enabled!(log::Level::Trace) {
            for unit in self.world.repository.units() {
                let timeline = self.world.events.timeline(unit.index()).filter(|t| !t.is_empty());
                if let Some(timeline) = timeline {
                    timeline.dump(&unit.key().to_string());
                }
            }
        }

        let report = RunReport {
            outcome,
            steps_run,
            lead_times,
            messages: self.messages.snapshot(),
        };
        log::info!(
            "run {} ({} warning(s), {} error(s))",
            report.outcome,
            report.warning_count(),
            report.error_count(),
        );
        Ok(report)
    }

    /// The three setup phases, each followed by a fatal-flag checkpoint.
    fn setup(&mut self, lead_times: &mut Vec<(String, u64)>) -> EngineResult<()> {
        self.setup_phase("prepare-data", |host, ctx| host.prepare_data(ctx))?;
        self.setup_phase("check-consistency", |host, ctx| host.check_consistency(ctx))?;
        self.setup_phase("initialize-run", |host, ctx| {
            let lead = host.initialize_run(ctx)?;
            log::debug!("ware {} prefers a lead time of {lead}s", host.id());
            lead_times.push((host.id().to_owned(), lead));
            Ok(())
        })
    }

    /// Run `hook` on every ware, simulators first, then fail if it raised an
    /// error message.
    fn setup_phase<F>(&mut self, phase: &'static str, mut hook: F) -> EngineResult<()>
    where
        F: FnMut(&mut WareHost, &mut RunContext<'_>) -> EngineResult<()>,
    {
        log::info!("{phase}");
        {
            // Explicit field borrows so the borrow checker sees disjoint access.
            let Self { run, env, world, messages, modeling, monitoring, .. } = self;
            let mut ctx = RunContext { run: &*run, env: &*env, world: &mut *world, messages: &*messages };
            for host in modeling.iter_mut().chain(monitoring.iter_mut()) {
                hook(host, &mut ctx)?;
                resort(&mut ctx);
            }
        }
        self.checkpoint(phase)
    }

    fn checkpoint(&self, phase: &'static str) -> EngineResult<()> {
        if self.messages.is_fatal() {
            return Err(EngineError::FatalDuringSetup { phase });
        }
        Ok(())
    }

    /// Step until the end of the period, a fatal error or a stop request.
    fn step_loop(&mut self) -> EngineResult<RunOutcome> {
        log::info!("stepping through {} step(s)", self.run.step_count());
        while self.clock.current_step < self.run.end_step() {
            let step = self.clock.current_step;
            if self.stop.is_stop_requested() {
                log::info!("stop requested before {step}");
                return Ok(RunOutcome::Stopped { step });
            }

            let interrupted = self.step_once(step)?;
            self.clock.advance();
            if let Some(outcome) = interrupted {
                return Ok(outcome);
            }
        }
        Ok(RunOutcome::Completed)
    }

    /// One modeling pass then one monitoring pass.
    ///
    /// The fatal flag and the stop request are polled after every ware.
    /// Under [`HaltPolicy::Immediate`] the first hit ends the step there;
    /// under [`HaltPolicy::CompleteStep`] the remaining wares of the step
    /// still run.
    fn step_once(&mut self, step: Step) -> EngineResult<Option<RunOutcome>> {
        log::debug!("{step} at {}", self.clock.current_datetime());
        let policy = self.config.halt_policy;

        let Self { run, env, world, messages, modeling, monitoring, stop, .. } = self;
        let mut ctx = RunContext { run: &*run, env: &*env, world: &mut *world, messages: &*messages };

        let mut interrupted = None;
        for host in modeling.iter_mut().chain(monitoring.iter_mut()) {
            host.run_step(step, &mut ctx)?;
            resort(&mut ctx);

            if interrupted.is_none() {
                if ctx.messages.is_fatal() {
                    log::info!("execution error raised by {} at {step}, halting", host.id());
                    interrupted = Some(RunOutcome::Halted { step });
                } else if stop.is_stop_requested() {
                    log::info!("stop requested during {step}");
                    interrupted = Some(RunOutcome::Stopped { step });
                }
            }
            if interrupted.is_some() && policy == HaltPolicy::Immediate {
                break;
            }
        }
        Ok(interrupted)
    }

    /// Finalize every ware whose state passes `filter`, in declared order.
    ///
    /// Hook failures are recorded as messages; a ware in a state that cannot
    /// be finalized is skipped.
    fn finalize_where(&mut self, filter: impl Fn(WareState) -> bool) {
        let Self { run, env, world, messages, modeling, monitoring, .. } = self;
        let mut ctx = RunContext { run: &*run, env: &*env, world: &mut *world, messages: &*messages };
        for host in modeling.iter_mut().chain(monitoring.iter_mut()) {
            if !filter(host.state()) {
                continue;
            }
            if let Err(e) = host.finalize(&mut ctx) {
                log::debug!("skipping finalize: {e}");
            }
        }
    }
}

/// Re-sort process order after a hook that moved or added units.
fn resort(ctx: &mut RunContext<'_>) {
    if ctx.world.repository.is_order_dirty() {
        ctx.world.repository.sort_by_process_order();
    }
}

impl std::fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("run", &self.run)
            .field("config", &self.config)
            .field("modeling", &self.modeling)
            .field("monitoring", &self.monitoring)
            .field("current_step", &self.clock.current_step)
            .finish()
    }
}
