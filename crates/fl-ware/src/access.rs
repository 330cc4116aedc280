//! Capability-scoped access to the simulation state.
//!
//! Every hook after `init_params` receives a [`WareAccess`].  Reads are
//! inherent methods or go through [`WareAccess::graph`]; writes are split
//! into orthogonal capability traits so a ware only calls what it declared:
//!
//! | Trait               | Capability        | Allowed phases                   |
//! |---------------------|-------------------|----------------------------------|
//! | [`GraphAccess`]     | `GRAPH_MUTATE`    | any                              |
//! | [`VariableAccess`]  | `VARIABLES_WRITE` | declare: not finalize; write: step |
//! | [`EventAccess`]     | `EVENTS_WRITE`    | any but finalize                 |
//! | [`InputDataAccess`] | `INPUT_WRITE`     | prepare, check, initialize       |
//! | [`MessageAccess`]   | none              | any                              |
//!
//! Variable writes are confined to the current step: `append_variable`
//! targets it, `set_variable` may back-fill any step up to it.
//!
//! # Per-unit loops
//!
//! [`WareAccess::for_each_unit`] walks a class in process order on the
//! driving thread with full access.  [`WareAccess::par_for_each_unit`] hands
//! each unit a [`UnitScope`] holding `&mut` to that unit's own variables and
//! events only, with the graph borrowed immutably, and may run them on the
//! ware's thread pool.

use std::io::BufWriter;
use std::path::Path;

use fl_core::{
    DateTime, ExecutionMessages, RunDescriptor, RunEnv, Severity, Step, UnitId, UnitIndex, UnitKey, Value,
    ValueKind,
};
use fl_spatial::{Repository, SpatialError};
use fl_store::{Event, EventStore, EventTimeline, VarLookup, VariableStore, WritePolicy};

use crate::scope::{ScopeOutcome, UnitScope};
use crate::{AccessError, AccessResult, Capabilities, Phase, WareResult};

// ── World ─────────────────────────────────────────────────────────────────────

/// The mutable simulation state shared by all wares of a run.
#[derive(Clone, Debug, Default)]
pub struct World {
    pub repository: Repository,
    pub variables:  VariableStore,
    pub events:     EventStore,
}

impl World {
    pub fn new(repository: Repository, policy: WritePolicy) -> Self {
        let slots = repository.slot_count();
        let mut variables = VariableStore::new(policy);
        variables.reserve_units(slots);
        let mut events = EventStore::new();
        events.reserve_units(slots);
        Self { repository, variables, events }
    }
}

// ── AccessRules ───────────────────────────────────────────────────────────────

/// Who is asking, with which capabilities, in which phase.
#[derive(Copy, Clone, Debug)]
pub(crate) struct AccessRules<'a> {
    pub(crate) ware:  &'a str,
    pub(crate) caps:  Capabilities,
    pub(crate) phase: Phase,
    pub(crate) run:   &'a RunDescriptor,
}

impl AccessRules<'_> {
    pub(crate) fn require(&self, need: Capabilities) -> AccessResult<()> {
        if self.caps.contains(need) {
            Ok(())
        } else {
            Err(AccessError::CapabilityDenied { ware: self.ware.to_owned(), missing: need })
        }
    }

    fn wrong_phase(&self, what: &'static str) -> AccessError {
        AccessError::WrongPhase { what, phase: self.phase }
    }

    pub(crate) fn not_finalizing(&self, what: &'static str) -> AccessResult<()> {
        match self.phase {
            Phase::Finalize => Err(self.wrong_phase(what)),
            _ => Ok(()),
        }
    }

    pub(crate) fn setup_only(&self, what: &'static str) -> AccessResult<()> {
        if self.phase.is_setup() { Ok(()) } else { Err(self.wrong_phase(what)) }
    }

    pub(crate) fn current_step(&self, what: &'static str) -> AccessResult<Step> {
        self.phase.step().ok_or_else(|| self.wrong_phase(what))
    }

    /// `step` must not be past the current step.
    pub(crate) fn backfill_step(&self, name: &str, step: Step) -> AccessResult<()> {
        let current = self.current_step("writing a variable")?;
        if step > current {
            return Err(AccessError::OutsideWindow { name: name.to_owned(), step, current });
        }
        Ok(())
    }

    pub(crate) fn current_datetime(&self) -> Option<DateTime> {
        self.phase.step().map(|s| self.run.datetime_at(s))
    }
}

// ── WareAccess ────────────────────────────────────────────────────────────────

/// The view of the simulation state handed to one ware hook.
pub struct WareAccess<'a> {
    rules:    AccessRules<'a>,
    env:      &'a RunEnv,
    world:    &'a mut World,
    messages: &'a ExecutionMessages,
    #[cfg(feature = "parallel")]
    pool:     Option<&'a rayon::ThreadPool>,
}

impl<'a> WareAccess<'a> {
    pub fn new(
        ware:     &'a str,
        caps:     Capabilities,
        phase:    Phase,
        run:      &'a RunDescriptor,
        env:      &'a RunEnv,
        world:    &'a mut World,
        messages: &'a ExecutionMessages,
    ) -> Self {
        Self {
            rules: AccessRules { ware, caps, phase, run },
            env,
            world,
            messages,
            #[cfg(feature = "parallel")]
            pool: None,
        }
    }

    /// Thread pool used by [`par_for_each_unit`](Self::par_for_each_unit).
    #[cfg(feature = "parallel")]
    pub fn with_pool(mut self, pool: Option<&'a rayon::ThreadPool>) -> Self {
        self.pool = pool;
        self
    }

    pub fn ware_id(&self) -> &str {
        self.rules.ware
    }

    pub fn phase(&self) -> Phase {
        self.rules.phase
    }

    pub fn capabilities(&self) -> Capabilities {
        self.rules.caps
    }

    /// `Some` only while stepping.
    pub fn current_step(&self) -> Option<Step> {
        self.rules.phase.step()
    }

    pub fn current_datetime(&self) -> Option<DateTime> {
        self.rules.current_datetime()
    }

    pub fn run(&self) -> &RunDescriptor {
        self.rules.run
    }

    pub fn env(&self) -> &RunEnv {
        self.env
    }

    pub fn env_string(&self, key: &str) -> Option<&str> {
        self.env.get(key)
    }

    pub fn env_bool(&self, key: &str) -> Option<bool> {
        self.env.get_bool(key)
    }

    /// Workers available to `par_for_each_unit`.  Always 1 outside the step
    /// phase.
    pub fn max_threads(&self) -> usize {
        #[cfg(feature = "parallel")]
        {
            if let Some(pool) = self.step_pool() {
                return pool.current_num_threads();
            }
        }
        1
    }

    /// The pool, but only while stepping: setup and finalize loops stay on
    /// the driving thread.
    #[cfg(feature = "parallel")]
    fn step_pool(&self) -> Option<&'a rayon::ThreadPool> {
        self.pool.filter(|_| self.rules.phase.step().is_some())
    }

    pub fn graph(&self) -> &Repository {
        &self.world.repository
    }

    pub fn variables(&self) -> &VariableStore {
        &self.world.variables
    }

    pub fn events(&self) -> &EventStore {
        &self.world.events
    }

    fn live(&self, unit: UnitIndex) -> AccessResult<()> {
        match self.world.repository.unit(unit) {
            Some(_) => Ok(()),
            None => Err(SpatialError::UnknownSlot(unit).into()),
        }
    }

    // ── Per-unit loops ────────────────────────────────────────────────────

    /// Call `f` for every live unit of `class` in process order.  Stops at
    /// the first error.
    pub fn for_each_unit<F>(&mut self, class: &str, mut f: F) -> WareResult<()>
    where
        F: FnMut(&mut Self, UnitIndex) -> WareResult<()>,
    {
        let order = self.world.repository.class_in_process_order(class).into_owned();
        for unit in order {
            // An earlier call may have removed it.
            if self.world.repository.unit(unit).is_some() {
                f(self, unit)?;
            }
        }
        Ok(())
    }

    /// Call `f` once per live unit of `class`, possibly in parallel.
    ///
    /// Only `run_step` fans out; in every other phase the units run one after
    /// the other on the driving thread.
    ///
    /// Each call gets a [`UnitScope`] restricted to its own unit.  Messages
    /// raised through the scope, and any `Err` returned by `f`, are recorded
    /// after the join in process order with the unit key as source, so the
    /// message log does not depend on thread scheduling.  Returns the number
    /// of units whose call failed.
    pub fn par_for_each_unit<F>(&mut self, class: &str, f: F) -> usize
    where
        F: Fn(&mut UnitScope<'_>) -> WareResult<()> + Sync + Send,
    {
        let rules = self.rules;
        #[cfg(feature = "parallel")]
        let pool = self.step_pool();
        // Explicit field borrows so the borrow checker sees disjoint access.
        let World { repository, variables, events } = &mut *self.world;
        let graph: &Repository = repository;
        let policy = variables.policy();
        let slots = graph.slot_count();

        let mut cells: Vec<_> = variables
            .slots_mut(slots)
            .iter_mut()
            .zip(events.slots_mut(slots).iter_mut())
            .map(Some)
            .collect();

        let scopes: Vec<UnitScope<'_>> = graph
            .class_in_process_order(class)
            .iter()
            .filter_map(|&i| {
                let unit = graph.unit(i)?;
                let (vars, timeline) = cells.get_mut(i.index())?.take()?;
                Some(UnitScope::new(unit, graph, vars, timeline, rules, policy))
            })
            .collect();

        let run_one = |mut scope: UnitScope<'_>| {
            let result = f(&mut scope);
            scope.finish(result)
        };

        #[cfg(feature = "parallel")]
        let outcomes: Vec<ScopeOutcome> = match pool {
            Some(pool) => {
                use rayon::prelude::*;
                pool.install(|| scopes.into_par_iter().map(run_one).collect())
            }
            None => scopes.into_iter().map(run_one).collect(),
        };

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<ScopeOutcome> = scopes.into_iter().map(run_one).collect();

        let step = rules.phase.step();
        let mut failed = 0;
        for outcome in outcomes {
            let source = outcome.key.to_string();
            for (severity, text) in outcome.raised {
                match severity {
                    Severity::Warning => self.messages.warning(rules.ware, Some(&source), step, text),
                    Severity::Error   => self.messages.error(rules.ware, Some(&source), step, text),
                }
            }
            if let Err(e) = outcome.result {
                failed += 1;
                self.messages.error(rules.ware, Some(&source), step, e.to_string());
            }
        }
        failed
    }
}

// ── GraphAccess ───────────────────────────────────────────────────────────────

/// Structural edits of the unit graph.  Driving thread only: a
/// [`UnitScope`] never exposes these.
pub trait GraphAccess {
    fn add_unit(&mut self, class: &str, id: UnitId, process_order: i32) -> AccessResult<UnitIndex>;
    fn remove_unit(&mut self, key: &UnitKey) -> AccessResult<()>;
    fn add_from_to(&mut self, from: &UnitKey, to: &UnitKey) -> AccessResult<bool>;
    fn remove_from_to(&mut self, from: &UnitKey, to: &UnitKey) -> AccessResult<bool>;
    fn add_child_parent(&mut self, child: &UnitKey, parent: &UnitKey) -> AccessResult<bool>;
    fn remove_child_parent(&mut self, child: &UnitKey, parent: &UnitKey) -> AccessResult<bool>;
    fn set_process_order(&mut self, key: &UnitKey, order: i32) -> AccessResult<()>;
    fn build_grid(&mut self, class: &str, rows: u32, cols: u32, process_order: i32) -> AccessResult<Vec<UnitIndex>>;

    /// Write the graph as a Graphviz file.  Needs no capability.
    fn export_dot(&self, path: &Path) -> AccessResult<()>;
}

impl GraphAccess for WareAccess<'_> {
    fn add_unit(&mut self, class: &str, id: UnitId, process_order: i32) -> AccessResult<UnitIndex> {
        self.rules.require(Capabilities::GRAPH_MUTATE)?;
        Ok(self.world.repository.add_unit(class, id, process_order)?)
    }

    fn remove_unit(&mut self, key: &UnitKey) -> AccessResult<()> {
        self.rules.require(Capabilities::GRAPH_MUTATE)?;
        Ok(self.world.repository.remove_unit(key)?)
    }

    fn add_from_to(&mut self, from: &UnitKey, to: &UnitKey) -> AccessResult<bool> {
        self.rules.require(Capabilities::GRAPH_MUTATE)?;
        Ok(self.world.repository.add_from_to(from, to)?)
    }

    fn remove_from_to(&mut self, from: &UnitKey, to: &UnitKey) -> AccessResult<bool> {
        self.rules.require(Capabilities::GRAPH_MUTATE)?;
        Ok(self.world.repository.remove_from_to(from, to)?)
    }

    fn add_child_parent(&mut self, child: &UnitKey, parent: &UnitKey) -> AccessResult<bool> {
        self.rules.require(Capabilities::GRAPH_MUTATE)?;
        Ok(self.world.repository.add_child_parent(child, parent)?)
    }

    fn remove_child_parent(&mut self, child: &UnitKey, parent: &UnitKey) -> AccessResult<bool> {
        self.rules.require(Capabilities::GRAPH_MUTATE)?;
        Ok(self.world.repository.remove_child_parent(child, parent)?)
    }

    fn set_process_order(&mut self, key: &UnitKey, order: i32) -> AccessResult<()> {
        self.rules.require(Capabilities::GRAPH_MUTATE)?;
        Ok(self.world.repository.set_process_order(key, order)?)
    }

    fn build_grid(&mut self, class: &str, rows: u32, cols: u32, process_order: i32) -> AccessResult<Vec<UnitIndex>> {
        self.rules.require(Capabilities::GRAPH_MUTATE)?;
        Ok(self.world.repository.build_grid(class, rows, cols, process_order)?)
    }

    fn export_dot(&self, path: &Path) -> AccessResult<()> {
        let file = std::fs::File::create(path)?;
        self.world.repository.write_dot(BufWriter::new(file))?;
        Ok(())
    }
}

// ── VariableAccess ────────────────────────────────────────────────────────────

pub trait VariableAccess {
    /// Fix the type of a variable before its first value.
    fn declare_variable(&mut self, unit: UnitIndex, name: &str, kind: ValueKind) -> AccessResult<()>;

    /// Write the value for the current step.
    fn append_variable(&mut self, unit: UnitIndex, name: &str, value: impl Into<Value>) -> AccessResult<()>;

    /// Replace or append the value at `step <= current step`.
    fn set_variable(&mut self, unit: UnitIndex, name: &str, step: Step, value: impl Into<Value>) -> AccessResult<()>;

    fn variable(&self, unit: UnitIndex, name: &str, step: Step) -> VarLookup<'_>;

    /// Value at the current step; `NoValueYet` outside stepping.
    fn current_variable(&self, unit: UnitIndex, name: &str) -> VarLookup<'_>;

    fn latest_variable(&self, unit: UnitIndex, name: &str) -> Option<(Step, &Value)>;

    fn variable_exists(&self, unit: UnitIndex, name: &str) -> bool;

    fn variable_exists_typed(&self, unit: UnitIndex, name: &str, kind: ValueKind) -> bool;
}

impl VariableAccess for WareAccess<'_> {
    fn declare_variable(&mut self, unit: UnitIndex, name: &str, kind: ValueKind) -> AccessResult<()> {
        self.rules.require(Capabilities::VARIABLES_WRITE)?;
        self.rules.not_finalizing("declaring a variable")?;
        self.live(unit)?;
        Ok(self.world.variables.declare(unit, name, kind)?)
    }

    fn append_variable(&mut self, unit: UnitIndex, name: &str, value: impl Into<Value>) -> AccessResult<()> {
        self.rules.require(Capabilities::VARIABLES_WRITE)?;
        let step = self.rules.current_step("appending a variable")?;
        self.live(unit)?;
        Ok(self.world.variables.append(unit, name, step, value.into())?)
    }

    fn set_variable(&mut self, unit: UnitIndex, name: &str, step: Step, value: impl Into<Value>) -> AccessResult<()> {
        self.rules.require(Capabilities::VARIABLES_WRITE)?;
        self.rules.backfill_step(name, step)?;
        self.live(unit)?;
        Ok(self.world.variables.set(unit, name, step, value.into())?)
    }

    fn variable(&self, unit: UnitIndex, name: &str, step: Step) -> VarLookup<'_> {
        self.world.variables.get(unit, name, step)
    }

    fn current_variable(&self, unit: UnitIndex, name: &str) -> VarLookup<'_> {
        match self.current_step() {
            Some(step) => self.world.variables.get(unit, name, step),
            None if self.world.variables.exists(unit, name) => VarLookup::NoValueYet,
            None => VarLookup::Undeclared,
        }
    }

    fn latest_variable(&self, unit: UnitIndex, name: &str) -> Option<(Step, &Value)> {
        self.world.variables.latest(unit, name)
    }

    fn variable_exists(&self, unit: UnitIndex, name: &str) -> bool {
        self.world.variables.exists(unit, name)
    }

    fn variable_exists_typed(&self, unit: UnitIndex, name: &str, kind: ValueKind) -> bool {
        self.world.variables.exists_typed(unit, name, kind)
    }
}

// ── EventAccess ───────────────────────────────────────────────────────────────

pub trait EventAccess {
    fn append_event(&mut self, unit: UnitIndex, event: Event) -> AccessResult<()>;

    /// Events of `unit` in `[begin, end]`.
    fn events_between(&self, unit: UnitIndex, begin: DateTime, end: DateTime) -> EventTimeline;
}

impl EventAccess for WareAccess<'_> {
    fn append_event(&mut self, unit: UnitIndex, event: Event) -> AccessResult<()> {
        self.rules.require(Capabilities::EVENTS_WRITE)?;
        self.rules.not_finalizing("appending an event")?;
        self.live(unit)?;
        self.world.events.insert(unit, event);
        Ok(())
    }

    fn events_between(&self, unit: UnitIndex, begin: DateTime, end: DateTime) -> EventTimeline {
        self.world.events.between(unit, begin, end)
    }
}

// ── InputDataAccess ───────────────────────────────────────────────────────────

pub trait InputDataAccess {
    fn input_data(&self, unit: UnitIndex, name: &str) -> Option<&Value>;

    fn input_data_exists(&self, unit: UnitIndex, name: &str) -> bool;

    /// Setup phases only.  Returns the previous value.
    fn set_input_data(&mut self, unit: UnitIndex, name: &str, value: impl Into<Value>) -> AccessResult<Option<Value>>;
}

impl InputDataAccess for WareAccess<'_> {
    fn input_data(&self, unit: UnitIndex, name: &str) -> Option<&Value> {
        self.world.repository.input_data(unit, name)
    }

    fn input_data_exists(&self, unit: UnitIndex, name: &str) -> bool {
        self.input_data(unit, name).is_some()
    }

    fn set_input_data(&mut self, unit: UnitIndex, name: &str, value: impl Into<Value>) -> AccessResult<Option<Value>> {
        self.rules.require(Capabilities::INPUT_WRITE)?;
        self.rules.setup_only("setting input data")?;
        Ok(self.world.repository.set_input_data(unit, name, value.into())?)
    }
}

// ── MessageAccess ─────────────────────────────────────────────────────────────

/// Warnings and errors, tagged with the ware id and the current step.
///
/// Raising an error makes the run fatal: the engine stops stepping after the
/// current ware returns.
pub trait MessageAccess {
    fn raise_warning(&self, text: impl Into<String>);
    fn raise_error(&self, text: impl Into<String>);
    fn raise_warning_from(&self, source: &str, text: impl Into<String>);
    fn raise_error_from(&self, source: &str, text: impl Into<String>);
}

impl MessageAccess for WareAccess<'_> {
    fn raise_warning(&self, text: impl Into<String>) {
        self.messages.warning(self.rules.ware, None, self.current_step(), text);
    }

    fn raise_error(&self, text: impl Into<String>) {
        self.messages.error(self.rules.ware, None, self.current_step(), text);
    }

    fn raise_warning_from(&self, source: &str, text: impl Into<String>) {
        self.messages.warning(self.rules.ware, Some(source), self.current_step(), text);
    }

    fn raise_error_from(&self, source: &str, text: impl Into<String>) {
        self.messages.error(self.rules.ware, Some(source), self.current_step(), text);
    }
}
