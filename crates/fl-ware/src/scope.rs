//! Per-unit view used inside `par_for_each_unit`.

use fl_core::{DateTime, Severity, Step, UnitIndex, UnitKey, Value, ValueKind};
use fl_spatial::{Repository, Unit};
use fl_store::{Event, EventTimeline, UnitVariables, VarLookup, WritePolicy};

use crate::access::AccessRules;
use crate::{AccessResult, Capabilities, WareResult};

/// Exclusive access to one unit's variables and events plus shared read
/// access to the graph.
///
/// Scopes of distinct units never alias, so they may run on different
/// threads.  Variables of other units are not reachable from here; read
/// them in a sequential [`for_each_unit`][crate::WareAccess::for_each_unit]
/// pass instead.
pub struct UnitScope<'s> {
    unit:     &'s Unit,
    graph:    &'s Repository,
    vars:     &'s mut UnitVariables,
    timeline: &'s mut EventTimeline,
    rules:    AccessRules<'s>,
    policy:   WritePolicy,
    raised:   Vec<(Severity, String)>,
}

/// What a scope leaves behind once its task has run.
pub(crate) struct ScopeOutcome {
    pub(crate) key:    UnitKey,
    pub(crate) raised: Vec<(Severity, String)>,
    pub(crate) result: WareResult<()>,
}

impl<'s> UnitScope<'s> {
    pub(crate) fn new(
        unit:     &'s Unit,
        graph:    &'s Repository,
        vars:     &'s mut UnitVariables,
        timeline: &'s mut EventTimeline,
        rules:    AccessRules<'s>,
        policy:   WritePolicy,
    ) -> Self {
        Self { unit, graph, vars, timeline, rules, policy, raised: Vec::new() }
    }

    pub(crate) fn finish(self, result: WareResult<()>) -> ScopeOutcome {
        ScopeOutcome { key: self.unit.key().clone(), raised: self.raised, result }
    }

    pub fn unit(&self) -> &Unit {
        self.unit
    }

    pub fn index(&self) -> UnitIndex {
        self.unit.index()
    }

    pub fn key(&self) -> &UnitKey {
        self.unit.key()
    }

    pub fn graph(&self) -> &Repository {
        self.graph
    }

    pub fn current_step(&self) -> Option<Step> {
        self.rules.phase.step()
    }

    pub fn current_datetime(&self) -> Option<DateTime> {
        self.rules.current_datetime()
    }

    pub fn input_data(&self, name: &str) -> Option<&Value> {
        self.unit.input_data().get(name)
    }

    // ── Variables ─────────────────────────────────────────────────────────

    pub fn variable(&self, name: &str, step: Step) -> VarLookup<'_> {
        self.vars.get(name, step)
    }

    pub fn latest_variable(&self, name: &str) -> Option<(Step, &Value)> {
        self.vars.latest(name)
    }

    pub fn declare_variable(&mut self, name: &str, kind: ValueKind) -> AccessResult<()> {
        self.rules.require(Capabilities::VARIABLES_WRITE)?;
        self.rules.not_finalizing("declaring a variable")?;
        Ok(self.vars.declare(name, kind)?)
    }

    pub fn append_variable(&mut self, name: &str, value: impl Into<Value>) -> AccessResult<()> {
        self.rules.require(Capabilities::VARIABLES_WRITE)?;
        let step = self.rules.current_step("appending a variable")?;
        Ok(self.vars.append(name, step, value.into(), self.policy)?)
    }

    pub fn set_variable(&mut self, name: &str, step: Step, value: impl Into<Value>) -> AccessResult<()> {
        self.rules.require(Capabilities::VARIABLES_WRITE)?;
        self.rules.backfill_step(name, step)?;
        Ok(self.vars.set(name, step, value.into())?)
    }

    // ── Events ────────────────────────────────────────────────────────────

    pub fn events(&self) -> &EventTimeline {
        self.timeline
    }

    pub fn append_event(&mut self, event: Event) -> AccessResult<()> {
        self.rules.require(Capabilities::EVENTS_WRITE)?;
        self.rules.not_finalizing("appending an event")?;
        self.timeline.insert(event);
        Ok(())
    }

    // ── Messages ──────────────────────────────────────────────────────────

    /// Recorded against this unit once the loop has joined.
    pub fn raise_warning(&mut self, text: impl Into<String>) {
        self.raised.push((Severity::Warning, text.into()));
    }

    pub fn raise_error(&mut self, text: impl Into<String>) {
        self.raised.push((Severity::Error, text.into()));
    }
}
