//! Per-unit variable time series.
//!
//! # Layout
//!
//! ```text
//! VariableStore.units[slot]  →  UnitVariables
//!                                 "water.depth" → Series { kind: Real, values: [v0, v1, v2] }
//!                                 "runoff"      → Series { kind: Real, values: [v0, v1] }
//! ```
//!
//! `values[n]` is the value at step `n`.  A series never has gaps: the only
//! legal write positions are the existing steps and `values.len()`.
//!
//! Units are indexed by repository slot, so `&mut UnitVariables` of distinct
//! units can be handed to parallel tasks by splitting the slot slice.

use fl_core::{Step, UnitIndex, Value, ValueKind};

use crate::{StoreError, StoreResult};

#[cfg(feature = "fx-hash")]
type NameMap<V> = rustc_hash::FxHashMap<String, V>;
#[cfg(not(feature = "fx-hash"))]
type NameMap<V> = std::collections::HashMap<String, V>;

// ── WritePolicy ───────────────────────────────────────────────────────────────

/// What [`UnitVariables::append`] does with a second write at the same step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WritePolicy {
    /// Fail with [`StoreError::DuplicateWrite`].
    #[default]
    Reject,
    /// Replace the stored value.
    Overwrite,
}

// ── VarLookup ─────────────────────────────────────────────────────────────────

/// Result of reading a variable at a step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum VarLookup<'a> {
    Value(&'a Value),
    /// The variable exists but has no value at that step (yet).
    NoValueYet,
    /// Nothing was ever declared or written under that name.
    Undeclared,
}

impl<'a> VarLookup<'a> {
    pub fn value(self) -> Option<&'a Value> {
        match self {
            VarLookup::Value(v) => Some(v),
            _ => None,
        }
    }
}

// ── Series ────────────────────────────────────────────────────────────────────

/// One typed, gap-free time series.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Series {
    kind:   ValueKind,
    values: Vec<Value>,
}

impl Series {
    fn new(kind: ValueKind) -> Self {
        Self { kind, values: Vec::new() }
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, step: Step) -> Option<&Value> {
        self.values.get(step.index())
    }

    /// Last written step and its value.
    pub fn latest(&self) -> Option<(Step, &Value)> {
        let last = self.values.last()?;
        Some((Step(self.values.len() as u64 - 1), last))
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Step the next append must target.
    pub fn next_step(&self) -> Step {
        Step(self.values.len() as u64)
    }
}

// ── UnitVariables ─────────────────────────────────────────────────────────────

/// All variables of one unit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnitVariables {
    series: NameMap<Series>,
}

impl UnitVariables {
    /// Fix the type of `name` without writing a value.
    ///
    /// Re-declaring with the same kind is a no-op; with another kind it is a
    /// [`StoreError::TypeMismatch`].
    pub fn declare(&mut self, name: &str, kind: ValueKind) -> StoreResult<()> {
        match self.series.get(name) {
            Some(s) if s.kind != kind => Err(mismatch(name, s.kind, kind)),
            Some(_) => Ok(()),
            None => {
                self.series.insert(name.to_owned(), Series::new(kind));
                Ok(())
            }
        }
    }

    /// Write the value of `name` for `step`, which must be the next step of
    /// the series.  A write at an already filled step is governed by
    /// `policy`.
    ///
    /// On error nothing is stored: not even the series type.
    pub fn append(&mut self, name: &str, step: Step, value: Value, policy: WritePolicy) -> StoreResult<()> {
        let slot = self.locate(name, step, value.kind())?;
        if let (Slot::Filled(_), WritePolicy::Reject) = (slot, policy) {
            return Err(StoreError::DuplicateWrite { name: name.to_owned(), step });
        }
        self.write(name, slot, value);
        Ok(())
    }

    /// Replace the value at a past step, or append at the next one.
    pub fn set(&mut self, name: &str, step: Step, value: Value) -> StoreResult<()> {
        let slot = self.locate(name, step, value.kind())?;
        self.write(name, slot, value);
        Ok(())
    }

    /// Where a `kind` value for `step` would go, checked without touching
    /// the store.
    fn locate(&self, name: &str, step: Step, kind: ValueKind) -> StoreResult<Slot> {
        let next = match self.series.get(name) {
            Some(s) if s.kind != kind => return Err(mismatch(name, s.kind, kind)),
            Some(s) => s.next_step(),
            None => Step::ZERO,
        };
        match step.index() {
            s if s < next.index() => Ok(Slot::Filled(s)),
            s if s == next.index() => Ok(Slot::Next),
            _ => Err(StoreError::FutureStep { name: name.to_owned(), step, next }),
        }
    }

    fn write(&mut self, name: &str, slot: Slot, value: Value) {
        let kind = value.kind();
        let series = self.series.entry(name.to_owned()).or_insert_with(|| Series::new(kind));
        match slot {
            Slot::Filled(s) => series.values[s] = value,
            Slot::Next => series.values.push(value),
        }
    }

    pub fn get(&self, name: &str, step: Step) -> VarLookup<'_> {
        match self.series.get(name) {
            None => VarLookup::Undeclared,
            Some(s) => s.get(step).map_or(VarLookup::NoValueYet, VarLookup::Value),
        }
    }

    pub fn latest(&self, name: &str) -> Option<(Step, &Value)> {
        self.series.get(name)?.latest()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    pub fn exists_typed(&self, name: &str, kind: ValueKind) -> bool {
        self.series.get(name).is_some_and(|s| s.kind == kind)
    }

    pub fn series(&self, name: &str) -> Option<&Series> {
        self.series.get(name)
    }

    /// Variable names in unspecified order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Target position of a checked write.
#[derive(Copy, Clone)]
enum Slot {
    Filled(usize),
    Next,
}

fn mismatch(name: &str, expected: ValueKind, got: ValueKind) -> StoreError {
    StoreError::TypeMismatch { name: name.to_owned(), expected, got }
}

// ── VariableStore ─────────────────────────────────────────────────────────────

/// Variables of every unit, indexed by repository slot.
///
/// Grows lazily: a slot without a [`UnitVariables`] entry reads as
/// [`VarLookup::Undeclared`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariableStore {
    units:  Vec<UnitVariables>,
    policy: WritePolicy,
}

impl VariableStore {
    pub fn new(policy: WritePolicy) -> Self {
        Self { units: Vec::new(), policy }
    }

    pub fn policy(&self) -> WritePolicy {
        self.policy
    }

    /// Make sure slots `0..slots` exist.
    pub fn reserve_units(&mut self, slots: usize) {
        if self.units.len() < slots {
            self.units.resize_with(slots, UnitVariables::default);
        }
    }

    pub fn unit(&self, unit: UnitIndex) -> Option<&UnitVariables> {
        self.units.get(unit.index())
    }

    pub fn unit_mut(&mut self, unit: UnitIndex) -> &mut UnitVariables {
        self.reserve_units(unit.index() + 1);
        &mut self.units[unit.index()]
    }

    /// Mutable view of the first `slots` units, for splitting across tasks.
    pub fn slots_mut(&mut self, slots: usize) -> &mut [UnitVariables] {
        self.reserve_units(slots);
        &mut self.units[..slots]
    }

    pub fn declare(&mut self, unit: UnitIndex, name: &str, kind: ValueKind) -> StoreResult<()> {
        self.unit_mut(unit).declare(name, kind)
    }

    pub fn append(&mut self, unit: UnitIndex, name: &str, step: Step, value: Value) -> StoreResult<()> {
        let policy = self.policy;
        self.unit_mut(unit).append(name, step, value, policy)
    }

    pub fn set(&mut self, unit: UnitIndex, name: &str, step: Step, value: Value) -> StoreResult<()> {
        self.unit_mut(unit).set(name, step, value)
    }

    pub fn get(&self, unit: UnitIndex, name: &str, step: Step) -> VarLookup<'_> {
        self.unit(unit).map_or(VarLookup::Undeclared, |u| u.get(name, step))
    }

    pub fn latest(&self, unit: UnitIndex, name: &str) -> Option<(Step, &Value)> {
        self.unit(unit)?.latest(name)
    }

    pub fn exists(&self, unit: UnitIndex, name: &str) -> bool {
        self.unit(unit).is_some_and(|u| u.exists(name))
    }

    pub fn exists_typed(&self, unit: UnitIndex, name: &str, kind: ValueKind) -> bool {
        self.unit(unit).is_some_and(|u| u.exists_typed(name, kind))
    }
}
