//! A spatial unit and its input data.

use std::collections::BTreeMap;

use fl_core::{UnitClass, UnitId, UnitIndex, UnitKey, Value};

// ── InputData ─────────────────────────────────────────────────────────────────

/// Named input properties attached to a unit (areas, slopes, initial
/// conditions, …).
///
/// Populated while the model is built; wares may read it in every phase.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputData {
    values: BTreeMap<String, Value>,
}

impl InputData {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Insert or replace; returns the previous value.
    pub fn set(&mut self, name: &str, value: Value) -> Option<Value> {
        self.values.insert(name.to_owned(), value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ── Unit ──────────────────────────────────────────────────────────────────────

/// One node of the spatial graph.
///
/// Connection lists hold slots of other live units.  They are kept in sync
/// by [`Repository`][crate::Repository]; there is no public way to edit them
/// directly.
#[derive(Clone, Debug)]
pub struct Unit {
    key:           UnitKey,
    index:         UnitIndex,
    process_order: i32,
    pub(crate) from:     Vec<UnitIndex>,
    pub(crate) to:       Vec<UnitIndex>,
    pub(crate) parents:  Vec<UnitIndex>,
    pub(crate) children: Vec<UnitIndex>,
    pub(crate) input_data: InputData,
}

impl Unit {
    pub(crate) fn new(key: UnitKey, index: UnitIndex, process_order: i32) -> Self {
        Self {
            key,
            index,
            process_order,
            from:       Vec::new(),
            to:         Vec::new(),
            parents:    Vec::new(),
            children:   Vec::new(),
            input_data: InputData::default(),
        }
    }

    pub fn key(&self) -> &UnitKey {
        &self.key
    }

    pub fn class(&self) -> &UnitClass {
        &self.key.class
    }

    pub fn id(&self) -> UnitId {
        self.key.id
    }

    /// Repository slot of this unit.
    pub fn index(&self) -> UnitIndex {
        self.index
    }

    pub fn process_order(&self) -> i32 {
        self.process_order
    }

    pub(crate) fn set_process_order(&mut self, order: i32) {
        self.process_order = order;
    }

    /// Units flowing into this one.
    pub fn from_units(&self) -> &[UnitIndex] {
        &self.from
    }

    /// Units this one flows into.
    pub fn to_units(&self) -> &[UnitIndex] {
        &self.to
    }

    pub fn parent_units(&self) -> &[UnitIndex] {
        &self.parents
    }

    pub fn child_units(&self) -> &[UnitIndex] {
        &self.children
    }

    pub fn input_data(&self) -> &InputData {
        &self.input_data
    }
}
