//! The unit repository.
//!
//! # Data layout
//!
//! Units live in a slot vector indexed by [`UnitIndex`].  Slots are handed
//! out in declaration order and never reused: deleting a unit leaves a `None`
//! tombstone so that per-unit stores in other crates (variables, events) can
//! stay plain `Vec`s indexed by slot.
//!
//! ```text
//! slots:   [Some(SU#1), Some(SU#2), None, Some(RS#1), …]
//! classes: "RS" → { by_id: {1 → 3}, members: [3], ordered: [3] }
//!          "SU" → { by_id: {1 → 0, 2 → 1}, members: [0, 1], ordered: [1, 0] }
//! ```
//!
//! # Process order
//!
//! [`Repository::sort_by_process_order`] computes the canonical scheduling
//! order: a stable sort of live slots by process order, so ties keep
//! declaration order.  Adding units or changing a process order marks the
//! cached order dirty; the ordered accessors recompute on the fly while it
//! is dirty, and the engine re-sorts after every hook that mutated the graph.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use fl_core::{UnitClass, UnitId, UnitIndex, UnitKey, Value};

use crate::{SpatialError, SpatialResult, Unit};

// ── Per-class bookkeeping ─────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
struct ClassEntry {
    by_id:   HashMap<UnitId, UnitIndex>,
    /// Declaration order.
    members: Vec<UnitIndex>,
    /// Process order; valid only while the repository is not dirty.
    ordered: Vec<UnitIndex>,
}

/// The two directed connection kinds.
#[derive(Copy, Clone, Debug)]
enum Link {
    FromTo,
    ChildParent,
}

impl Link {
    /// List on the source endpoint (`to` of a from-unit, `parents` of a child).
    fn outgoing(self, unit: &mut Unit) -> &mut Vec<UnitIndex> {
        match self {
            Link::FromTo      => &mut unit.to,
            Link::ChildParent => &mut unit.parents,
        }
    }

    /// List on the target endpoint (`from` of a to-unit, `children` of a parent).
    fn incoming(self, unit: &mut Unit) -> &mut Vec<UnitIndex> {
        match self {
            Link::FromTo      => &mut unit.from,
            Link::ChildParent => &mut unit.children,
        }
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

/// Owns every unit and every connection of the spatial graph.
#[derive(Clone, Debug, Default)]
pub struct Repository {
    slots:       Vec<Option<Unit>>,
    classes:     BTreeMap<UnitClass, ClassEntry>,
    ordered:     Vec<UnitIndex>,
    order_dirty: bool,
    live:        usize,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Units ─────────────────────────────────────────────────────────────

    /// Create a unit and return its slot.
    ///
    /// Fails with [`SpatialError::AlreadyExists`] if `(class, id)` is taken;
    /// the existing unit is left untouched.
    pub fn add_unit(&mut self, class: &str, id: UnitId, process_order: i32) -> SpatialResult<UnitIndex> {
        if self.index_of(class, id).is_some() {
            return Err(SpatialError::AlreadyExists(UnitKey { class: class.into(), id }));
        }

        // Reuse the map's Arc so every key of a class shares one allocation.
        let class_name = match self.classes.get_key_value(class) {
            Some((name, _)) => name.clone(),
            None => UnitClass::new(class),
        };

        let index = UnitIndex(self.slots.len() as u32);
        let entry = self.classes.entry(class_name.clone()).or_default();
        entry.by_id.insert(id, index);
        entry.members.push(index);

        self.slots.push(Some(Unit::new(UnitKey { class: class_name, id }, index, process_order)));
        self.live += 1;
        self.order_dirty = true;
        Ok(index)
    }

    /// Delete a unit together with every connection touching it.
    ///
    /// The slot becomes a tombstone and is never reassigned.
    pub fn remove_unit(&mut self, key: &UnitKey) -> SpatialResult<()> {
        let index = self.resolve(key)?;
        let Some(unit) = self.slots[index.index()].take() else {
            return Err(SpatialError::UnknownUnit(key.clone()));
        };

        for &other in &unit.to {
            self.detach(other, index, |u| &mut u.from);
        }
        for &other in &unit.from {
            self.detach(other, index, |u| &mut u.to);
        }
        for &other in &unit.parents {
            self.detach(other, index, |u| &mut u.children);
        }
        for &other in &unit.children {
            self.detach(other, index, |u| &mut u.parents);
        }

        if let Some(entry) = self.classes.get_mut(key.class.as_str()) {
            entry.by_id.remove(&key.id);
            entry.members.retain(|&i| i != index);
            entry.ordered.retain(|&i| i != index);
            if entry.members.is_empty() {
                self.classes.remove(key.class.as_str());
            }
        }
        self.ordered.retain(|&i| i != index);
        self.live -= 1;
        log::debug!("removed unit {key} from slot {}", index.0);
        Ok(())
    }

    fn detach(&mut self, at: UnitIndex, gone: UnitIndex, list: impl Fn(&mut Unit) -> &mut Vec<UnitIndex>) {
        if let Some(unit) = self.live_mut(at) {
            list(unit).retain(|&i| i != gone);
        }
    }

    /// Change the process order of a unit.  Marks the cached order dirty.
    pub fn set_process_order(&mut self, key: &UnitKey, order: i32) -> SpatialResult<()> {
        let index = self.resolve(key)?;
        if let Some(unit) = self.live_mut(index) {
            unit.set_process_order(order);
        }
        self.order_dirty = true;
        Ok(())
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    /// Slot of `(class, id)`, or `None` if no such unit exists.
    pub fn index_of(&self, class: &str, id: UnitId) -> Option<UnitIndex> {
        self.classes.get(class)?.by_id.get(&id).copied()
    }

    /// Like [`index_of`](Self::index_of) but reports absence as an error.
    pub fn resolve(&self, key: &UnitKey) -> SpatialResult<UnitIndex> {
        self.index_of(key.class.as_str(), key.id)
            .ok_or_else(|| SpatialError::UnknownUnit(key.clone()))
    }

    pub fn find(&self, class: &str, id: UnitId) -> Option<&Unit> {
        self.index_of(class, id).and_then(|i| self.unit(i))
    }

    pub fn get(&self, key: &UnitKey) -> Option<&Unit> {
        self.find(key.class.as_str(), key.id)
    }

    /// The live unit in `index`, or `None` for tombstones and out-of-range slots.
    #[inline]
    pub fn unit(&self, index: UnitIndex) -> Option<&Unit> {
        self.slots.get(index.index()).and_then(Option::as_ref)
    }

    fn live_mut(&mut self, index: UnitIndex) -> Option<&mut Unit> {
        self.slots.get_mut(index.index()).and_then(Option::as_mut)
    }

    /// Number of live units.
    pub fn unit_count(&self) -> usize {
        self.live
    }

    /// Number of slots ever assigned, tombstones included.  Per-unit stores
    /// size themselves to this.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn class_exists(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    pub fn class_unit_count(&self, class: &str) -> usize {
        self.classes.get(class).map_or(0, |e| e.members.len())
    }

    pub fn classes(&self) -> impl Iterator<Item = &UnitClass> {
        self.classes.keys()
    }

    /// Units of `class` in declaration order.
    pub fn units_of_class<'a>(&'a self, class: &str) -> impl Iterator<Item = &'a Unit> + use<'a> {
        let members: &'a [UnitIndex] = self.classes.get(class).map(|e| e.members.as_slice()).unwrap_or_default();
        members.iter().filter_map(move |&i| self.unit(i))
    }

    /// Every live unit in slot (declaration) order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.slots.iter().filter_map(Option::as_ref)
    }

    // ── Input data ────────────────────────────────────────────────────────

    pub fn input_data(&self, index: UnitIndex, name: &str) -> Option<&Value> {
        self.unit(index)?.input_data.get(name)
    }

    /// Insert or replace an input property; returns the previous value.
    pub fn set_input_data(&mut self, index: UnitIndex, name: &str, value: Value) -> SpatialResult<Option<Value>> {
        let unit = self.live_mut(index).ok_or(SpatialError::UnknownSlot(index))?;
        Ok(unit.input_data.set(name, value))
    }

    // ── Connections ───────────────────────────────────────────────────────

    /// Add a directed `from → to` edge.
    ///
    /// Returns `Ok(false)` if the edge already existed.
    pub fn add_from_to(&mut self, from: &UnitKey, to: &UnitKey) -> SpatialResult<bool> {
        self.link(from, to, Link::FromTo)
    }

    /// Remove a `from → to` edge.  Returns `Ok(false)` if it was not present.
    pub fn remove_from_to(&mut self, from: &UnitKey, to: &UnitKey) -> SpatialResult<bool> {
        self.unlink(from, to, Link::FromTo)
    }

    /// Add a directed `child → parent` edge.
    ///
    /// Returns `Ok(false)` if the edge already existed.
    pub fn add_child_parent(&mut self, child: &UnitKey, parent: &UnitKey) -> SpatialResult<bool> {
        self.link(child, parent, Link::ChildParent)
    }

    /// Remove a `child → parent` edge.  Returns `Ok(false)` if it was not present.
    pub fn remove_child_parent(&mut self, child: &UnitKey, parent: &UnitKey) -> SpatialResult<bool> {
        self.unlink(child, parent, Link::ChildParent)
    }

    fn endpoints(&self, a: &UnitKey, b: &UnitKey) -> SpatialResult<(UnitIndex, UnitIndex)> {
        let ia = self.resolve(a)?;
        let ib = self.resolve(b)?;
        if ia == ib {
            return Err(SpatialError::SelfLoop(a.clone()));
        }
        Ok((ia, ib))
    }

    fn link(&mut self, a: &UnitKey, b: &UnitKey, kind: Link) -> SpatialResult<bool> {
        let (ia, ib) = self.endpoints(a, b)?;
        Ok(self.link_slots(ia, ib, kind))
    }

    fn link_slots(&mut self, ia: UnitIndex, ib: UnitIndex, kind: Link) -> bool {
        let Some(source) = self.live_mut(ia) else { return false };
        let out = kind.outgoing(source);
        if out.contains(&ib) {
            return false;
        }
        out.push(ib);
        if let Some(target) = self.live_mut(ib) {
            kind.incoming(target).push(ia);
        }
        true
    }

    fn unlink(&mut self, a: &UnitKey, b: &UnitKey, kind: Link) -> SpatialResult<bool> {
        let (ia, ib) = self.endpoints(a, b)?;
        let Some(source) = self.live_mut(ia) else { return Ok(false) };
        let out = kind.outgoing(source);
        let Some(pos) = out.iter().position(|&i| i == ib) else {
            return Ok(false);
        };
        out.remove(pos);
        if let Some(target) = self.live_mut(ib) {
            kind.incoming(target).retain(|&i| i != ia);
        }
        Ok(true)
    }

    /// Slot-based bidirectional `from ↔ to` link used by bulk builders.
    pub(crate) fn link_both_ways(&mut self, a: UnitIndex, b: UnitIndex) {
        self.link_slots(a, b, Link::FromTo);
        self.link_slots(b, a, Link::FromTo);
    }

    // ── Connection queries ────────────────────────────────────────────────

    /// `true` if `a → b` exists.
    pub fn is_connected_to(&self, a: &UnitKey, b: &UnitKey) -> bool {
        self.query(a, b, |u| &u.to)
    }

    /// `true` if `b → a` exists.
    pub fn is_connected_from(&self, a: &UnitKey, b: &UnitKey) -> bool {
        self.query(a, b, |u| &u.from)
    }

    /// `true` if `a` is a child of `b`.
    pub fn is_child_of(&self, a: &UnitKey, b: &UnitKey) -> bool {
        self.query(a, b, |u| &u.parents)
    }

    /// `true` if `a` is a parent of `b`.
    pub fn is_parent_of(&self, a: &UnitKey, b: &UnitKey) -> bool {
        self.query(a, b, |u| &u.children)
    }

    fn query(&self, a: &UnitKey, b: &UnitKey, list: impl Fn(&Unit) -> &Vec<UnitIndex>) -> bool {
        match (self.get(a), self.index_of(b.class.as_str(), b.id)) {
            (Some(unit), Some(ib)) => list(unit).contains(&ib),
            _ => false,
        }
    }

    // ── Process order ─────────────────────────────────────────────────────

    /// Recompute the canonical scheduling order (stable sort by process
    /// order; ties keep declaration order).
    pub fn sort_by_process_order(&mut self) {
        self.ordered = self.compute_order(None);
        for entry in self.classes.values_mut() {
            entry.ordered.clear();
        }
        for &index in &self.ordered {
            if let Some(unit) = self.slots[index.index()].as_ref() {
                if let Some(entry) = self.classes.get_mut(unit.class().as_str()) {
                    entry.ordered.push(index);
                }
            }
        }
        self.order_dirty = false;
    }

    /// `true` when units were added or reordered since the last sort.
    pub fn is_order_dirty(&self) -> bool {
        self.order_dirty
    }

    /// All live units in process order.
    pub fn units_in_process_order(&self) -> Cow<'_, [UnitIndex]> {
        if self.order_dirty {
            Cow::Owned(self.compute_order(None))
        } else {
            Cow::Borrowed(&self.ordered)
        }
    }

    /// Units of `class` in process order.  Empty for unknown classes.
    pub fn class_in_process_order(&self, class: &str) -> Cow<'_, [UnitIndex]> {
        match self.classes.get(class) {
            None => Cow::Borrowed(&[]),
            Some(_) if self.order_dirty => Cow::Owned(self.compute_order(Some(class))),
            Some(entry) => Cow::Borrowed(&entry.ordered),
        }
    }

    fn compute_order(&self, class: Option<&str>) -> Vec<UnitIndex> {
        let mut units: Vec<&Unit> = match class {
            Some(c) => self.units_of_class(c).collect(),
            None => self.units().collect(),
        };
        // `sort_by_key` is stable; slots are already in declaration order.
        units.sort_by_key(|u| u.process_order());
        units.into_iter().map(Unit::index).collect()
    }
}
