//! Per-unit discrete event timelines.
//!
//! A timeline is kept sorted by timestamp at all times.  Insertion goes
//! after every event strictly earlier than the new one and before the first
//! event at the same time or later, so among equal timestamps the most recent
//! insertion comes first:
//!
//! ```text
//! insert a@10, b@20, c@10   →   [c@10, a@10, b@20]
//! ```

use std::collections::BTreeMap;
use std::fmt;

use fl_core::{DateTime, UnitIndex, Value};

// ── Event ─────────────────────────────────────────────────────────────────────

/// A timestamped bag of named values.  Immutable once inserted.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    datetime: DateTime,
    info:     BTreeMap<String, Value>,
}

impl Event {
    pub fn new(datetime: DateTime) -> Self {
        Self { datetime, info: BTreeMap::new() }
    }

    /// Builder-style info entry.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.info.insert(key.to_owned(), value.into());
        self
    }

    pub fn datetime(&self) -> DateTime {
        self.datetime
    }

    pub fn info(&self, key: &str) -> Option<&Value> {
        self.info.get(key)
    }

    pub fn infos(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.info.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.datetime)?;
        for (k, v) in &self.info {
            write!(f, " {k}={v}")?;
        }
        Ok(())
    }
}

// ── EventTimeline ─────────────────────────────────────────────────────────────

/// Events of one unit in non-decreasing timestamp order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EventTimeline {
    events: Vec<Event>,
}

impl EventTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, event: Event) {
        let at = self.events.partition_point(|e| e.datetime < event.datetime);
        self.events.insert(at, event);
    }

    /// Events with `begin <= datetime <= end`, same relative order.
    pub fn between(&self, begin: DateTime, end: DateTime) -> EventTimeline {
        let lo = self.events.partition_point(|e| e.datetime < begin);
        let hi = self.events.partition_point(|e| e.datetime <= end);
        let events = if lo < hi { self.events[lo..hi].to_vec() } else { Vec::new() };
        EventTimeline { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    /// Emit every event at `trace` level.
    pub fn dump(&self, label: &str) {
        log::trace!("timeline {label}: {} event(s)", self.events.len());
        for event in &self.events {
            log::trace!("  {event}");
        }
    }
}

impl fmt::Display for EventTimeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, event) in self.events.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{event}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a EventTimeline {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

// ── EventStore ────────────────────────────────────────────────────────────────

/// Timelines of every unit, indexed by repository slot.  Grows lazily.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventStore {
    timelines: Vec<EventTimeline>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve_units(&mut self, slots: usize) {
        if self.timelines.len() < slots {
            self.timelines.resize_with(slots, EventTimeline::default);
        }
    }

    pub fn insert(&mut self, unit: UnitIndex, event: Event) {
        self.timeline_mut(unit).insert(event);
    }

    pub fn timeline(&self, unit: UnitIndex) -> Option<&EventTimeline> {
        self.timelines.get(unit.index())
    }

    pub fn timeline_mut(&mut self, unit: UnitIndex) -> &mut EventTimeline {
        self.reserve_units(unit.index() + 1);
        &mut self.timelines[unit.index()]
    }

    /// Mutable view of the first `slots` timelines, for splitting across tasks.
    pub fn slots_mut(&mut self, slots: usize) -> &mut [EventTimeline] {
        self.reserve_units(slots);
        &mut self.timelines[..slots]
    }

    /// Events of `unit` in `[begin, end]`; empty for units without events.
    pub fn between(&self, unit: UnitIndex, begin: DateTime, end: DateTime) -> EventTimeline {
        self.timeline(unit).map_or_else(EventTimeline::new, |t| t.between(begin, end))
    }

    /// Total number of events across all units.
    pub fn total(&self) -> usize {
        self.timelines.iter().map(EventTimeline::len).sum()
    }
}
