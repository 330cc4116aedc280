//! Simulation time model.
//!
//! # Design
//!
//! Simulated time advances in whole steps of a fixed duration.  The mapping
//! to calendar time is held by the [`RunDescriptor`]:
//!
//!   datetime(step) = begin + step * step_secs
//!
//! Timestamps are plain seconds since the Unix epoch ([`DateTime`]), so all
//! arithmetic is exact and comparisons are O(1).  Calendar formatting is left
//! to the application.

use std::fmt;

use crate::{CoreError, CoreResult};

// ── DateTime ──────────────────────────────────────────────────────────────────

/// An absolute timestamp in seconds since the Unix epoch.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DateTime(pub i64);

impl DateTime {
    /// `true` if `begin <= self <= end` (both bounds inclusive).
    #[inline]
    pub fn is_between(self, begin: DateTime, end: DateTime) -> bool {
        begin <= self && self <= end
    }

    /// Seconds elapsed from `earlier` to `self` (negative if `earlier` is later).
    #[inline]
    pub fn diff_secs(self, earlier: DateTime) -> i64 {
        self.0 - earlier.0
    }
}

impl std::ops::Add<u64> for DateTime {
    type Output = DateTime;
    #[inline]
    fn add(self, secs: u64) -> DateTime {
        DateTime(self.0 + secs as i64)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

// ── Step ──────────────────────────────────────────────────────────────────────

/// Zero-based time step index within a run.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step(pub u64);

impl Step {
    pub const ZERO: Step = Step(0);

    /// Cast to `usize` for indexing into a per-variable value `Vec`.
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn next(self) -> Step {
        Step(self.0 + 1)
    }
}

impl std::ops::Add<u64> for Step {
    type Output = Step;
    #[inline]
    fn add(self, rhs: u64) -> Step {
        Step(self.0 + rhs)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

// ── RunDescriptor ─────────────────────────────────────────────────────────────

/// The run period and time-step length.
///
/// Built once through [`RunDescriptor::new`], which validates the period;
/// fields are private so a filled descriptor cannot change for the rest of
/// the run.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunDescriptor {
    begin:      DateTime,
    end:        DateTime,
    step_secs:  u64,
    step_count: u64,
}

impl RunDescriptor {
    /// Validate and fill a descriptor.
    ///
    /// Fails if `begin >= end` or `step_secs == 0`.  The step count is
    /// `ceil((end - begin) / step_secs)`.
    pub fn new(begin: DateTime, end: DateTime, step_secs: u64) -> CoreResult<Self> {
        if begin >= end {
            return Err(CoreError::EmptyPeriod { begin: begin.0, end: end.0 });
        }
        if step_secs == 0 {
            return Err(CoreError::StepDuration(step_secs));
        }
        let span = end.diff_secs(begin) as u64;
        Ok(Self {
            begin,
            end,
            step_secs,
            step_count: span.div_ceil(step_secs),
        })
    }

    pub fn begin(&self) -> DateTime {
        self.begin
    }

    pub fn end(&self) -> DateTime {
        self.end
    }

    pub fn step_secs(&self) -> u64 {
        self.step_secs
    }

    /// Number of steps in the run.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Exclusive upper bound of the step range.
    #[inline]
    pub fn end_step(&self) -> Step {
        Step(self.step_count)
    }

    /// Timestamp at the start of `step`.
    #[inline]
    pub fn datetime_at(&self, step: Step) -> DateTime {
        self.begin + step.0 * self.step_secs
    }

    /// Construct a [`RunClock`] positioned at step 0.
    pub fn make_clock(&self) -> RunClock {
        RunClock::new(self.begin, self.step_secs)
    }
}

impl fmt::Display for RunDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {} every {}s ({} steps)",
            self.begin, self.end, self.step_secs, self.step_count
        )
    }
}

// ── RunClock ──────────────────────────────────────────────────────────────────

/// Tracks the current step and converts it to a timestamp.
#[derive(Clone, Debug)]
pub struct RunClock {
    pub begin:        DateTime,
    pub step_secs:    u64,
    pub current_step: Step,
}

impl RunClock {
    pub fn new(begin: DateTime, step_secs: u64) -> Self {
        Self { begin, step_secs, current_step: Step::ZERO }
    }

    /// Advance the clock by one step.
    #[inline]
    pub fn advance(&mut self) {
        self.current_step = self.current_step.next();
    }

    /// Elapsed simulated seconds since the beginning of the run.
    #[inline]
    pub fn elapsed_secs(&self) -> u64 {
        self.current_step.0 * self.step_secs
    }

    /// Timestamp at the start of the current step.
    #[inline]
    pub fn current_datetime(&self) -> DateTime {
        self.begin + self.elapsed_secs()
    }

    /// Break elapsed time into (day, hour, minute) components.
    pub fn elapsed_dhm(&self) -> (u64, u32, u32) {
        let total_secs = self.elapsed_secs();
        let days = total_secs / 86_400;
        let hours = ((total_secs % 86_400) / 3_600) as u32;
        let minutes = ((total_secs % 3_600) / 60) as u32;
        (days, hours, minutes)
    }
}

impl fmt::Display for RunClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (d, h, m) = self.elapsed_dhm();
        write!(f, "{} (day {} {:02}:{:02})", self.current_step, d, h, m)
    }
}
