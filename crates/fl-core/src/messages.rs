//! Run-scoped warning/error aggregation.
//!
//! Wares raise warnings and errors through their access object; the engine
//! polls [`ExecutionMessages::is_fatal`] between wares and between steps.
//! Emission takes `&self` so fanned-out per-unit tasks can report
//! concurrently: records go into a `Mutex<Vec<_>>` in arrival order and the
//! fatal flag is a separate atomic so polling never takes the lock.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::Step;

/// Severity of a [`Message`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error   => f.write_str("ERROR"),
        }
    }
}

/// One warning or error raised during a run.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    pub severity: Severity,
    /// Ware (or engine component) that raised the message.
    pub sender:   String,
    /// Finer-grained origin inside the sender, e.g. a unit key.
    pub source:   Option<String>,
    pub step:     Option<Step>,
    pub text:     String,
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.sender)?;
        if let Some(source) = &self.source {
            write!(f, " ({source})")?;
        }
        if let Some(step) = self.step {
            write!(f, " at {step}")?;
        }
        write!(f, ": {}", self.text)
    }
}

/// Thread-safe, append-only message log with a sticky fatal flag.
#[derive(Default, Debug)]
pub struct ExecutionMessages {
    records: Mutex<Vec<Message>>,
    fatal:   AtomicBool,
}

impl ExecutionMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning.  Never sets the fatal flag.
    pub fn warning(
        &self,
        sender: &str,
        source: Option<&str>,
        step:   Option<Step>,
        text:   impl Into<String>,
    ) {
        self.push(Severity::Warning, sender, source, step, text.into());
    }

    /// Record an error and set the fatal flag.
    pub fn error(
        &self,
        sender: &str,
        source: Option<&str>,
        step:   Option<Step>,
        text:   impl Into<String>,
    ) {
        self.push(Severity::Error, sender, source, step, text.into());
        self.fatal.store(true, Ordering::Release);
    }

    /// `true` once any error has been recorded.  Never reset during a run.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.fatal.load(Ordering::Acquire)
    }

    /// Clone of every message, in emission order.
    pub fn snapshot(&self) -> Vec<Message> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    /// Consume the log, returning every message in emission order.
    pub fn into_messages(self) -> Vec<Message> {
        match self.records.into_inner() {
            Ok(v) => v,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn count(&self, severity: Severity) -> usize {
        self.lock().iter().filter(|m| m.severity == severity).count()
    }

    fn push(
        &self,
        severity: Severity,
        sender:   &str,
        source:   Option<&str>,
        step:     Option<Step>,
        text:     String,
    ) {
        let msg = Message {
            severity,
            sender: sender.to_owned(),
            source: source.map(str::to_owned),
            step,
            text,
        };
        match severity {
            Severity::Warning => log::warn!("{msg}"),
            Severity::Error   => log::error!("{msg}"),
        }
        self.lock().push(msg);
    }

    /// A panicking ware thread must not hide the messages already recorded,
    /// so a poisoned lock is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, Vec<Message>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
