//! End-of-run summary.

use std::fmt;

use fl_core::{Message, Severity, Step};

/// How the step loop ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step ran.
    Completed,
    /// An execution error stopped the run during `step`.
    Halted { step: Step },
    /// An external stop request was honoured before or during `step`.
    Stopped { step: Step },
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed       => f.write_str("completed"),
            RunOutcome::Halted { step }  => write!(f, "halted at {step}"),
            RunOutcome::Stopped { step } => write!(f, "stopped at {step}"),
        }
    }
}

/// Returned by [`SimulationEngine::run`][crate::SimulationEngine::run].
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub outcome:    RunOutcome,
    /// Steps whose modeling pass started.
    pub steps_run:  u64,
    /// `(ware id, preferred lead seconds)` from `initialize_run`, in model
    /// order.
    pub lead_times: Vec<(String, u64)>,
    /// Every warning and error, in emission order.
    pub messages:   Vec<Message>,
}

impl RunReport {
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    fn count(&self, severity: Severity) -> usize {
        self.messages.iter().filter(|m| m.severity == severity).count()
    }

    /// Completed with no error messages.
    pub fn is_success(&self) -> bool {
        self.outcome == RunOutcome::Completed && self.error_count() == 0
    }

    pub fn errors(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| m.severity == Severity::Error)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "run {} after {} step(s): {} warning(s), {} error(s)",
            self.outcome,
            self.steps_run,
            self.warning_count(),
            self.error_count(),
        )?;
        for message in &self.messages {
            writeln!(f, "  {message}")?;
        }
        Ok(())
    }
}
