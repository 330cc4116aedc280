//! Plain data row written by the CSV backend.

use fl_core::{DateTime, Step, UnitKey, Value};

/// One variable value of one unit at one step.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRow<'a> {
    pub step:     Step,
    pub datetime: DateTime,
    pub unit:     &'a UnitKey,
    pub variable: &'a str,
    pub value:    &'a Value,
}
