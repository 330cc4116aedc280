//! CSV output backend.
//!
//! One file, one row per (step, unit, variable):
//!
//! ```text
//! step,datetime,unit,variable,value
//! 0,0,SU#1,runoff,0.25
//! ```
//!
//! `datetime` is in seconds; vector and matrix values use the `;` / `|`
//! text form of [`Value`](fl_core::Value).

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::{OutputResult, VariableRow};

pub const HEADER: [&str; 5] = ["step", "datetime", "unit", "variable", "value"];

/// Writes variable rows to a single CSV file.
pub struct CsvWriter {
    out:      Writer<File>,
    rows:     u64,
    finished: bool,
}

impl CsvWriter {
    /// Create (or truncate) `path` and write the header row.
    pub fn new(path: &Path) -> OutputResult<Self> {
        let mut out = Writer::from_path(path)?;
        out.write_record(HEADER)?;
        Ok(Self { out, rows: 0, finished: false })
    }

    pub fn write_row(&mut self, row: &VariableRow<'_>) -> OutputResult<()> {
        self.out.write_record(&[
            row.step.0.to_string(),
            row.datetime.0.to_string(),
            row.unit.to_string(),
            row.variable.to_owned(),
            row.value.to_string(),
        ])?;
        self.rows += 1;
        Ok(())
    }

    /// Data rows written so far, header excluded.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flush buffered rows.  Idempotent.
    pub fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.out.flush()?;
        Ok(())
    }
}
