//! `CsvObserver` — exports selected variables of one unit class.

use std::fs;
use std::path::PathBuf;

use fl_core::Step;
use fl_ware::prelude::*;
use fl_ware::{WareEntry, ware_entry};

use crate::{CsvWriter, OutputError, OutputResult, VariableRow};

/// Observer ware writing `vars` of every `class` unit to
/// `<dir.output>/<file>` each `every` steps.
///
/// | Parameter | Default              | Meaning                             |
/// |-----------|----------------------|-------------------------------------|
/// | `class`   | `SU`                 | unit class to export                |
/// | `vars`    | *(required)*         | `;`-separated variable names, or `*`|
/// | `file`    | `<class>_vars.csv`   | file name inside `dir.output`       |
/// | `every`   | `1`                  | output interval in steps            |
///
/// Units with no value yet for a variable at the current step are skipped.
#[derive(Default)]
pub struct CsvObserver {
    class:  String,
    /// Empty means every variable the unit has.
    vars:   Vec<String>,
    file:   Option<String>,
    every:  u64,
    path:   Option<PathBuf>,
    writer: Option<CsvWriter>,
}

impl CsvObserver {
    pub const ID: &'static str = "export.vars.csv";

    pub fn signature() -> WareSignature {
        WareSignature::observer(Self::ID)
            .describe("writes unit variables to a CSV file in dir.output")
            .param("class", "unit class to export", Some("SU"))
            .param("vars", "`;`-separated variable names, `*` for all", None)
            .param("file", "output file name", None)
            .param("every", "output interval in steps", Some("1"))
    }

    /// Registry entry.
    pub fn entry() -> WareEntry {
        ware_entry!(CsvObserver, CsvObserver::signature())
    }

    /// Path of the output file once the run is initialized.
    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    fn writer(&mut self) -> OutputResult<&mut CsvWriter> {
        self.writer.as_mut().ok_or(OutputError::NotOpen)
    }

    fn export(&mut self, access: &WareAccess<'_>, step: Step) -> OutputResult<()> {
        let datetime = access.run().datetime_at(step);
        let graph = access.graph();
        let units = graph.class_in_process_order(&self.class);
        let vars = &self.vars;
        let Some(writer) = self.writer.as_mut() else {
            return Err(OutputError::NotOpen);
        };

        for &index in units.iter() {
            let Some(unit) = graph.unit(index) else { continue };
            let names: Vec<&str> = if vars.is_empty() {
                let mut all: Vec<&str> =
                    access.variables().unit(index).map(|v| v.names().collect()).unwrap_or_default();
                all.sort_unstable();
                all
            } else {
                vars.iter().map(String::as_str).collect()
            };
            for name in names {
                if let Some(value) = access.variable(index, name, step).value() {
                    writer.write_row(&VariableRow {
                        step,
                        datetime,
                        unit: unit.key(),
                        variable: name,
                        value,
                    })?;
                }
            }
        }
        Ok(())
    }
}

impl Ware for CsvObserver {
    fn init_params(&mut self, params: &WareParams) -> WareResult<()> {
        self.class = params.string("class")?.to_owned();
        let vars = params.strings("vars")?;
        self.vars = if vars.iter().any(|v| v == "*") { Vec::new() } else { vars };
        self.file = params.get("file").map(str::to_owned);
        let every = params.integer_or("every", 1)?;
        if every < 1 {
            return Err(WareError::InvalidParam {
                name:     "every".into(),
                value:    every.to_string(),
                expected: "a positive integer",
            });
        }
        self.every = every as u64;
        Ok(())
    }

    fn check_consistency(&mut self, access: &mut WareAccess<'_>) -> WareResult<()> {
        if access.env_string("dir.output").is_none() {
            return Err(OutputError::MissingEnv("dir.output").into());
        }
        if !access.graph().class_exists(&self.class) {
            access.raise_warning(format!("class `{}` has no units, nothing will be written", self.class));
        }
        Ok(())
    }

    fn initialize_run(&mut self, access: &mut WareAccess<'_>) -> WareResult<u64> {
        let dir = access.env_string("dir.output").ok_or(OutputError::MissingEnv("dir.output"))?;
        let dir = PathBuf::from(dir);
        fs::create_dir_all(&dir).map_err(OutputError::from)?;

        let file = self.file.clone().unwrap_or_else(|| format!("{}_vars.csv", self.class));
        let path = dir.join(file);
        self.writer = Some(CsvWriter::new(&path)?);
        log::debug!("{} writing to {}", Self::ID, path.display());
        self.path = Some(path);
        Ok(0)
    }

    fn run_step(&mut self, access: &mut WareAccess<'_>) -> WareResult<()> {
        let Some(step) = access.current_step() else {
            return Ok(());
        };
        if step.0 % self.every == 0 {
            self.export(access, step)?;
        }
        Ok(())
    }

    fn finalize_run(&mut self, _access: &mut WareAccess<'_>) -> WareResult<()> {
        let writer = self.writer()?;
        writer.finish()?;
        log::info!("{} wrote {} row(s)", Self::ID, writer.rows());
        Ok(())
    }
}
