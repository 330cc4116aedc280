//! Tests for fl-output.

#[cfg(test)]
mod csv_tests {
    use fl_core::{DateTime, Step, UnitKey, Value};
    use tempfile::TempDir;

    use crate::csv::{CsvWriter, HEADER};
    use crate::row::VariableRow;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    #[test]
    fn header_written_on_open() {
        let dir = tmp();
        let path = dir.path().join("out.csv");
        let mut w = CsvWriter::new(&path).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers, HEADER);
        assert_eq!(rdr.records().count(), 0);
    }

    #[test]
    fn rows_use_value_text_form() {
        let dir = tmp();
        let path = dir.path().join("out.csv");
        let key = UnitKey::new("SU", 3);
        let mut w = CsvWriter::new(&path).unwrap();
        w.write_row(&VariableRow {
            step:     Step(2),
            datetime: DateTime(7_200),
            unit:     &key,
            variable: "levels",
            value:    &Value::Vector(vec![1.5, 2.0]),
        })
        .unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
        assert_eq!(w.rows(), 1);

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(&rows[0][0], "2");
        assert_eq!(&rows[0][1], "7200");
        assert_eq!(&rows[0][2], "SU#3");
        assert_eq!(&rows[0][3], "levels");
        assert_eq!(&rows[0][4], "1.5;2");
    }
}

#[cfg(test)]
mod observer_tests {
    use fl_core::{DateTime, RunDescriptor, RunEnv, ValueKind};
    use fl_engine::{EngineBuilder, EngineError, RunOutcome};
    use fl_spatial::Repository;
    use fl_ware::prelude::*;
    use fl_ware::WareRegistry;
    use tempfile::TempDir;

    use crate::CsvObserver;

    /// Writes `depth = step * 10 + unit id` and `wet = true` on every `SU`.
    #[derive(Default)]
    struct Depths;

    impl Depths {
        fn signature() -> WareSignature {
            WareSignature::simulator("tests.depths").requires(Capabilities::VARIABLES_WRITE)
        }
    }

    impl Ware for Depths {
        fn initialize_run(&mut self, access: &mut WareAccess<'_>) -> WareResult<u64> {
            access.for_each_unit("SU", |a, unit| {
                a.declare_variable(unit, "depth", ValueKind::Real)?;
                a.declare_variable(unit, "wet", ValueKind::Boolean)?;
                Ok(())
            })?;
            Ok(0)
        }

        fn run_step(&mut self, access: &mut WareAccess<'_>) -> WareResult<()> {
            let step = access.current_step().map_or(0, |s| s.0);
            access.for_each_unit("SU", |a, unit| {
                let id = a.graph().unit(unit).map_or(0, |u| u.id().0);
                a.append_variable(unit, "depth", (step * 10 + id as u64) as f64)?;
                a.append_variable(unit, "wet", true)?;
                Ok(())
            })
        }
    }

    fn registry() -> WareRegistry {
        let mut registry = WareRegistry::new();
        registry.register(fl_ware::ware_entry!(Depths, Depths::signature())).unwrap();
        registry.register(CsvObserver::entry()).unwrap();
        registry
    }

    fn repo() -> Repository {
        let mut repo = Repository::new();
        repo.build_grid("SU", 1, 2, 1).unwrap();
        repo
    }

    /// Four hourly steps.
    fn run() -> RunDescriptor {
        RunDescriptor::new(DateTime(0), DateTime(4 * 3_600), 3_600).unwrap()
    }

    fn read_rows(dir: &TempDir, file: &str) -> Vec<Vec<String>> {
        let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
        rdr.records()
            .map(|r| r.unwrap().iter().map(str::to_owned).collect())
            .collect()
    }

    #[test]
    fn exports_selected_variables_each_step() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = EngineBuilder::new(run(), repo())
            .env(RunEnv::new().with("dir.output", dir.path().to_string_lossy()))
            .ware(CsvObserver::ID, WareParams::new().with("vars", "depth"))
            .ware("tests.depths", WareParams::new())
            .build(&registry())
            .unwrap();
        let report = engine.run().unwrap();
        assert!(report.is_success(), "{report}");

        let rows = read_rows(&dir, "SU_vars.csv");
        assert_eq!(rows.len(), 4 * 2);
        assert_eq!(rows[0], ["0", "0", "SU#1", "depth", "1"]);
        assert_eq!(rows[1], ["0", "0", "SU#2", "depth", "2"]);
        assert_eq!(rows[7], ["3", "10800", "SU#2", "depth", "32"]);
    }

    #[test]
    fn interval_and_wildcard() {
        let dir = tempfile::tempdir().unwrap();
        let params = WareParams::new()
            .with("vars", "*")
            .with("every", "2")
            .with("file", "all.csv");
        let mut engine = EngineBuilder::new(run(), repo())
            .env(RunEnv::new().with("dir.output", dir.path().to_string_lossy()))
            .ware("tests.depths", WareParams::new())
            .ware(CsvObserver::ID, params)
            .build(&registry())
            .unwrap();
        engine.run().unwrap();

        let rows = read_rows(&dir, "all.csv");
        // Steps 0 and 2, two units, two variables.
        assert_eq!(rows.len(), 2 * 2 * 2);
        assert!(rows.iter().all(|r| r[0] == "0" || r[0] == "2"));
        assert!(rows.iter().any(|r| r[3] == "wet" && r[4] == "true"));
    }

    #[test]
    fn missing_output_dir_is_inconsistent() {
        let err = EngineBuilder::new(run(), repo())
            .ware(CsvObserver::ID, WareParams::new().with("vars", "depth"))
            .build(&registry())
            .unwrap()
            .run()
            .unwrap_err();
        assert!(matches!(err, EngineError::Inconsistent { ref ware, .. } if ware == CsvObserver::ID));
    }

    #[test]
    fn vars_parameter_is_required() {
        let err = EngineBuilder::new(run(), repo())
            .env(RunEnv::new().with("dir.output", "unused"))
            .ware(CsvObserver::ID, WareParams::new())
            .build(&registry())
            .unwrap()
            .run()
            .unwrap_err();
        assert!(matches!(err, EngineError::SetupHook { phase: "init-params", .. }));
    }

    #[test]
    fn unknown_class_warns_but_runs() {
        let dir = tempfile::tempdir().unwrap();
        let report = EngineBuilder::new(run(), repo())
            .env(RunEnv::new().with("dir.output", dir.path().to_string_lossy()))
            .ware(CsvObserver::ID, WareParams::new().with("class", "RS").with("vars", "depth"))
            .build(&registry())
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.warning_count(), 1);
        assert!(read_rows(&dir, "RS_vars.csv").is_empty());
    }
}
