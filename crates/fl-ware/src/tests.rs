//! Unit tests for fl-ware.

use fl_core::{DateTime, ExecutionMessages, RunDescriptor, RunEnv, Step};
use fl_spatial::Repository;
use fl_store::WritePolicy;

use crate::{Capabilities, Phase, WareAccess, World};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// 2×2 grid of `SU` units, ids 1..=4, process order sorted.
fn grid_world() -> World {
    let mut repo = Repository::new();
    repo.build_grid("SU", 2, 2, 1).unwrap();
    repo.sort_by_process_order();
    World::new(repo, WritePolicy::Reject)
}

fn hourly_run() -> RunDescriptor {
    RunDescriptor::new(DateTime(0), DateTime(10 * 3_600), 3_600).unwrap()
}

struct Fixture {
    world:    World,
    run:      RunDescriptor,
    env:      RunEnv,
    messages: ExecutionMessages,
}

impl Fixture {
    fn new() -> Self {
        Self {
            world:    grid_world(),
            run:      hourly_run(),
            env:      RunEnv::new().with("dir.output", "/tmp/out"),
            messages: ExecutionMessages::new(),
        }
    }

    fn access(&mut self, caps: Capabilities, phase: Phase) -> WareAccess<'_> {
        WareAccess::new("tests.ware", caps, phase, &self.run, &self.env, &mut self.world, &self.messages)
    }
}

// ── Params ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod params {
    use crate::{WareError, WareParams, WareSignature};

    #[test]
    fn typed_getters() {
        let p = WareParams::new()
            .with("coeff", "0.25")
            .with("count", "7")
            .with("wet", "yes")
            .with("levels", "1.5; 2 ;3.25")
            .with("names", "a;b;");
        assert_eq!(p.real("coeff").unwrap(), 0.25);
        assert_eq!(p.integer("count").unwrap(), 7);
        assert!(p.boolean("wet").unwrap());
        assert_eq!(p.reals("levels").unwrap(), vec![1.5, 2.0, 3.25]);
        assert_eq!(p.strings("names").unwrap(), vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(p.real_or("missing", 4.0).unwrap(), 4.0);
    }

    #[test]
    fn missing_and_invalid() {
        let p = WareParams::new().with("coeff", "abc");
        assert!(matches!(p.real("other"), Err(WareError::MissingParam(n)) if n == "other"));
        assert!(matches!(p.real("coeff"), Err(WareError::InvalidParam { expected: "a real", .. })));
        assert!(p.real_or("coeff", 1.0).is_err());
        assert!(matches!(WareParams::new().with("v", "1;x").integers("v"), Err(WareError::InvalidParam { .. })));
    }

    #[test]
    fn defaults_from_signature() {
        let sig = WareSignature::simulator("w")
            .param("coeff", "runoff coefficient", Some("0.3"))
            .param("file", "output file", None);
        let mut p = WareParams::new().with("coeff", "0.9");
        p.apply_defaults(&sig);
        assert_eq!(p.get("coeff"), Some("0.9"));
        assert!(!p.contains("file"));

        let mut empty = WareParams::new();
        empty.apply_defaults(&sig);
        assert_eq!(empty.get("coeff"), Some("0.3"));
    }
}

// ── Signature ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod signature {
    use fl_core::Step;

    use crate::{Capabilities, Phase, WareSignature};

    #[test]
    fn capability_set() {
        let caps = Capabilities::VARIABLES_WRITE | Capabilities::EVENTS_WRITE;
        assert!(caps.contains(Capabilities::EVENTS_WRITE));
        assert!(!caps.contains(Capabilities::GRAPH_MUTATE));
        assert!(caps.contains(Capabilities::NONE));
        assert_eq!(caps.to_string(), "variables-write|events-write");
        assert_eq!(Capabilities::NONE.to_string(), "none");
    }

    #[test]
    fn observers_granted_nothing() {
        let sig = WareSignature::observer("export").requires(Capabilities::ALL);
        assert!(sig.is_observer());
        assert_eq!(sig.granted(), Capabilities::NONE);
        let sim = WareSignature::simulator("sim").requires(Capabilities::GRAPH_MUTATE).max_threads(0);
        assert_eq!(sim.granted(), Capabilities::GRAPH_MUTATE);
        assert_eq!(sim.max_threads, 1);
    }

    #[test]
    fn phase_display() {
        assert_eq!(Phase::Step(Step(4)).to_string(), "run-step S4");
        assert!(Phase::Check.is_setup());
        assert!(!Phase::Finalize.is_setup());
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod registry {
    use crate::{NoopWare, RegistryError, Ware, WareEntry, WareRegistry, WareSignature};

    #[test]
    fn register_and_instantiate() {
        let mut reg = WareRegistry::new();
        reg.register(crate::ware_entry!(NoopWare, NoopWare::signature())).unwrap();
        assert!(reg.contains(NoopWare::ID));
        let (sig, _ware) = reg.instantiate(NoopWare::ID).unwrap();
        assert_eq!(sig.id, NoopWare::ID);
    }

    #[test]
    fn duplicate_and_unknown() {
        let mut reg = WareRegistry::new();
        reg.register(crate::ware_entry!(NoopWare, NoopWare::signature())).unwrap();
        let err = reg.register(crate::ware_entry!(NoopWare, NoopWare::signature())).unwrap_err();
        assert_eq!(err, RegistryError::Duplicate(NoopWare::ID.into()));
        assert!(matches!(reg.instantiate("nope"), Err(RegistryError::UnknownWare(_))));
    }

    #[test]
    fn abi_mismatch_refused() {
        let stale = WareEntry {
            abi_version: || "fl-ware/0.0.0",
            signature:   || WareSignature::simulator("old.ware"),
            body:        || -> Box<dyn Ware> { Box::new(NoopWare) },
        };
        let mut reg = WareRegistry::new();
        reg.register(stale).unwrap();
        match reg.instantiate("old.ware") {
            Err(RegistryError::AbiMismatch { ware, found, .. }) => {
                assert_eq!(ware, "old.ware");
                assert_eq!(found, "fl-ware/0.0.0");
            }
            _ => panic!("expected an ABI mismatch"),
        }
    }
}

// ── Access ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod access {
    use fl_core::{DateTime, Severity, UnitId, UnitIndex, UnitKey, Value, ValueKind};
    use fl_store::{Event, VarLookup};

    use super::*;
    use crate::prelude::*;
    use crate::AccessError;

    #[test]
    fn write_without_capability_denied() {
        let mut fx = Fixture::new();
        let mut access = fx.access(Capabilities::NONE, Phase::Step(Step(0)));
        let err = access.append_variable(UnitIndex(0), "q", 1.0).unwrap_err();
        assert!(matches!(err, AccessError::CapabilityDenied { missing: Capabilities::VARIABLES_WRITE, .. }));
        assert!(access.add_unit("SU", UnitId(9), 1).is_err());
        assert!(access.append_event(UnitIndex(0), Event::new(DateTime(0))).is_err());
    }

    #[test]
    fn append_targets_current_step() {
        let mut fx = Fixture::new();
        {
            let mut access = fx.access(Capabilities::VARIABLES_WRITE, Phase::Step(Step(0)));
            access.append_variable(UnitIndex(1), "q", 2.0).unwrap();
            assert_eq!(access.current_variable(UnitIndex(1), "q"), VarLookup::Value(&Value::Real(2.0)));
            assert_eq!(access.current_datetime(), Some(DateTime(0)));
        }
        let access = fx.access(Capabilities::NONE, Phase::Step(Step(1)));
        assert_eq!(access.current_variable(UnitIndex(1), "q"), VarLookup::NoValueYet);
        assert_eq!(access.latest_variable(UnitIndex(1), "q").map(|(s, _)| s), Some(Step(0)));
    }

    #[test]
    fn variable_writes_only_while_stepping() {
        let mut fx = Fixture::new();
        let mut access = fx.access(Capabilities::VARIABLES_WRITE, Phase::Initialize);
        access.declare_variable(UnitIndex(0), "q", ValueKind::Real).unwrap();
        let err = access.append_variable(UnitIndex(0), "q", 1.0).unwrap_err();
        assert!(matches!(err, AccessError::WrongPhase { phase: Phase::Initialize, .. }));
        assert_eq!(access.current_variable(UnitIndex(0), "q"), VarLookup::NoValueYet);
    }

    #[test]
    fn backfill_bounded_by_current_step() {
        let mut fx = Fixture::new();
        for s in 0..3 {
            let mut access = fx.access(Capabilities::VARIABLES_WRITE, Phase::Step(Step(s)));
            access.append_variable(UnitIndex(0), "q", s as f64).unwrap();
        }
        let mut access = fx.access(Capabilities::VARIABLES_WRITE, Phase::Step(Step(2)));
        access.set_variable(UnitIndex(0), "q", Step(0), 9.0).unwrap();
        let err = access.set_variable(UnitIndex(0), "q", Step(3), 1.0).unwrap_err();
        assert!(matches!(err, AccessError::OutsideWindow { current: Step(2), .. }));
        assert_eq!(access.variable(UnitIndex(0), "q", Step(0)).value(), Some(&Value::Real(9.0)));
    }

    #[test]
    fn dead_slot_rejected() {
        let mut fx = Fixture::new();
        let mut access = fx.access(Capabilities::ALL, Phase::Step(Step(0)));
        access.remove_unit(&UnitKey::new("SU", 1)).unwrap();
        let err = access.append_variable(UnitIndex(0), "q", 1.0).unwrap_err();
        assert!(matches!(err, AccessError::Spatial(_)));
    }

    #[test]
    fn input_data_setup_only() {
        let mut fx = Fixture::new();
        {
            let mut access = fx.access(Capabilities::INPUT_WRITE, Phase::Prepare);
            access.set_input_data(UnitIndex(2), "area", 120.0).unwrap();
        }
        let mut access = fx.access(Capabilities::INPUT_WRITE, Phase::Step(Step(0)));
        assert_eq!(access.input_data(UnitIndex(2), "area"), Some(&Value::Real(120.0)));
        assert!(matches!(
            access.set_input_data(UnitIndex(2), "area", 1.0),
            Err(AccessError::WrongPhase { .. })
        ));
    }

    #[test]
    fn events_range_query() {
        let mut fx = Fixture::new();
        let mut access = fx.access(Capabilities::EVENTS_WRITE, Phase::Prepare);
        access.append_event(UnitIndex(0), Event::new(DateTime(7_200)).with("kind", "irrigation")).unwrap();
        access.append_event(UnitIndex(0), Event::new(DateTime(100)).with("kind", "sowing")).unwrap();
        let found = access.events_between(UnitIndex(0), DateTime(0), DateTime(3_600));
        assert_eq!(found.len(), 1);
        assert_eq!(found.iter().next().unwrap().info("kind"), Some(&Value::from("sowing")));
    }

    #[test]
    fn messages_tagged_with_ware_and_step() {
        let mut fx = Fixture::new();
        let access = fx.access(Capabilities::NONE, Phase::Step(Step(3)));
        access.raise_warning("dry");
        access.raise_error_from("SU#2", "negative depth");
        let all = fx.messages.snapshot();
        assert_eq!(all[0].to_string(), "[warning] tests.ware at S3: dry");
        assert_eq!(all[1].severity, Severity::Error);
        assert_eq!(all[1].source.as_deref(), Some("SU#2"));
        assert!(fx.messages.is_fatal());
    }

    #[test]
    fn env_lookup() {
        let mut fx = Fixture::new();
        let access = fx.access(Capabilities::NONE, Phase::Prepare);
        assert_eq!(access.env_string("dir.output"), Some("/tmp/out"));
        assert_eq!(access.current_step(), None);
        assert_eq!(access.max_threads(), 1);
    }

    #[test]
    fn for_each_unit_in_process_order() {
        let mut fx = Fixture::new();
        fx.world.repository.set_process_order(&UnitKey::new("SU", 1), 5).unwrap();
        fx.world.repository.sort_by_process_order();
        let mut access = fx.access(Capabilities::VARIABLES_WRITE, Phase::Step(Step(0)));
        let mut seen = Vec::new();
        access
            .for_each_unit("SU", |a, unit| {
                seen.push(a.graph().unit(unit).unwrap().id().0);
                a.append_variable(unit, "q", 1.0)?;
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, vec![2, 3, 4, 1]);
    }

    #[test]
    fn grid_built_through_access() {
        let mut fx = Fixture::new();
        let mut access = fx.access(Capabilities::GRAPH_MUTATE, Phase::Prepare);
        let cells = access.build_grid("RS", 1, 3, 2).unwrap();
        assert_eq!(cells.len(), 3);
        assert!(access.graph().is_connected_to(&UnitKey::new("RS", 1), &UnitKey::new("RS", 2)));
    }
}

// ── Parallel loops ────────────────────────────────────────────────────────────

#[cfg(test)]
mod scope {
    use fl_core::{DateTime, UnitIndex, Value};
    use fl_store::{Event, VarLookup};

    use super::*;
    use crate::prelude::*;
    use crate::WareError;

    #[test]
    fn each_unit_writes_its_own_series() {
        let mut fx = Fixture::new();
        let mut access = fx.access(Capabilities::VARIABLES_WRITE | Capabilities::EVENTS_WRITE, Phase::Step(Step(0)));
        let failed = access.par_for_each_unit("SU", |scope| {
            let id = scope.key().id.0 as f64;
            scope.append_variable("q", id * 10.0)?;
            scope.append_event(Event::new(DateTime(0)).with("id", id))?;
            Ok(())
        });
        assert_eq!(failed, 0);
        for (slot, expected) in [(0, 10.0), (3, 40.0)] {
            assert_eq!(
                access.variable(UnitIndex(slot), "q", Step(0)),
                VarLookup::Value(&Value::Real(expected))
            );
        }
        assert_eq!(access.events().total(), 4);
    }

    #[test]
    fn failures_recorded_per_unit_in_order() {
        let mut fx = Fixture::new();
        let mut access = fx.access(Capabilities::NONE, Phase::Step(Step(1)));
        let failed = access.par_for_each_unit("SU", |scope| {
            if scope.key().id.0 % 2 == 0 {
                scope.raise_warning("even unit");
                return Err(WareError::failed("boom"));
            }
            Ok(())
        });
        assert_eq!(failed, 2);
        let sources: Vec<_> = fx
            .messages
            .snapshot()
            .into_iter()
            .map(|m| (m.source.unwrap_or_default(), m.severity))
            .collect();
        assert_eq!(sources.len(), 4);
        assert_eq!(sources[0].0, "SU#2");
        assert_eq!(sources[2].0, "SU#4");
        assert!(fx.messages.is_fatal());
    }

    #[test]
    fn scope_writes_still_capability_checked() {
        let mut fx = Fixture::new();
        let mut access = fx.access(Capabilities::NONE, Phase::Step(Step(0)));
        let failed = access.par_for_each_unit("SU", |scope| {
            scope.append_variable("q", 1.0)?;
            Ok(())
        });
        assert_eq!(failed, 4);
        assert!(!access.variable_exists(UnitIndex(0), "q"));
    }

    #[test]
    fn unknown_class_is_empty_loop() {
        let mut fx = Fixture::new();
        let mut access = fx.access(Capabilities::NONE, Phase::Step(Step(0)));
        assert_eq!(access.par_for_each_unit("XX", |_| Ok(())), 0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn runs_on_pool() {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        let mut fx = Fixture::new();
        let access = fx.access(Capabilities::VARIABLES_WRITE, Phase::Step(Step(0)));
        let mut access = access.with_pool(Some(&pool));
        assert_eq!(access.max_threads(), 3);
        let failed = access.par_for_each_unit("SU", |scope| {
            scope.append_variable("q", scope.index().0 as i64)?;
            Ok(())
        });
        assert_eq!(failed, 0);
        assert!(access.variable_exists(UnitIndex(3), "q"));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn setup_loops_stay_on_driving_thread() {
        use std::sync::Mutex;
        use std::thread;

        let pool = rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        let driver = thread::current().id();
        let mut fx = Fixture::new();
        for phase in [Phase::Prepare, Phase::Check, Phase::Initialize, Phase::Finalize] {
            let mut access = fx.access(Capabilities::NONE, phase).with_pool(Some(&pool));
            assert_eq!(access.max_threads(), 1, "{phase}");
            let threads = Mutex::new(Vec::new());
            access.par_for_each_unit("SU", |_| {
                threads.lock().unwrap().push(thread::current().id());
                Ok(())
            });
            let threads = threads.into_inner().unwrap();
            assert!(!threads.is_empty());
            assert!(threads.iter().all(|&t| t == driver), "{phase} ran on a worker");
        }
    }
}
