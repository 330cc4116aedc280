//! The two simulators of the demo model.

use fl_core::{UnitRng, Value, ValueKind};
use fl_store::Event;
use fl_ware::prelude::*;

use crate::landscape::{REACH, SURFACE};

// ── RainGenerator ─────────────────────────────────────────────────────────────

/// Random hourly rainfall (mm) on every surface unit, with occasional
/// storms recorded as events.
#[derive(Default)]
pub struct RainGenerator {
    mean:  f64,
    storm: f64,
    seed:  u64,
}

impl RainGenerator {
    pub const ID: &'static str = "water.rain";

    pub fn signature() -> WareSignature {
        WareSignature::simulator(Self::ID)
            .describe("uniform random rainfall per unit with storm events")
            .param("mean", "mean rainfall in mm per step", Some("1.5"))
            .param("storm", "storm probability per unit and step", Some("0.05"))
            .param("seed", "global random seed", Some("42"))
            .requires(Capabilities::VARIABLES_WRITE | Capabilities::EVENTS_WRITE)
            .max_threads(4)
    }
}

impl Ware for RainGenerator {
    fn init_params(&mut self, params: &WareParams) -> WareResult<()> {
        self.mean = params.real("mean")?;
        self.storm = params.real("storm")?;
        self.seed = params.integer("seed")? as u64;
        if self.mean.is_nan() || self.mean <= 0.0 {
            return Err(WareError::InvalidParam {
                name:     "mean".into(),
                value:    self.mean.to_string(),
                expected: "a positive real",
            });
        }
        Ok(())
    }

    fn initialize_run(&mut self, access: &mut WareAccess<'_>) -> WareResult<u64> {
        access.for_each_unit(SURFACE, |a, unit| Ok(a.declare_variable(unit, "rain", ValueKind::Real)?))?;
        Ok(access.run().step_secs())
    }

    fn run_step(&mut self, access: &mut WareAccess<'_>) -> WareResult<()> {
        let Self { mean, storm, seed } = *self;
        let Some(step) = access.current_step() else {
            return Ok(());
        };

        access.par_for_each_unit(SURFACE, move |scope| {
            let mut rng = UnitRng::at_step(seed, step, scope.index());
            let stormy = rng.gen_bool(storm);
            let mut rain = rng.uniform(0.0, 2.0 * mean);
            if stormy {
                rain *= 4.0;
                if let Some(at) = scope.current_datetime() {
                    scope.append_event(Event::new(at).with("kind", "storm").with("rain", rain))?;
                }
            }
            scope.append_variable("rain", rain)?;
            Ok(())
        });
        Ok(())
    }
}

// ── RunoffRouter ──────────────────────────────────────────────────────────────

/// Routes runoff (m³) downslope, upstream units first, and sums it at the
/// reach as `discharge`.
#[derive(Default)]
pub struct RunoffRouter {
    coeff:        f64,
    default_area: f64,
    flood:        f64,
}

impl RunoffRouter {
    pub const ID: &'static str = "water.runoff";

    pub fn signature() -> WareSignature {
        WareSignature::simulator(Self::ID)
            .describe("kinematic runoff routing from surface units to the reach")
            .param("coeff", "runoff coefficient", Some("0.3"))
            .param("default_area", "area in m² for units without one", Some("2500"))
            .param("flood", "discharge in m³ above which a warning is raised", Some("60"))
            .requires(Capabilities::VARIABLES_WRITE | Capabilities::INPUT_WRITE)
    }
}

/// Real value of `v`, or `0.0` if there is none.
fn real_or_zero(v: Option<&Value>) -> WareResult<f64> {
    Ok(v.map(Value::as_real).transpose()?.unwrap_or(0.0))
}

impl Ware for RunoffRouter {
    fn init_params(&mut self, params: &WareParams) -> WareResult<()> {
        self.coeff = params.real("coeff")?;
        self.default_area = params.real("default_area")?;
        self.flood = params.real("flood")?;
        if !(0.0..=1.0).contains(&self.coeff) {
            return Err(WareError::InvalidParam {
                name:     "coeff".into(),
                value:    self.coeff.to_string(),
                expected: "a real in [0, 1]",
            });
        }
        Ok(())
    }

    fn prepare_data(&mut self, access: &mut WareAccess<'_>) -> WareResult<()> {
        let area = self.default_area;
        let mut filled = 0;
        access.for_each_unit(SURFACE, |a, unit| {
            if !a.input_data_exists(unit, "area") {
                a.set_input_data(unit, "area", area)?;
                filled += 1;
            }
            Ok(())
        })?;
        if filled > 0 {
            access.raise_warning(format!("{filled} unit(s) had no area, using {area} m²"));
        }
        Ok(())
    }

    fn check_consistency(&mut self, access: &mut WareAccess<'_>) -> WareResult<()> {
        if !access.graph().class_exists(REACH) {
            return Err(WareError::failed("no reach unit to drain into"));
        }
        for unit in access.graph().units_of_class(SURFACE) {
            if unit.to_units().is_empty() {
                return Err(WareError::failed(format!("{} has no downslope unit", unit.key())));
            }
        }
        Ok(())
    }

    fn initialize_run(&mut self, access: &mut WareAccess<'_>) -> WareResult<u64> {
        access.for_each_unit(SURFACE, |a, unit| Ok(a.declare_variable(unit, "runoff", ValueKind::Real)?))?;
        access.for_each_unit(REACH, |a, unit| Ok(a.declare_variable(unit, "discharge", ValueKind::Real)?))?;
        Ok(0)
    }

    fn run_step(&mut self, access: &mut WareAccess<'_>) -> WareResult<()> {
        let coeff = self.coeff;
        let flood = self.flood;

        access.for_each_unit(SURFACE, |a, unit| {
            let rain = real_or_zero(a.current_variable(unit, "rain").value())?;
            let area = real_or_zero(a.input_data(unit, "area"))?;
            let upstream = inflow(a, unit)?;
            // mm over m² to m³.
            a.append_variable(unit, "runoff", coeff * rain * area / 1_000.0 + upstream)?;
            Ok(())
        })?;

        access.for_each_unit(REACH, |a, unit| {
            let discharge = inflow(a, unit)?;
            if discharge > flood {
                let key = a.graph().unit(unit).map(|u| u.key().to_string()).unwrap_or_default();
                a.raise_warning_from(&key, format!("discharge {discharge:.1} m³ above {flood} m³"));
            }
            a.append_variable(unit, "discharge", discharge)?;
            Ok(())
        })
    }
}

/// Sum of this step's `runoff` over the units draining into `unit`.
fn inflow(access: &WareAccess<'_>, unit: fl_core::UnitIndex) -> WareResult<f64> {
    let Some(here) = access.graph().unit(unit) else {
        return Ok(0.0);
    };
    let mut total = 0.0;
    for &up in here.from_units() {
        total += real_or_zero(access.current_variable(up, "runoff").value())?;
    }
    Ok(total)
}
