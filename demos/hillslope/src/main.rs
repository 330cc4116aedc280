//! hillslope — smallest end-to-end model for the rust_fluid simulation host.
//!
//! A 4×6 grid of surface units drains east into a single reach.  Two
//! simulators run every hour for three days:
//!
//! 1. `water.rain`   — random rainfall per unit (parallel per-unit loop)
//! 2. `water.runoff` — routes runoff downslope, upstream units first
//!
//! and the `export.vars.csv` observer writes rain and runoff to
//! `output/hillslope/SU_vars.csv`.  The unit graph is also exported as
//! `output/hillslope/units.dot`.
//!
//! Run with `RUST_LOG=debug` for per-ware details, `RUST_LOG=trace` for the
//! storm event timelines.

mod landscape;
mod wares;


use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use fl_core::{DateTime, RunDescriptor, RunEnv, UnitId};
use fl_engine::{EngineBuilder, EngineConfig};
use fl_output::CsvObserver;
use fl_ware::{WareParams, WareRegistry, ware_entry};

use landscape::{REACH, build_hillslope};
use wares::{RainGenerator, RunoffRouter};

// ── Constants ─────────────────────────────────────────────────────────────────

const ROWS:       u32 = 4;
const COLS:       u32 = 6;
const STEP_SECS:  u64 = 3_600; // 1 step = 1 hour
const SIM_DAYS:   i64 = 3;
const START_SECS: i64 = 1_700_000_000; // fixed reference Monday 00:00 UTC
const OUTPUT_DIR: &str = "output/hillslope";

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== hillslope — rust_fluid simulation host ===");
    println!("Units: {ROWS}×{COLS} surface + 1 reach  |  Days: {SIM_DAYS}");
    println!();

    // 1. Landscape.
    let repository = build_hillslope(ROWS, COLS).context("building the hillslope")?;
    println!(
        "Landscape: {} units in {} classes",
        repository.unit_count(),
        repository.classes().count()
    );
    fs::create_dir_all(OUTPUT_DIR)?;
    let dot = Path::new(OUTPUT_DIR).join("units.dot");
    fs::write(&dot, repository.to_dot())?;
    log::info!("unit graph written to {}", dot.display());

    // 2. Run period.
    let run = RunDescriptor::new(
        DateTime(START_SECS),
        DateTime(START_SECS + SIM_DAYS * 86_400),
        STEP_SECS,
    )?;
    println!("Run: {run}");

    // 3. Wares.
    let mut registry = WareRegistry::new();
    registry.register(ware_entry!(RainGenerator, RainGenerator::signature()))?;
    registry.register(ware_entry!(RunoffRouter, RunoffRouter::signature()))?;
    registry.register(CsvObserver::entry())?;

    // 4. Engine.
    let mut engine = EngineBuilder::new(run, repository)
        .env(RunEnv::new().with("dir.output", OUTPUT_DIR))
        .config(EngineConfig { max_threads: None, ..EngineConfig::default() })
        .ware(RainGenerator::ID, WareParams::new().with("mean", "1.5"))
        .ware(RunoffRouter::ID, WareParams::new().with("coeff", "0.35"))
        .ware(CsvObserver::ID, WareParams::new().with("vars", "rain;runoff"))
        .build(&registry)?;

    // 5. Run.
    let t0 = Instant::now();
    let report = engine.run()?;
    let elapsed = t0.elapsed();

    // 6. Summary.
    println!();
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    print!("{report}");
    println!();

    let world = engine.world();
    let outlet = world
        .repository
        .index_of(REACH, UnitId(1))
        .context("outlet reach missing")?;
    let storms: usize = world.events.total();
    println!("Storm events: {storms}");

    println!("{:<6} {:<14} {:>12}", "Day", "Peak step", "Peak m³");
    println!("{}", "-".repeat(34));
    if let Some(series) = world.variables.unit(outlet).and_then(|v| v.series("discharge")) {
        let per_day = (86_400 / STEP_SECS) as usize;
        for (day, chunk) in series.values().chunks(per_day).enumerate() {
            let peak = chunk
                .iter()
                .enumerate()
                .filter_map(|(i, v)| Some((i, v.as_real().ok()?)))
                .max_by(|a, b| a.1.total_cmp(&b.1));
            if let Some((i, q)) = peak {
                println!("{:<6} {:<14} {:>12.2}", day + 1, format!("S{}", day * per_day + i), q);
            }
        }
    }

    if !report.is_success() {
        anyhow::bail!("run {}", report.outcome);
    }
    Ok(())
}
