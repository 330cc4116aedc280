//! Synthetic hillslope: a grid of surface units draining east into one
//! reach.
//!
//! ```text
//!   SU#1  → SU#2  → … → SU#6  ┐
//!   SU#7  → SU#8  → … → SU#12 ┤
//!    …                        ├→ RS#1
//!   SU#19 → SU#20 → … → SU#24 ┘
//! ```
//!
//! Process order is the column number, so every unit runs after the units
//! draining into it.

use fl_core::{UnitId, UnitKey, Value};
use fl_spatial::{Repository, SpatialResult};

pub const SURFACE: &str = "SU";
pub const REACH:   &str = "RS";

/// Cell edge length in metres.
const CELL_SIZE: f64 = 50.0;

pub fn build_hillslope(rows: u32, cols: u32) -> SpatialResult<Repository> {
    let mut repo = Repository::new();

    let outlet = UnitKey::new(REACH, 1);
    repo.add_unit(REACH, UnitId(1), cols as i32 + 1)?;

    for r in 0..rows {
        for c in 0..cols {
            let id = r * cols + c + 1;
            let index = repo.add_unit(SURFACE, UnitId(id), c as i32 + 1)?;
            // Steeper near the ridge (west).
            let slope = 0.02 + 0.01 * (cols - c) as f64;
            repo.set_input_data(index, "slope", Value::Real(slope))?;
            // The last row is left without an area on purpose; the router
            // fills it in during prepare_data.
            if r + 1 < rows {
                repo.set_input_data(index, "area", Value::Real(CELL_SIZE * CELL_SIZE))?;
            }
        }
    }

    for r in 0..rows {
        for c in 0..cols {
            let id = r * cols + c + 1;
            let here = UnitKey::new(SURFACE, id);
            let down = if c + 1 < cols { UnitKey::new(SURFACE, id + 1) } else { outlet.clone() };
            repo.add_from_to(&here, &down)?;
        }
    }

    repo.sort_by_process_order();
    Ok(repo)
}
