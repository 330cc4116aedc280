//! Synthetic rectangular landscapes.
//!
//! Real models load their graph from domain files; tests and demos need a
//! quick regular lattice instead.

use fl_core::{UnitId, UnitIndex, UnitKey};

use crate::{Repository, SpatialError, SpatialResult};

impl Repository {
    /// Add a `rows × cols` grid of units of `class`.
    ///
    /// Ids run `1..=rows*cols` in row-major order.  Every pair of 4-neighbours
    /// is linked `from ↔ to` in both directions, so an interior cell has four
    /// upstream and four downstream neighbours, an edge cell three and a
    /// corner two.
    ///
    /// All ids are checked before anything is inserted: on
    /// [`SpatialError::AlreadyExists`] or [`SpatialError::GridTooLarge`] the
    /// repository is unchanged.
    pub fn build_grid(&mut self, class: &str, rows: u32, cols: u32, process_order: i32) -> SpatialResult<Vec<UnitIndex>> {
        let count = rows.checked_mul(cols).ok_or(SpatialError::GridTooLarge { rows, cols })?;
        if let Some(taken) = (1..=count).find(|&id| self.index_of(class, UnitId(id)).is_some()) {
            return Err(SpatialError::AlreadyExists(UnitKey::new(class, taken)));
        }

        let mut cells = Vec::with_capacity(count as usize);
        for id in 1..=count {
            cells.push(self.add_unit(class, UnitId(id), process_order)?);
        }

        let at = |r: u32, c: u32| cells[(r * cols + c) as usize];
        for r in 0..rows {
            for c in 0..cols {
                if c + 1 < cols {
                    self.link_both_ways(at(r, c), at(r, c + 1));
                }
                if r + 1 < rows {
                    self.link_both_ways(at(r, c), at(r + 1, c));
                }
            }
        }

        log::debug!("built {rows}x{cols} grid of class {class}");
        Ok(cells)
    }
}
