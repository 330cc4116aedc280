//! Graphviz export.
//!
//! ```text
//! digraph units {
//!   "SU#1" -> "SU#2";
//!   "SU#1" -> "RS#1" [style=dashed];
//! }
//! ```
//!
//! Solid edges are `from → to`; dashed edges are `child → parent`.

use std::io::{self, Write};

use crate::Repository;

impl Repository {
    /// Write the whole graph in DOT format.  Units appear in declaration order.
    pub fn write_dot<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "digraph units {{")?;
        for unit in self.units() {
            writeln!(out, "  \"{}\";", unit.key())?;
        }
        for unit in self.units() {
            for target in unit.to_units().iter().filter_map(|&i| self.unit(i)) {
                writeln!(out, "  \"{}\" -> \"{}\";", unit.key(), target.key())?;
            }
            for parent in unit.parent_units().iter().filter_map(|&i| self.unit(i)) {
                writeln!(out, "  \"{}\" -> \"{}\" [style=dashed];", unit.key(), parent.key())?;
            }
        }
        writeln!(out, "}}")
    }

    /// [`write_dot`](Self::write_dot) into a `String`.
    pub fn to_dot(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_dot(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}
