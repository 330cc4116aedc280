//! `fl-spatial` — the spatial unit graph.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`unit`]       | `Unit`, `InputData`                                       |
//! | [`repository`] | `Repository` — units, connections, process order          |
//! | [`grid`]       | `Repository::build_grid` for synthetic landscapes         |
//! | [`dot`]        | Graphviz export of the unit graph                         |
//! | [`error`]      | `SpatialError`, `SpatialResult<T>`                        |
//!
//! # Connections
//!
//! Two kinds of directed edges link units:
//!
//! ```text
//! from → to        (flow: A drains into B)
//! child → parent   (nesting: A belongs to B)
//! ```
//!
//! Edges are non-owning slot references ([`fl_core::UnitIndex`]); each edge
//! is recorded on both endpoints so queries in either direction are a short
//! linear scan of the unit's own list.

pub mod dot;
pub mod error;
pub mod grid;
pub mod repository;
pub mod unit;

#[cfg(test)]
mod tests;

pub use error::{SpatialError, SpatialResult};
pub use repository::Repository;
pub use unit::{InputData, Unit};
