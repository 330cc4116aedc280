//! `fl-output` — output observers for the rust_fluid simulation host.
//!
//! | Type            | Role                                                   |
//! |-----------------|--------------------------------------------------------|
//! | [`CsvObserver`] | observer ware, runs in the monitoring pass             |
//! | [`CsvWriter`]   | `step,datetime,unit,variable,value` CSV backend        |
//!
//! # Usage
//!
//! ```rust,ignore
//! registry.register(fl_output::CsvObserver::entry())?;
//! let engine = EngineBuilder::new(run, repository)
//!     .env(RunEnv::new().with("dir.output", "./output"))
//!     .ware(CsvObserver::ID, WareParams::new().with("vars", "rain;runoff"))
//!     .build(&registry)?;
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::CsvObserver;
pub use row::VariableRow;
