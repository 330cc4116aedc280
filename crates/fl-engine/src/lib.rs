//! `fl-engine` — lifecycle host and step scheduler for the rust_fluid
//! simulation host.
//!
//! # Run lifecycle
//!
//! ```text
//! parameterize      — bind WareParams, settle worker counts
//! prepare_data      — every ware, modeling then monitoring order
//! check_consistency — any failure aborts before stepping
//! initialize_run    — record each ware's preferred lead time
//! for step in 0..step_count:
//!   ① modeling pass   — simulators' run_step in declared order
//!   ② monitoring pass — observers' run_step, read-only
//!   fatal flag and stop request polled after every ware
//! finalize_run      — every ware, also after a halt
//! ```
//!
//! # Crate layout
//!
//! | Module      | Contents                                               |
//! |-------------|--------------------------------------------------------|
//! | [`host`]    | `WareHost` state machine, `RunContext`                 |
//! | [`model`]   | `ModelInstance` — ordered ware hosts                   |
//! | [`engine`]  | `SimulationEngine`, `StopHandle`                       |
//! | [`builder`] | `EngineBuilder`                                        |
//! | [`config`]  | `EngineConfig`, `HaltPolicy`                           |
//! | [`report`]  | `RunReport`, `RunOutcome`                              |
//! | [`error`]   | `EngineError`                                          |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Wares with `max_threads > 1` get a Rayon pool.         |
//! | `serde`    | Serialize/Deserialize on `EngineConfig`.               |

pub mod builder;
pub mod config;
pub mod engine;
pub mod error;
pub mod host;
pub mod model;
pub mod report;


pub use builder::EngineBuilder;
pub use config::{EngineConfig, HaltPolicy};
pub use engine::{SimulationEngine, StopHandle};
pub use error::{EngineError, EngineResult};
pub use host::{RunContext, WareHost, WareState};
pub use model::ModelInstance;
pub use report::{RunOutcome, RunReport};
