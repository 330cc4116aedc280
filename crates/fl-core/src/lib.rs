//! `fl-core` — foundational types for the `rust_fluid` simulation host.
//!
//! This crate is a dependency of every other `fl-*` crate.  It has no `fl-*`
//! dependencies and few external ones (`rand`, `thiserror`, `log`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`ids`]        | `UnitId`, `UnitIndex`, `UnitClass`, `UnitKey`             |
//! | [`time`]       | `DateTime`, `Step`, `RunDescriptor`, `RunClock`           |
//! | [`value`]      | `Value`, `ValueKind`, `Matrix`                            |
//! | [`messages`]   | `ExecutionMessages`, `Message`, `Severity`                |
//! | [`env`]        | `RunEnv` — per-run environment context                    |
//! | [`rng`]        | `UnitRng` — per-unit, per-step deterministic streams      |
//! | [`error`]      | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to public data types.       |

pub mod env;
pub mod error;
pub mod ids;
pub mod messages;
pub mod rng;
pub mod time;
pub mod value;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use env::RunEnv;
pub use error::{CoreError, CoreResult};
pub use ids::{UnitClass, UnitId, UnitIndex, UnitKey};
pub use messages::{ExecutionMessages, Message, Severity};
pub use rng::UnitRng;
pub use time::{DateTime, RunClock, RunDescriptor, Step};
pub use value::{Matrix, Value, ValueKind};
