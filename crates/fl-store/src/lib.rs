//! `fl-store` — time-indexed per-unit state.
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`variables`] | `VariableStore`, `UnitVariables`, `Series`, `WritePolicy`  |
//! | [`events`]    | `EventStore`, `EventTimeline`, `Event`                     |
//! | [`error`]     | `StoreError`, `StoreResult<T>`                             |
//!
//! Both stores are plain `Vec`s indexed by [`fl_core::UnitIndex`].  Neither
//! knows about the spatial graph; the access layer in `fl-ware` checks that
//! a slot is live before writing to it.
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                   |
//! |-----------|----------------------------------------------------------|
//! | `fx-hash` | FxHash maps for variable-name lookup.                    |
//! | `serde`   | `Serialize`/`Deserialize` on series, events, policies.   |

pub mod error;
pub mod events;
pub mod variables;


pub use error::{StoreError, StoreResult};
pub use events::{Event, EventStore, EventTimeline};
pub use variables::{Series, UnitVariables, VarLookup, VariableStore, WritePolicy};
