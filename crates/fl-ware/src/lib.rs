//! `fl-ware` — pluggable computational modules and their view of the run.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                       |
//! |---------------|----------------------------------------------------------------|
//! | [`ware`]      | `Ware` trait (lifecycle hooks)                                 |
//! | [`signature`] | `WareSignature`, `WareKind`, `Capabilities`, `Phase`           |
//! | [`params`]    | `WareParams` — typed getters over string parameters            |
//! | [`access`]    | `World`, `WareAccess` and the capability traits                |
//! | [`scope`]     | `UnitScope` — per-unit view for parallel loops                 |
//! | [`registry`]  | `WareEntry`, `WareRegistry`, `ABI_VERSION`, `ware_entry!`      |
//! | [`noop`]      | `NoopWare` — placeholder that does nothing                     |
//! | [`error`]     | `WareError`, `AccessError`, `RegistryError`                    |
//!
//! Ware code usually starts with `use fl_ware::prelude::*;` to bring the
//! capability traits into scope.
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                       |
//! |------------|--------------------------------------------------------------|
//! | `parallel` | `par_for_each_unit` runs on the ware's Rayon pool.           |

pub mod access;
pub mod error;
pub mod noop;
pub mod params;
pub mod registry;
pub mod scope;
pub mod signature;
pub mod ware;

#[cfg(test)]
mod tests;

pub use access::{
    EventAccess, GraphAccess, InputDataAccess, MessageAccess, VariableAccess, WareAccess, World,
};
pub use error::{AccessError, AccessResult, RegistryError, RegistryResult, WareError, WareResult};
pub use noop::NoopWare;
pub use params::WareParams;
pub use registry::{ABI_VERSION, WareEntry, WareRegistry};
pub use scope::UnitScope;
pub use signature::{Capabilities, ParamSpec, Phase, WareKind, WareSignature};
pub use ware::Ware;

/// Everything a ware implementation normally needs.
pub mod prelude {
    pub use crate::{
        Capabilities, EventAccess, GraphAccess, InputDataAccess, MessageAccess, UnitScope,
        VariableAccess, Ware, WareAccess, WareError, WareParams, WareResult, WareSignature,
    };
}
