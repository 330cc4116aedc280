//! Static ware registry.
//!
//! Each ware crate exposes one [`WareEntry`]: three plain functions giving
//! the ABI version it was built against, its signature, and a fresh
//! instance.  Hosts collect entries into a [`WareRegistry`] at start-up:
//!
//! ```rust,ignore
//! let mut registry = WareRegistry::new();
//! registry.register(fl_ware::ware_entry!(RainGenerator, RainGenerator::signature()))?;
//! registry.register(fl_output::CsvObserver::entry())?;
//! ```
//!
//! The ABI version is compared before any instance is created.

use std::collections::BTreeMap;

use crate::{RegistryError, RegistryResult, Ware, WareSignature};

/// ABI version of this host.  Entries built against another version are
/// refused.
pub const ABI_VERSION: &str = concat!("fl-ware/", env!("CARGO_PKG_VERSION"));

/// The three entry points of a ware.
#[derive(Copy, Clone)]
pub struct WareEntry {
    pub abi_version: fn() -> &'static str,
    pub signature:   fn() -> WareSignature,
    pub body:        fn() -> Box<dyn Ware>,
}

/// Build a [`WareEntry`] for a `Default`-constructible ware type.
///
/// `$signature` must not capture local variables.
#[macro_export]
macro_rules! ware_entry {
    ($ty:ty, $signature:expr) => {
        $crate::WareEntry {
            abi_version: || $crate::ABI_VERSION,
            signature:   || $signature,
            body:        || ::std::boxed::Box::new(<$ty as ::std::default::Default>::default()),
        }
    };
}

/// Entries keyed by ware id.
#[derive(Default)]
pub struct WareRegistry {
    entries: BTreeMap<String, WareEntry>,
}

impl WareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry under its signature id.
    pub fn register(&mut self, entry: WareEntry) -> RegistryResult<()> {
        let id = (entry.signature)().id;
        if self.entries.contains_key(&id) {
            return Err(RegistryError::Duplicate(id));
        }
        log::debug!("registered ware {id}");
        self.entries.insert(id, entry);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn signature(&self, id: &str) -> RegistryResult<WareSignature> {
        self.entry(id).map(|e| (e.signature)())
    }

    /// Check the ABI version, then create a fresh instance.
    pub fn instantiate(&self, id: &str) -> RegistryResult<(WareSignature, Box<dyn Ware>)> {
        let entry = self.entry(id)?;
        let found = (entry.abi_version)();
        if found != ABI_VERSION {
            return Err(RegistryError::AbiMismatch {
                ware:     id.to_owned(),
                found:    found.to_owned(),
                expected: ABI_VERSION.to_owned(),
            });
        }
        Ok(((entry.signature)(), (entry.body)()))
    }

    fn entry(&self, id: &str) -> RegistryResult<&WareEntry> {
        self.entries.get(id).ok_or_else(|| RegistryError::UnknownWare(id.to_owned()))
    }
}
