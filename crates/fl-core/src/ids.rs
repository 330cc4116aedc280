//! Unit identifiers.
//!
//! A unit is identified externally by its class name plus an integer ID that
//! is unique within the class ([`UnitKey`]).  Internally every unit also gets
//! a dense [`UnitIndex`] slot assigned by the repository at creation time.
//! Slots are never reused, so per-unit stores can be plain `Vec`s indexed by
//! `UnitIndex` and survive unit deletion without remapping.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Integer identifier of a unit, unique within its class.
    pub struct UnitId(u32);
}

typed_id! {
    /// Dense repository slot of a unit.  Assigned in declaration order.
    pub struct UnitIndex(u32);
}

// ── UnitClass ─────────────────────────────────────────────────────────────────

/// Name of a unit class (`"SU"`, `"RS"`, `"GU"`, …).
///
/// Backed by `Arc<str>` so that edges and keys clone without allocating.
/// Implements `Borrow<str>` so maps keyed by `UnitClass` can be queried with
/// a plain `&str`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct UnitClass(Arc<str>);

impl UnitClass {
    pub fn new(name: &str) -> Self {
        UnitClass(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for UnitClass {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UnitClass {
    fn from(name: &str) -> Self {
        UnitClass::new(name)
    }
}

impl From<String> for UnitClass {
    fn from(name: String) -> Self {
        UnitClass(Arc::from(name))
    }
}

impl fmt::Display for UnitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for UnitClass {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for UnitClass {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        String::deserialize(d).map(UnitClass::from)
    }
}

// ── UnitKey ───────────────────────────────────────────────────────────────────

/// System-wide unique identity of a unit: `(class, id)`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitKey {
    pub class: UnitClass,
    pub id:    UnitId,
}

impl UnitKey {
    pub fn new(class: impl Into<UnitClass>, id: u32) -> Self {
        Self { class: class.into(), id: UnitId(id) }
    }
}

impl fmt::Display for UnitKey {
    /// Formats as `class#id`, e.g. `SU#12`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.class, self.id.0)
    }
}
