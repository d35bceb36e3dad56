//! # Entity Identifiers
//!
//! An entity is nothing but an index into the component tables. At most one
//! live entity holds a given index; the index returns to the allocator on
//! `destroy()` and may be handed out again by the next `create()`.

use std::fmt;

/// Plain integer entity identity.
///
/// Carries no generation counter: callers must not retain an `Entity` (or
/// references to its components) across a `destroy()` / `create()` cycle of
/// the same index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Entity(u32);

impl Entity {
    /// Wraps a raw entity index.
    #[inline]
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw entity index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Returns the index as a table slot.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
