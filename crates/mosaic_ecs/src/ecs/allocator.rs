//! # Index Allocator
//!
//! Hands out entity indices. Freed indices go onto a LIFO stack and are
//! reused before the high-water mark advances, so the most recently freed
//! slot is the next one returned and the live range stays compact.

use super::bitset::BitSet;
use crate::error::{EcsError, EcsResult};

/// LIFO-recycling entity index allocator.
///
/// Tracks liveness in a bitset, so a double free is rejected instead of
/// pushing the same index onto the stack twice.
#[derive(Debug, Default)]
pub struct IndexAllocator {
    /// Freed indices, most recent last.
    free: Vec<u32>,
    /// Next never-used index.
    high_water: u32,
    /// Bit `i` set iff index `i` is live.
    live: BitSet,
    /// Number of live indices.
    live_count: usize,
}

impl IndexAllocator {
    /// Creates an allocator with room for `capacity` indices before growing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            high_water: 0,
            live: BitSet::with_capacity(capacity),
            live_count: 0,
        }
    }

    /// Returns a recycled index if any, otherwise the high-water mark.
    ///
    /// # Panics
    ///
    /// Panics if all `u32::MAX` indices are live at once.
    pub fn allocate(&mut self) -> u32 {
        let index = if let Some(index) = self.free.pop() {
            index
        } else {
            assert!(self.high_water < u32::MAX, "entity index space exhausted");
            let index = self.high_water;
            self.high_water += 1;
            index
        };

        self.live.insert(index as usize);
        self.live_count += 1;
        index
    }

    /// Returns `index` to the free stack.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::EntityNotAlive`] if `index` is not currently live;
    /// the free stack is left untouched.
    pub fn free(&mut self, index: u32) -> EcsResult<()> {
        if !self.live.remove(index as usize) {
            return Err(EcsError::EntityNotAlive(index));
        }
        self.live_count -= 1;
        self.free.push(index);
        Ok(())
    }

    /// Checks whether `index` is currently live.
    #[inline]
    #[must_use]
    pub fn is_live(&self, index: u32) -> bool {
        self.live.contains(index as usize)
    }

    /// Number of live indices.
    #[inline]
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.live_count
    }

    /// One past the largest index ever handed out.
    #[inline]
    #[must_use]
    pub const fn high_water(&self) -> u32 {
        self.high_water
    }

    /// Number of indices waiting for reuse.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}
