//! # System Membership
//!
//! Per-system record of which entities are active:
//!
//! ```text
//! bits:      [0 1 0 1 1 0 ...]   "is e active?" in O(1)
//! dense:     [3, 1, 4]           iteration order, gap-free
//! positions: [-, 1, -, 0, 2, -]  where e sits in `dense`, for O(1) removal
//! ```
//!
//! Removal swaps the departing entry with the last one and shrinks the list,
//! so iteration order is not stable across removals.

use super::bitset::BitSet;
use super::entity::Entity;

/// Sentinel for "not in the dense list".
const NOT_ACTIVE: u32 = u32::MAX;

/// Dense, order-unstable set of active entities.
#[derive(Debug, Default)]
pub struct ActiveSet {
    /// Bit `e` set iff `e` is in `dense`.
    bits: BitSet,
    /// Active entities, gap-free.
    dense: Vec<Entity>,
    /// Position of each entity in `dense`, indexed by entity slot.
    positions: Vec<u32>,
}

impl ActiveSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `entity` if it is not already active. Returns `true` if added.
    #[allow(clippy::cast_possible_truncation)]
    pub fn try_activate(&mut self, entity: Entity) -> bool {
        if !self.bits.insert(entity.slot()) {
            return false;
        }

        let slot = entity.slot();
        if slot >= self.positions.len() {
            let target = (self.positions.len() * 2).max(slot + 1);
            self.positions.resize(target, NOT_ACTIVE);
        }
        // dense.len() < live entities <= u32::MAX
        self.positions[slot] = self.dense.len() as u32;
        self.dense.push(entity);
        true
    }

    /// Removes `entity` by swapping it with the last active entry.
    ///
    /// Returns `true` if it was active; a never-activated entity is a no-op.
    pub fn deactivate(&mut self, entity: Entity) -> bool {
        if !self.bits.remove(entity.slot()) {
            return false;
        }

        let position = self.positions[entity.slot()];
        self.positions[entity.slot()] = NOT_ACTIVE;
        self.dense.swap_remove(position as usize);

        // The former last entry now fills the hole
        if let Some(&moved) = self.dense.get(position as usize) {
            self.positions[moved.slot()] = position;
        }
        true
    }

    /// Checks whether `entity` is active.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.bits.contains(entity.slot())
    }

    /// Number of active entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns `true` if no entity is active.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Active entity at dense position `i`.
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize) -> Option<Entity> {
        self.dense.get(i).copied()
    }

    /// The dense active list.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Entity] {
        &self.dense
    }

    /// Calls `f` for every active entity.
    ///
    /// Walks by position over the length captured before the first call, so
    /// entries appended after the walk starts are not visited.
    pub fn for_each_active<F: FnMut(Entity)>(&self, mut f: F) {
        let len = self.dense.len();
        for i in 0..len {
            if let Some(entity) = self.get(i) {
                f(entity);
            }
        }
    }
}
