//! # Component Storage
//!
//! One dense table per component type, indexed directly by entity index.
//!
//! The storage uses a dense array strategy:
//! - Slots are reserved in lockstep with the entity space
//! - Access is O(1) via entity index
//! - A table grows by at least doubling when written past its end
//! - Reads past the end are treated as "absent", never as an error

use std::any::{type_name, Any};

use super::component::{Component, ComponentHandle, ComponentTypeId};
use super::entity::Entity;
use super::registry::ComponentRegistry;
use crate::error::{EcsError, EcsResult};

/// Smallest slot count a table grows to on its first out-of-range write.
const MIN_GROWTH: usize = 16;

/// Dense storage for a single component type.
///
/// `table[e]` is present iff entity `e` currently has a `C` attached. Writes
/// go through the ECS so the per-entity flag sets and system membership stay
/// consistent; outside code only gets read and in-place update access.
///
/// # Type Parameters
///
/// * `C` - The component type to store
pub struct ComponentTable<C> {
    /// One slot per entity index.
    slots: Vec<Option<C>>,
    /// Number of present slots.
    present: usize,
}

impl<C: Component> ComponentTable<C> {
    /// Creates a table with `capacity` empty slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(capacity, || None);
        Self { slots, present: 0 }
    }

    /// Number of slots (present or not).
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of present components.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.present
    }

    /// Returns `true` if no component is present.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.present == 0
    }

    /// Grows the table to at least `capacity` slots, keeping every entry.
    pub(crate) fn grow_to(&mut self, capacity: usize) {
        if capacity > self.slots.len() {
            self.slots.resize_with(capacity, || None);
        }
    }

    /// Stores `value` at `index`, returning the value it replaced.
    ///
    /// Grows the table (at least doubling) if `index` is past the end.
    pub(crate) fn set(&mut self, index: usize, value: C) -> Option<C> {
        if index >= self.slots.len() {
            let target = (self.slots.len() * 2).max(index + 1).max(MIN_GROWTH);
            self.grow_to(target);
        }

        let previous = self.slots[index].replace(value);
        if previous.is_none() {
            self.present += 1;
        }
        previous
    }

    /// Empties the slot at `index`, returning what was there.
    pub(crate) fn clear(&mut self, index: usize) -> Option<C> {
        let previous = self.slots.get_mut(index)?.take();
        if previous.is_some() {
            self.present -= 1;
        }
        previous
    }

    /// Gets the component at `index`.
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&C> {
        self.slots.get(index)?.as_ref()
    }

    /// Gets a mutable reference to the component at `index`.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut C> {
        self.slots.get_mut(index)?.as_mut()
    }

    /// Checks whether a component is present at `index`.
    #[inline]
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(Option::is_some)
    }

    /// Iterates over present components with their entities.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &C)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|c| (Entity::from_index(i as u32), c)))
    }

    /// Iterates mutably over present components with their entities.
    #[allow(clippy::cast_possible_truncation)]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut C)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|c| (Entity::from_index(i as u32), c)))
    }
}

/// Type-erased view of a [`ComponentTable`], used where the ECS only knows a
/// [`ComponentTypeId`] (entity destruction, deferred inserts, untyped reads).
trait ErasedTable {
    fn type_name(&self) -> &'static str;
    fn grow_to(&mut self, capacity: usize);
    fn clear_slot(&mut self, index: usize) -> bool;
    fn get_any(&self, index: usize) -> Option<&dyn Any>;
    fn get_any_mut(&mut self, index: usize) -> Option<&mut dyn Any>;
    fn insert_any(&mut self, index: usize, value: Box<dyn Any>) -> Result<(), Box<dyn Any>>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<C: Component> ErasedTable for ComponentTable<C> {
    fn type_name(&self) -> &'static str {
        type_name::<C>()
    }

    fn grow_to(&mut self, capacity: usize) {
        ComponentTable::grow_to(self, capacity);
    }

    fn clear_slot(&mut self, index: usize) -> bool {
        self.clear(index).is_some()
    }

    fn get_any(&self, index: usize) -> Option<&dyn Any> {
        self.get(index).map(|c| c as &dyn Any)
    }

    fn get_any_mut(&mut self, index: usize) -> Option<&mut dyn Any> {
        self.get_mut(index).map(|c| c as &mut dyn Any)
    }

    fn insert_any(&mut self, index: usize, value: Box<dyn Any>) -> Result<(), Box<dyn Any>> {
        let value = value.downcast::<C>()?;
        self.set(index, *value);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Every component table of one ECS instance, together with the registry
/// that issued their type indices.
pub struct Components {
    registry: ComponentRegistry,
    /// Tables indexed by `ComponentTypeId`.
    tables: Vec<Box<dyn ErasedTable>>,
    /// Slot count every table is kept at or above.
    capacity: usize,
}

impl Components {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: ComponentRegistry::new(),
            tables: Vec::new(),
            capacity,
        }
    }

    /// The registry that issued this instance's component type indices.
    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Slot count reserved in every table.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the handle for `C`, registering the type and creating its
    /// table on first use.
    pub fn register<C: Component>(&mut self) -> ComponentHandle<C> {
        let (id, fresh) = self.registry.index_of::<C>();
        if fresh {
            debug_assert_eq!(id.index(), self.tables.len());
            self.tables
                .push(Box::new(ComponentTable::<C>::with_capacity(self.capacity)));
            tracing::debug!(
                component = type_name::<C>(),
                type_index = id.index(),
                "registered component type"
            );
        }
        ComponentHandle::new(id)
    }

    /// Returns the handle for `C` if the type is registered.
    #[must_use]
    pub fn handle<C: Component>(&self) -> Option<ComponentHandle<C>> {
        self.registry.get::<C>().map(ComponentHandle::new)
    }

    /// Typed table behind `handle`.
    ///
    /// `None` if the handle came from a different ECS instance and names a
    /// different type here.
    #[must_use]
    pub fn table<C: Component>(&self, handle: ComponentHandle<C>) -> Option<&ComponentTable<C>> {
        self.tables.get(handle.id().index())?.as_any().downcast_ref()
    }

    /// Mutable typed table behind `handle`.
    pub fn table_mut<C: Component>(
        &mut self,
        handle: ComponentHandle<C>,
    ) -> Option<&mut ComponentTable<C>> {
        self.tables
            .get_mut(handle.id().index())?
            .as_any_mut()
            .downcast_mut()
    }

    /// Component of `entity` behind `handle`.
    #[inline]
    #[must_use]
    pub fn get<C: Component>(&self, handle: ComponentHandle<C>, entity: Entity) -> Option<&C> {
        self.table(handle)?.get(entity.slot())
    }

    /// Mutable component of `entity` behind `handle`.
    #[inline]
    pub fn get_mut<C: Component>(
        &mut self,
        handle: ComponentHandle<C>,
        entity: Entity,
    ) -> Option<&mut C> {
        self.table_mut(handle)?.get_mut(entity.slot())
    }

    /// Untyped read; the caller downcasts to the expected type.
    #[must_use]
    pub fn get_erased(&self, id: ComponentTypeId, entity: Entity) -> Option<&dyn Any> {
        self.tables.get(id.index())?.get_any(entity.slot())
    }

    /// Untyped mutable read; the caller downcasts to the expected type.
    pub fn get_erased_mut(&mut self, id: ComponentTypeId, entity: Entity) -> Option<&mut dyn Any> {
        self.tables.get_mut(id.index())?.get_any_mut(entity.slot())
    }

    pub(crate) fn set<C: Component>(
        &mut self,
        handle: ComponentHandle<C>,
        slot: usize,
        value: C,
    ) -> EcsResult<Option<C>> {
        let table = self
            .table_mut(handle)
            .ok_or(EcsError::UnknownComponentType(handle.id()))?;
        Ok(table.set(slot, value))
    }

    pub(crate) fn take<C: Component>(&mut self, handle: ComponentHandle<C>, slot: usize) -> Option<C> {
        self.table_mut(handle)?.clear(slot)
    }

    pub(crate) fn clear_slot(&mut self, id: ComponentTypeId, slot: usize) -> bool {
        self.tables
            .get_mut(id.index())
            .is_some_and(|table| table.clear_slot(slot))
    }

    pub(crate) fn insert_erased(
        &mut self,
        id: ComponentTypeId,
        slot: usize,
        value: Box<dyn Any>,
    ) -> EcsResult<()> {
        let table = self
            .tables
            .get_mut(id.index())
            .ok_or(EcsError::UnknownComponentType(id))?;
        let expected = table.type_name();
        table
            .insert_any(slot, value)
            .map_err(|_| EcsError::ComponentTypeMismatch {
                type_id: id,
                expected,
            })
    }

    /// Grows every table to at least `capacity` slots.
    pub(crate) fn grow_to(&mut self, capacity: usize) {
        if capacity <= self.capacity {
            return;
        }
        for table in &mut self.tables {
            table.grow_to(capacity);
        }
        self.capacity = capacity;
    }
}
