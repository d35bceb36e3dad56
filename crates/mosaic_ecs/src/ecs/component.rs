//! # Components
//!
//! Components are plain data values. Any `'static` type qualifies; the
//! registry assigns each distinct type a stable [`ComponentTypeId`] on first
//! use, and a typed [`ComponentHandle`] is what systems keep to reach the
//! matching table without a lookup by type.

use std::fmt;
use std::marker::PhantomData;

/// Marker trait for ECS components.
///
/// Blanket-implemented for every `'static` type.
pub trait Component: 'static {}

impl<T: 'static> Component for T {}

/// Stable per-process index of a component type within one registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct ComponentTypeId(u32);

impl ComponentTypeId {
    /// Wraps a raw type index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw type index, which is also its bit in flag sets.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Typed binding to the component table of `C`.
///
/// Obtained from [`EcsBuilder::component`](crate::EcsBuilder::component) and
/// handed to systems at construction, replacing any runtime field scan.
pub struct ComponentHandle<C> {
    id: ComponentTypeId,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Component> ComponentHandle<C> {
    pub(crate) const fn new(id: ComponentTypeId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// The component type index this handle refers to.
    #[inline]
    #[must_use]
    pub const fn id(self) -> ComponentTypeId {
        self.id
    }
}

impl<C> Clone for ComponentHandle<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for ComponentHandle<C> {}

impl<C> PartialEq for ComponentHandle<C> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<C> Eq for ComponentHandle<C> {}

impl<C> fmt::Debug for ComponentHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("id", &self.id)
            .field("type", &std::any::type_name::<C>())
            .finish()
    }
}

impl<C> From<ComponentHandle<C>> for ComponentTypeId {
    fn from(handle: ComponentHandle<C>) -> Self {
        handle.id
    }
}
