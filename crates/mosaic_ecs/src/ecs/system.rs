//! # Systems
//!
//! A system is per-tick logic bound to the component types it declares.
//! It is registered once, before any entity exists, and then invoked by
//! `process()` for every entity whose flag set covers its requirements.

use super::command::Commands;
use super::component::{Component, ComponentHandle, ComponentTypeId};
use super::entity::Entity;
use super::storage::Components;

/// Index of a registered system, in registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SystemId(u32);

impl SystemId {
    /// Wraps a raw system index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the registration position.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Per-entity game logic.
///
/// Systems receive their table bindings as [`ComponentHandle`]s through
/// their own constructors and read components through the
/// [`SystemContext`]. Structural changes (create, destroy, attach, detach)
/// go through [`SystemContext::commands`] and take effect once the tick's
/// last system has finished.
///
/// # Example
///
/// ```rust,ignore
/// struct Movement {
///     position: ComponentHandle<Position>,
///     velocity: ComponentHandle<Velocity>,
/// }
///
/// impl System for Movement {
///     fn requirements(&self) -> Vec<ComponentTypeId> {
///         vec![self.position.id(), self.velocity.id()]
///     }
///
///     fn process(&mut self, entity: Entity, ctx: &mut SystemContext<'_>) {
///         let Some(vel) = ctx.get(self.velocity, entity).copied() else { return };
///         if let Some(pos) = ctx.get_mut(self.position, entity) {
///             pos.x += vel.x;
///         }
///     }
/// }
/// ```
pub trait System {
    /// Name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Component types an entity must carry, all of them, to be processed.
    fn requirements(&self) -> Vec<ComponentTypeId>;

    /// Called once per tick before the first entity.
    fn begin(&mut self, _ctx: &mut SystemContext<'_>) {}

    /// Called once per tick for every active entity.
    fn process(&mut self, entity: Entity, ctx: &mut SystemContext<'_>);

    /// Called once per tick after the last entity.
    fn end(&mut self, _ctx: &mut SystemContext<'_>) {}
}

/// What a running system may touch: component values, and a queue for
/// structural changes.
pub struct SystemContext<'a> {
    components: &'a mut Components,
    commands: &'a mut Commands,
    tick: u64,
}

impl<'a> SystemContext<'a> {
    pub(crate) fn new(components: &'a mut Components, commands: &'a mut Commands, tick: u64) -> Self {
        Self {
            components,
            commands,
            tick,
        }
    }

    /// Component of `entity` behind `handle`.
    #[inline]
    #[must_use]
    pub fn get<C: Component>(&self, handle: ComponentHandle<C>, entity: Entity) -> Option<&C> {
        self.components.get(handle, entity)
    }

    /// Mutable component of `entity` behind `handle`.
    #[inline]
    pub fn get_mut<C: Component>(
        &mut self,
        handle: ComponentHandle<C>,
        entity: Entity,
    ) -> Option<&mut C> {
        self.components.get_mut(handle, entity)
    }

    /// Checks whether `entity` carries the component behind `handle`.
    #[inline]
    #[must_use]
    pub fn has<C: Component>(&self, handle: ComponentHandle<C>, entity: Entity) -> bool {
        self.components
            .table(handle)
            .is_some_and(|table| table.contains(entity.slot()))
    }

    /// Read access to every table.
    #[inline]
    #[must_use]
    pub fn components(&self) -> &Components {
        self.components
    }

    /// Queue of structural changes applied after this tick's systems.
    #[inline]
    pub fn commands(&mut self) -> &mut Commands {
        self.commands
    }

    /// Number of the tick in progress, starting at 1.
    #[inline]
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }
}
