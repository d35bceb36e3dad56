//! # Deferred Commands
//!
//! Structural changes requested while systems run. The dense active lists
//! are being walked during `process()`, so creates, destroys, attaches and
//! detaches are queued here and applied in FIFO order after the tick's last
//! system. No system sees same-tick membership changes.

use std::any::Any;
use std::fmt;

use super::component::{Component, ComponentHandle, ComponentTypeId};
use super::entity::Entity;
use super::world::Ecs;

/// Callback run on a freshly created entity.
pub type SpawnFn = Box<dyn FnOnce(&mut Ecs, Entity)>;

/// One queued structural change.
pub enum Command {
    /// Create an entity, then run the optional callback on it.
    Create(Option<SpawnFn>),
    /// Destroy an entity.
    Destroy(Entity),
    /// Attach a type-erased component value.
    Insert {
        /// Target entity.
        entity: Entity,
        /// Component type of `value`.
        type_id: ComponentTypeId,
        /// The component value.
        value: Box<dyn Any>,
    },
    /// Detach a component type.
    Remove {
        /// Target entity.
        entity: Entity,
        /// Component type to detach.
        type_id: ComponentTypeId,
    },
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create(callback) => f
                .debug_tuple("Create")
                .field(&callback.as_ref().map(|_| ".."))
                .finish(),
            Self::Destroy(entity) => f.debug_tuple("Destroy").field(entity).finish(),
            Self::Insert {
                entity, type_id, ..
            } => f
                .debug_struct("Insert")
                .field("entity", entity)
                .field("type_id", type_id)
                .finish_non_exhaustive(),
            Self::Remove { entity, type_id } => f
                .debug_struct("Remove")
                .field("entity", entity)
                .field("type_id", type_id)
                .finish(),
        }
    }
}

/// FIFO queue of [`Command`]s.
#[derive(Debug, Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an entity creation.
    pub fn create(&mut self) {
        self.queue.push(Command::Create(None));
    }

    /// Queues an entity creation followed by `init` on the new entity.
    pub fn create_with<F>(&mut self, init: F)
    where
        F: FnOnce(&mut Ecs, Entity) + 'static,
    {
        self.queue.push(Command::Create(Some(Box::new(init))));
    }

    /// Queues the destruction of `entity`.
    pub fn destroy(&mut self, entity: Entity) {
        self.queue.push(Command::Destroy(entity));
    }

    /// Queues attaching `value` to `entity`.
    pub fn insert<C: Component>(&mut self, entity: Entity, handle: ComponentHandle<C>, value: C) {
        self.queue.push(Command::Insert {
            entity,
            type_id: handle.id(),
            value: Box::new(value),
        });
    }

    /// Queues detaching component type `type_id` from `entity`.
    pub fn remove(&mut self, entity: Entity, type_id: impl Into<ComponentTypeId>) {
        self.queue.push(Command::Remove {
            entity,
            type_id: type_id.into(),
        });
    }

    /// Queues an arbitrary command.
    pub fn push(&mut self, command: Command) {
        self.queue.push(command);
    }

    /// Number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Removes every queued command in FIFO order.
    pub(crate) fn drain(&mut self) -> std::vec::Drain<'_, Command> {
        self.queue.drain(..)
    }
}
