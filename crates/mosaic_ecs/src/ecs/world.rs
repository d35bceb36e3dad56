//! # ECS Orchestrator
//!
//! Ties the allocator, component tables, flag sets and systems together.
//!
//! ## Membership
//!
//! An entity is active in system `S` iff its flag set is a superset of `S`'s
//! required set. The predicate is recomputed from scratch for every system
//! touched by an attach or detach; nothing is tracked incrementally.

use std::any::Any;

use tracing::{debug, trace, trace_span, warn};

use super::allocator::IndexAllocator;
use super::bitset::BitSet;
use super::command::{Command, Commands};
use super::component::{Component, ComponentHandle, ComponentTypeId};
use super::entity::Entity;
use super::membership::ActiveSet;
use super::registry::SystemRegistry;
use super::storage::Components;
use super::system::{System, SystemContext, SystemId};
use crate::config::EcsConfig;
use crate::error::{EcsError, EcsResult};

/// A registered system with its requirement and active sets.
struct SystemSlot {
    name: String,
    system: Box<dyn System>,
    required: BitSet,
    active: ActiveSet,
}

/// Collects component types and systems, then freezes them into an [`Ecs`].
///
/// Every system is registered here, before any entity exists. Once built,
/// the system registry is read-only.
pub struct EcsBuilder {
    config: EcsConfig,
    components: Components,
    systems: Vec<SystemSlot>,
    system_registry: SystemRegistry,
}

impl Default for EcsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EcsBuilder {
    /// Creates a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: EcsConfig::default(),
            components: Components::with_capacity(0),
            systems: Vec::new(),
            system_registry: SystemRegistry::new(),
        }
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: EcsConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the handle for `C`, registering the type on first call.
    pub fn component<C: Component>(&mut self) -> ComponentHandle<C> {
        self.components.register::<C>()
    }

    /// Registers a system. Systems run in registration order.
    ///
    /// # Errors
    ///
    /// - [`EcsError::EmptyRequirements`] if the system declares no types
    /// - [`EcsError::UnknownComponentType`] if it declares a type index this
    ///   builder never issued
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_system<S: System + 'static>(&mut self, system: S) -> EcsResult<SystemId> {
        let name = system.name().to_owned();
        let requirements = system.requirements();

        if requirements.is_empty() {
            warn!(system = %name, "rejected system without required component types");
            return Err(EcsError::EmptyRequirements { system: name });
        }

        let mut required = BitSet::new();
        for &type_id in &requirements {
            if !self.components.registry().contains(type_id) {
                warn!(system = %name, %type_id, "rejected system with unknown component type");
                return Err(EcsError::UnknownComponentType(type_id));
            }
            required.insert(type_id.index());
        }

        let id = SystemId::new(self.systems.len() as u32);
        for &type_id in &requirements {
            self.system_registry.register(type_id, id);
        }

        debug!(
            system = %name,
            id = id.index(),
            requirements = ?requirements,
            "registered system"
        );

        self.systems.push(SystemSlot {
            name,
            system: Box::new(system),
            required,
            active: ActiveSet::new(),
        });
        Ok(id)
    }

    /// Chaining form of [`add_system`](Self::add_system).
    ///
    /// # Errors
    ///
    /// Same as [`add_system`](Self::add_system).
    pub fn with_system<S: System + 'static>(mut self, system: S) -> EcsResult<Self> {
        self.add_system(system)?;
        Ok(self)
    }

    /// Freezes the registries and reserves the initial entity capacity.
    #[must_use]
    pub fn build(self) -> Ecs {
        let capacity = self.config.initial_capacity;

        let mut components = self.components;
        components.grow_to(capacity);

        let mut flags = Vec::new();
        flags.resize_with(capacity, BitSet::new);

        debug!(
            capacity,
            component_types = components.registry().len(),
            systems = self.systems.len(),
            "built ECS"
        );

        Ecs {
            config: self.config,
            allocator: IndexAllocator::with_capacity(capacity),
            flags,
            components,
            systems: self.systems,
            system_registry: self.system_registry,
            tick: 0,
        }
    }
}

/// The ECS: entity lifecycle, component attach/detach, per-tick dispatch.
///
/// Every operation runs to completion before returning; there is no
/// reentrancy and no internal threading.
///
/// # Example
///
/// ```rust,ignore
/// let mut builder = Ecs::builder();
/// let position = builder.component::<Position>();
/// builder.add_system(Render { position })?;
/// let mut ecs = builder.build();
///
/// let e = ecs.create();
/// ecs.add_component(e, Position::default())?;
/// ecs.process();
/// ecs.destroy(e)?;
/// ```
pub struct Ecs {
    config: EcsConfig,
    allocator: IndexAllocator,
    /// Component flag set per entity slot; grown in lockstep with the tables.
    flags: Vec<BitSet>,
    components: Components,
    /// Registered systems, in registration order.
    systems: Vec<SystemSlot>,
    system_registry: SystemRegistry,
    /// Completed `process()` calls.
    tick: u64,
}

impl Default for Ecs {
    fn default() -> Self {
        Self::new()
    }
}

impl Ecs {
    /// Starts building an ECS.
    #[must_use]
    pub fn builder() -> EcsBuilder {
        EcsBuilder::new()
    }

    /// An ECS with no systems and the default configuration.
    #[must_use]
    pub fn new() -> Self {
        EcsBuilder::new().build()
    }

    // =========================================================================
    // Entity lifecycle
    // =========================================================================

    /// Creates an entity with no components.
    ///
    /// Reuses the most recently destroyed index if there is one. Never fails.
    pub fn create(&mut self) -> Entity {
        let index = self.allocator.allocate();
        let slot = index as usize;

        if slot >= self.flags.len() {
            let capacity = (self.flags.len() * 2).max(slot + 1);
            self.flags.resize_with(capacity, BitSet::new);
            self.components.grow_to(capacity);
        }
        self.flags[slot].clear();

        if self.config.trace_lifecycle {
            trace!(entity = index, "created entity");
        }
        Entity::from_index(index)
    }

    /// Destroys `entity`: detaches every component, drops it from every
    /// system, and frees the index for reuse.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotAlive`] if `entity` is not live (double free).
    /// Nothing is modified in that case.
    #[allow(clippy::cast_possible_truncation)]
    pub fn destroy(&mut self, entity: Entity) -> EcsResult<()> {
        self.ensure_alive(entity, "destroy")?;
        let slot = entity.slot();

        let mut flags = std::mem::take(&mut self.flags[slot]);
        for bit in &flags {
            // Bits are issued type indices, which fit in u32
            let type_id = ComponentTypeId::new(bit as u32);
            self.components.clear_slot(type_id, slot);
            for &system in self.system_registry.systems_for(type_id) {
                self.systems[system.index()].active.deactivate(entity);
            }
        }
        flags.clear();
        self.flags[slot] = flags;

        self.allocator.free(entity.index())?;

        if self.config.trace_lifecycle {
            trace!(entity = entity.index(), "destroyed entity");
        }
        Ok(())
    }

    /// Checks whether `entity` is live.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.allocator.is_live(entity.index())
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub const fn entity_count(&self) -> usize {
        self.allocator.live_count()
    }

    /// Entity slots currently reserved in flag sets and tables.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.flags.len()
    }

    fn ensure_alive(&self, entity: Entity, operation: &'static str) -> EcsResult<()> {
        if self.is_alive(entity) {
            Ok(())
        } else {
            warn!(entity = entity.index(), operation, "operation on dead entity");
            Err(EcsError::EntityNotAlive(entity.index()))
        }
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Returns the handle for `C`, registering the type if no system
    /// declared it.
    pub fn component_handle<C: Component>(&mut self) -> ComponentHandle<C> {
        self.components.register::<C>()
    }

    /// Attaches `component` to `entity`, replacing any previous value of the
    /// same type, and activates the entity in every system it now satisfies.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotAlive`] if `entity` is not live.
    pub fn add_component<C: Component>(&mut self, entity: Entity, component: C) -> EcsResult<()> {
        self.ensure_alive(entity, "add_component")?;
        let handle = self.components.register::<C>();
        self.components.set(handle, entity.slot(), component)?;
        self.attach(entity, handle.id());
        Ok(())
    }

    /// Attaches a type-erased component value.
    ///
    /// # Errors
    ///
    /// - [`EcsError::EntityNotAlive`] if `entity` is not live
    /// - [`EcsError::UnknownComponentType`] if `type_id` was never issued
    /// - [`EcsError::ComponentTypeMismatch`] if `value` is not of that type
    pub fn add_component_erased(
        &mut self,
        entity: Entity,
        type_id: ComponentTypeId,
        value: Box<dyn Any>,
    ) -> EcsResult<()> {
        self.ensure_alive(entity, "add_component")?;
        self.components.insert_erased(type_id, entity.slot(), value)?;
        self.attach(entity, type_id);
        Ok(())
    }

    /// Detaches component type `type_id` from `entity`.
    ///
    /// Returns `true` if a component was removed. Removing an absent or
    /// unregistered type is a no-op, so repeated calls are safe.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotAlive`] if `entity` is not live.
    pub fn remove_component(&mut self, entity: Entity, type_id: ComponentTypeId) -> EcsResult<bool> {
        self.ensure_alive(entity, "remove_component")?;
        if !self.components.clear_slot(type_id, entity.slot()) {
            return Ok(false);
        }
        self.detach(entity, type_id);
        Ok(true)
    }

    /// Typed form of [`remove_component`](Self::remove_component) that hands
    /// back the removed value.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityNotAlive`] if `entity` is not live.
    pub fn remove<C: Component>(&mut self, entity: Entity) -> EcsResult<Option<C>> {
        self.ensure_alive(entity, "remove_component")?;
        let Some(handle) = self.components.handle::<C>() else {
            return Ok(None);
        };
        let removed = self.components.take(handle, entity.slot());
        if removed.is_some() {
            self.detach(entity, handle.id());
        }
        Ok(removed)
    }

    /// Untyped read; the caller downcasts to the expected type.
    #[must_use]
    pub fn get_component(&self, entity: Entity, type_id: ComponentTypeId) -> Option<&dyn Any> {
        self.components.get_erased(type_id, entity)
    }

    /// Untyped mutable read; the caller downcasts to the expected type.
    ///
    /// `None` for dead entities and out-of-range indices.
    pub fn get_component_mut(
        &mut self,
        entity: Entity,
        type_id: ComponentTypeId,
    ) -> Option<&mut dyn Any> {
        if !self.is_alive(entity) {
            return None;
        }
        self.components.get_erased_mut(type_id, entity)
    }

    /// Typed read.
    #[must_use]
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        let handle = self.components.handle::<C>()?;
        self.components.get(handle, entity)
    }

    /// Typed mutable read.
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        let handle = self.components.handle::<C>()?;
        self.components.get_mut(handle, entity)
    }

    /// Checks the flag set of `entity` for `type_id`.
    #[must_use]
    pub fn has_component(&self, entity: Entity, type_id: ComponentTypeId) -> bool {
        self.flags
            .get(entity.slot())
            .is_some_and(|flags| flags.contains(type_id.index()))
    }

    /// Component types attached to `entity`, ascending.
    #[allow(clippy::cast_possible_truncation)]
    pub fn component_types(&self, entity: Entity) -> impl Iterator<Item = ComponentTypeId> + '_ {
        self.flags
            .get(entity.slot())
            .into_iter()
            .flat_map(BitSet::iter)
            .map(|bit| ComponentTypeId::new(bit as u32))
    }

    /// Read access to every component table.
    #[inline]
    #[must_use]
    pub const fn components(&self) -> &Components {
        &self.components
    }

    /// In-place update access to every component table.
    #[inline]
    pub fn components_mut(&mut self) -> &mut Components {
        &mut self.components
    }

    fn attach(&mut self, entity: Entity, type_id: ComponentTypeId) {
        let slot = entity.slot();
        self.flags[slot].insert(type_id.index());

        let flags = &self.flags[slot];
        for &system in self.system_registry.systems_for(type_id) {
            let target = &mut self.systems[system.index()];
            if flags.is_superset(&target.required) {
                target.active.try_activate(entity);
            }
        }

        if self.config.trace_lifecycle {
            trace!(entity = entity.index(), %type_id, "attached component");
        }
    }

    fn detach(&mut self, entity: Entity, type_id: ComponentTypeId) {
        let slot = entity.slot();
        self.flags[slot].remove(type_id.index());

        let flags = &self.flags[slot];
        for &system in self.system_registry.systems_for(type_id) {
            let target = &mut self.systems[system.index()];
            if !flags.is_superset(&target.required) {
                target.active.deactivate(entity);
            }
        }

        if self.config.trace_lifecycle {
            trace!(entity = entity.index(), %type_id, "detached component");
        }
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Runs every system once, in registration order, then applies the
    /// commands they queued.
    ///
    /// Each system walks its active list as it stood when the tick began;
    /// structural changes requested mid-tick land after the last system.
    pub fn process(&mut self) {
        self.tick += 1;
        let mut commands = Commands::new();

        for slot in &mut self.systems {
            let SystemSlot {
                name,
                system,
                active,
                ..
            } = slot;
            let _span = trace_span!("system", system = name.as_str(), active = active.len()).entered();

            let mut ctx = SystemContext::new(&mut self.components, &mut commands, self.tick);
            system.begin(&mut ctx);
            active.for_each_active(|entity| system.process(entity, &mut ctx));
            system.end(&mut ctx);
        }

        if !commands.is_empty() {
            trace!(tick = self.tick, queued = commands.len(), "applying deferred commands");
            self.apply(commands);
        }
    }

    /// Applies queued structural changes in FIFO order.
    ///
    /// A command that fails (e.g. destroying an entity an earlier command
    /// already destroyed) is logged and skipped; the rest still apply.
    pub fn apply(&mut self, mut commands: Commands) {
        for command in commands.drain() {
            let result = match command {
                Command::Create(init) => {
                    let entity = self.create();
                    if let Some(init) = init {
                        init(self, entity);
                    }
                    Ok(())
                }
                Command::Destroy(entity) => self.destroy(entity),
                Command::Insert {
                    entity,
                    type_id,
                    value,
                } => self.add_component_erased(entity, type_id, value),
                Command::Remove { entity, type_id } => {
                    self.remove_component(entity, type_id).map(|_| ())
                }
            };

            if let Err(error) = result {
                warn!(%error, "skipped deferred command");
            }
        }
    }

    /// Completed `process()` calls.
    #[inline]
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Number of registered systems.
    #[inline]
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Looks up a system by its [`System::name`].
    #[must_use]
    pub fn system_id(&self, name: &str) -> Option<SystemId> {
        self.systems
            .iter()
            .position(|slot| slot.name == name)
            .and_then(|i| u32::try_from(i).ok())
            .map(SystemId::new)
    }

    /// The dense active list of `system`, in current iteration order.
    #[must_use]
    pub fn active_entities(&self, system: SystemId) -> Option<&[Entity]> {
        self.systems
            .get(system.index())
            .map(|slot| slot.active.as_slice())
    }

    /// Checks whether `entity` is active in `system`.
    #[must_use]
    pub fn is_active(&self, system: SystemId, entity: Entity) -> bool {
        self.systems
            .get(system.index())
            .is_some_and(|slot| slot.active.contains(entity))
    }

    /// The configuration this instance was built with.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &EcsConfig {
        &self.config
    }
}
