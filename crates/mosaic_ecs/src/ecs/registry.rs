//! # Registries
//!
//! Two lookup structures owned by one ECS instance (no process-wide statics,
//! so independent instances can coexist, e.g. in tests):
//!
//! - [`ComponentRegistry`]: Rust type -> stable [`ComponentTypeId`]
//! - [`SystemRegistry`]: component type -> systems interested in it
//!
//! Both are filled in registration order and only read once the ECS is built.

use std::any::{type_name, TypeId};
use std::collections::HashMap;

use super::component::{Component, ComponentTypeId};
use super::system::SystemId;

/// Assigns each distinct component type the next free index on first use.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    /// Cached indices by Rust type.
    indices: HashMap<TypeId, ComponentTypeId>,
    /// Type names, indexed by `ComponentTypeId`.
    names: Vec<&'static str>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `C`, allocating the next one on first call.
    ///
    /// The flag reports whether the index was freshly allocated.
    pub fn index_of<C: Component>(&mut self) -> (ComponentTypeId, bool) {
        if let Some(&id) = self.indices.get(&TypeId::of::<C>()) {
            return (id, false);
        }

        let Ok(raw) = u32::try_from(self.names.len()) else {
            panic!("component type index space exhausted");
        };
        let id = ComponentTypeId::new(raw);
        self.indices.insert(TypeId::of::<C>(), id);
        self.names.push(type_name::<C>());
        (id, true)
    }

    /// Looks up the index of `C` without registering it.
    #[must_use]
    pub fn get<C: Component>(&self) -> Option<ComponentTypeId> {
        self.indices.get(&TypeId::of::<C>()).copied()
    }

    /// Checks whether `id` was issued by this registry.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: ComponentTypeId) -> bool {
        id.index() < self.names.len()
    }

    /// Rust type name registered under `id`.
    #[must_use]
    pub fn name(&self, id: ComponentTypeId) -> Option<&'static str> {
        self.names.get(id.index()).copied()
    }

    /// Number of registered component types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no type has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Maps each component type to the systems that declared it.
#[derive(Debug, Default)]
pub struct SystemRegistry {
    /// Interested systems, indexed by `ComponentTypeId`, in registration order.
    by_component: Vec<Vec<SystemId>>,
}

impl SystemRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `system` is interested in `component`.
    ///
    /// Registering the same pair twice is a no-op.
    pub fn register(&mut self, component: ComponentTypeId, system: SystemId) {
        let idx = component.index();
        if idx >= self.by_component.len() {
            self.by_component.resize_with(idx + 1, Vec::new);
        }
        let systems = &mut self.by_component[idx];
        if !systems.contains(&system) {
            systems.push(system);
        }
    }

    /// Systems interested in `component`; empty for unknown types.
    #[inline]
    #[must_use]
    pub fn systems_for(&self, component: ComponentTypeId) -> &[SystemId] {
        match self.by_component.get(component.index()) {
            Some(systems) => systems,
            None => &[],
        }
    }
}
