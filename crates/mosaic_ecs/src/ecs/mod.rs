//! # Entity Component System
//!
//! Index-based ECS with bitset-driven system membership.
//!
//! ## Design Philosophy
//!
//! - Entity IDs are plain indices, recycled LIFO
//! - One dense table per component type, indexed by entity
//! - Each system owns a dense active list kept in sync on attach/detach
//! - Registration is explicit and per instance; no global registries

mod allocator;
mod bitset;
mod command;
mod component;
mod entity;
mod membership;
mod registry;
mod storage;
mod system;
mod world;

pub use allocator::IndexAllocator;
pub use bitset::{BitSet, Ones};
pub use command::{Command, Commands, SpawnFn};
pub use component::{Component, ComponentHandle, ComponentTypeId};
pub use entity::Entity;
pub use membership::ActiveSet;
pub use registry::{ComponentRegistry, SystemRegistry};
pub use storage::{ComponentTable, Components};
pub use system::{System, SystemContext, SystemId};
pub use world::{Ecs, EcsBuilder};
