//! # MOSAIC ECS
//!
//! Index-based Entity Component System for a fixed-timestep game loop.
//!
//! ## Architecture Rules
//!
//! 1. **Entities are plain indices** - no entity objects, no pooling
//! 2. **One dense table per component type** - O(1) access by entity index
//! 3. **Membership is bitset-driven** - each system keeps a dense active list
//!    that is kept in sync on every attach/detach
//! 4. **Single-threaded by construction** - `process()` runs every system once,
//!    in registration order, with no suspension points
//!
//! ## Example
//!
//! ```rust,ignore
//! use mosaic_ecs::{Ecs, Entity, System, SystemContext, ComponentHandle, ComponentTypeId};
//!
//! let mut builder = Ecs::builder();
//! let position = builder.component::<Position>();
//! let velocity = builder.component::<Velocity>();
//! builder.add_system(Movement { position, velocity })?;
//! let mut ecs = builder.build();
//!
//! let e = ecs.create();
//! ecs.add_component(e, Position::default())?;
//! ecs.add_component(e, Velocity { x: 1.0, y: 0.0 })?;
//! ecs.process();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;

pub use config::EcsConfig;
pub use ecs::{
    ActiveSet, BitSet, Command, Commands, Component, ComponentHandle, ComponentRegistry,
    ComponentTable, ComponentTypeId, Components, Ecs, EcsBuilder, Entity, IndexAllocator,
    System, SystemContext, SystemId, SystemRegistry,
};
pub use error::{EcsError, EcsResult};
