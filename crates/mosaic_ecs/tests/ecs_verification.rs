//! # ECS Verification Tests
//!
//! These tests verify the core lifecycle and membership guarantees:
//!
//! 1. **Allocation**: no two live entities share an index; freed indices
//!    come back LIFO with an empty component set
//! 2. **Attach/Detach**: presence tracks attach/detach exactly; detach is
//!    idempotent
//! 3. **Membership**: at the start of `process()` every system sees exactly
//!    the entities whose flag set covers its requirements
//! 4. **Deferred commands**: structural changes queued mid-tick land after
//!    the tick
//!
//! Run with: cargo test --package mosaic_ecs --test ecs_verification

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use mosaic_ecs::{
    ComponentHandle, ComponentTypeId, Ecs, EcsConfig, EcsError, Entity, System, SystemContext,
    SystemId,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Velocity {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Health(u32);

type Seen = Rc<RefCell<Vec<Entity>>>;

/// Records every entity it processes.
struct Probe {
    name: &'static str,
    requires: Vec<ComponentTypeId>,
    seen: Seen,
}

impl System for Probe {
    fn name(&self) -> &str {
        self.name
    }

    fn requirements(&self) -> Vec<ComponentTypeId> {
        self.requires.clone()
    }

    fn begin(&mut self, _ctx: &mut SystemContext<'_>) {
        self.seen.borrow_mut().clear();
    }

    fn process(&mut self, entity: Entity, _ctx: &mut SystemContext<'_>) {
        self.seen.borrow_mut().push(entity);
    }
}

struct Fixture {
    ecs: Ecs,
    position: ComponentHandle<Position>,
    velocity: ComponentHandle<Velocity>,
    moving: (SystemId, Seen),
    placed: (SystemId, Seen),
}

fn fixture() -> Fixture {
    let mut builder = Ecs::builder().with_config(EcsConfig {
        initial_capacity: 4,
        trace_lifecycle: false,
    });
    let position = builder.component::<Position>();
    let velocity = builder.component::<Velocity>();

    let moving_seen = Seen::default();
    let moving = builder
        .add_system(Probe {
            name: "moving",
            requires: vec![position.id(), velocity.id()],
            seen: Rc::clone(&moving_seen),
        })
        .unwrap();

    let placed_seen = Seen::default();
    let placed = builder
        .add_system(Probe {
            name: "placed",
            requires: vec![position.id()],
            seen: Rc::clone(&placed_seen),
        })
        .unwrap();

    Fixture {
        ecs: builder.build(),
        position,
        velocity,
        moving: (moving, moving_seen),
        placed: (placed, placed_seen),
    }
}

fn indices(seen: &Seen) -> BTreeSet<u32> {
    seen.borrow().iter().map(|e| e.index()).collect()
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn verify_only_matching_entities_processed() {
    let mut f = fixture();
    let e0 = f.ecs.create();
    let _e1 = f.ecs.create();
    let e2 = f.ecs.create();

    f.ecs.add_component(e0, Position { x: 0.0, y: 0.0 }).unwrap();
    f.ecs.add_component(e2, Position { x: 0.0, y: 0.0 }).unwrap();
    f.ecs.process();

    assert_eq!(indices(&f.placed.1), BTreeSet::from([0, 2]));
    assert!(indices(&f.moving.1).is_empty());
}

#[test]
fn verify_destroyed_index_reused_empty() {
    let mut f = fixture();
    let _e0 = f.ecs.create();
    let e1 = f.ecs.create();
    let _e2 = f.ecs.create();
    f.ecs.add_component(e1, Position { x: 1.0, y: 1.0 }).unwrap();
    f.ecs.add_component(e1, Velocity { x: 1.0, y: 1.0 }).unwrap();

    f.ecs.destroy(e1).unwrap();
    let fresh = f.ecs.create();

    assert_eq!(fresh.index(), 1);
    assert!(f.ecs.get_component(fresh, f.position.id()).is_none());
    assert!(f.ecs.get_component(fresh, f.velocity.id()).is_none());
    assert_eq!(f.ecs.component_types(fresh).count(), 0);
    assert!(!f.ecs.is_active(f.moving.0, fresh));
    assert!(!f.ecs.is_active(f.placed.0, fresh));
}

#[test]
fn verify_partial_removal_respects_all_requirements() {
    let mut f = fixture();
    let e5 = (0..6).map(|_| f.ecs.create()).last().unwrap();
    assert_eq!(e5.index(), 5);

    f.ecs.add_component(e5, Position { x: 0.0, y: 0.0 }).unwrap();
    f.ecs.add_component(e5, Velocity { x: 1.0, y: 0.0 }).unwrap();
    f.ecs.remove_component(e5, f.velocity.id()).unwrap();
    f.ecs.process();

    assert!(!indices(&f.moving.1).contains(&5));
    assert!(indices(&f.placed.1).contains(&5));
}

#[test]
fn verify_remove_twice_same_as_once() {
    let mut f = fixture();
    let e = f.ecs.create();
    f.ecs.add_component(e, Position { x: 0.0, y: 0.0 }).unwrap();

    assert!(f.ecs.remove_component(e, f.position.id()).unwrap());
    let after_once: Vec<ComponentTypeId> = f.ecs.component_types(e).collect();
    let active_once = f.ecs.active_entities(f.placed.0).unwrap().to_vec();

    assert!(!f.ecs.remove_component(e, f.position.id()).unwrap());
    let after_twice: Vec<ComponentTypeId> = f.ecs.component_types(e).collect();
    let active_twice = f.ecs.active_entities(f.placed.0).unwrap().to_vec();

    assert_eq!(after_once, after_twice);
    assert_eq!(active_once, active_twice);
    assert!(f.ecs.get_component(e, f.position.id()).is_none());
}

#[test]
fn verify_presence_tracks_attach_detach() {
    let mut f = fixture();
    let e = f.ecs.create();

    f.ecs.add_component(e, Health(10)).unwrap();
    let health = f.ecs.component_handle::<Health>();
    let value = f.ecs.get_component(e, health.id()).unwrap();
    assert_eq!(value.downcast_ref::<Health>(), Some(&Health(10)));

    f.ecs.remove_component(e, health.id()).unwrap();
    assert!(f.ecs.get_component(e, health.id()).is_none());
}

#[test]
fn verify_swap_remove_keeps_other_members() {
    let mut f = fixture();
    let entities: Vec<Entity> = (0..10).map(|_| f.ecs.create()).collect();
    for &e in &entities {
        f.ecs.add_component(e, Position { x: 0.0, y: 0.0 }).unwrap();
    }

    for victim in [entities[0], entities[9], entities[4]] {
        let before: Vec<Entity> = f.ecs.active_entities(f.placed.0).unwrap().to_vec();
        f.ecs.remove_component(victim, f.position.id()).unwrap();
        let after = f.ecs.active_entities(f.placed.0).unwrap();

        for &other in before.iter().filter(|&&x| x != victim) {
            assert_eq!(after.iter().filter(|&&x| x == other).count(), 1);
        }
        assert!(!after.contains(&victim));
        assert_eq!(after.len(), before.len() - 1);
    }
}

#[test]
fn verify_double_destroy_leaves_allocator_intact() {
    let mut f = fixture();
    let a = f.ecs.create();
    let b = f.ecs.create();
    f.ecs.destroy(a).unwrap();

    assert_eq!(f.ecs.destroy(a), Err(EcsError::EntityNotAlive(a.index())));
    assert_eq!(f.ecs.entity_count(), 1);

    let c = f.ecs.create();
    let d = f.ecs.create();
    assert_eq!(c, a);
    assert_ne!(d, a);
    assert_ne!(d, b);
}

// ============================================================================
// DEFERRED COMMANDS
// ============================================================================

/// Destroys every entity whose health is zero and spawns a replacement.
struct Reaper {
    health: ComponentHandle<Health>,
}

impl System for Reaper {
    fn requirements(&self) -> Vec<ComponentTypeId> {
        vec![self.health.id()]
    }

    fn process(&mut self, entity: Entity, ctx: &mut SystemContext<'_>) {
        if ctx.get(self.health, entity) == Some(&Health(0)) {
            ctx.commands().destroy(entity);
            ctx.commands().create_with(|ecs, spawned| {
                ecs.add_component(spawned, Health(3)).unwrap();
            });
        }
    }
}

/// Decrements health and counts how many entities it saw.
struct Drain {
    health: ComponentHandle<Health>,
    visits: Rc<RefCell<usize>>,
}

impl System for Drain {
    fn requirements(&self) -> Vec<ComponentTypeId> {
        vec![self.health.id()]
    }

    fn process(&mut self, entity: Entity, ctx: &mut SystemContext<'_>) {
        *self.visits.borrow_mut() += 1;
        if let Some(h) = ctx.get_mut(self.health, entity) {
            h.0 = h.0.saturating_sub(1);
        }
    }
}

#[test]
fn verify_commands_apply_after_tick() {
    let mut builder = Ecs::builder();
    let health = builder.component::<Health>();
    builder.add_system(Reaper { health }).unwrap();
    let visits = Rc::new(RefCell::new(0usize));
    builder
        .add_system(Drain {
            health,
            visits: Rc::clone(&visits),
        })
        .unwrap();
    let mut ecs = builder.build();

    let doomed = ecs.create();
    ecs.add_component(doomed, Health(0)).unwrap();
    let healthy = ecs.create();
    ecs.add_component(healthy, Health(5)).unwrap();

    ecs.process();

    // Drain still saw the doomed entity this tick, but not the replacement
    assert_eq!(*visits.borrow(), 2);
    assert!(ecs.is_alive(healthy));
    assert_eq!(ecs.entity_count(), 2);

    // Replacement reuses the freed index and carries its initial health
    assert!(ecs.is_alive(doomed));
    assert_eq!(ecs.get::<Health>(doomed), Some(&Health(3)));
    assert_eq!(ecs.get::<Health>(healthy), Some(&Health(4)));
}

#[test]
fn verify_failed_command_skipped() {
    let mut ecs = Ecs::new();
    let health = ecs.component_handle::<Health>();
    let e = ecs.create();

    let mut commands = mosaic_ecs::Commands::new();
    commands.destroy(e);
    commands.destroy(e);
    commands.insert(e, health, Health(9));
    commands.create_with(|ecs, spawned| {
        ecs.add_component(spawned, Health(1)).unwrap();
    });
    ecs.apply(commands);

    // Second destroy and the insert on the dead index were skipped;
    // the create then reused the index
    assert_eq!(ecs.entity_count(), 1);
    assert_eq!(ecs.get::<Health>(e), Some(&Health(1)));
}

// ============================================================================
// RANDOMIZED INVARIANTS
// ============================================================================

#[derive(Default)]
struct Model {
    live: HashSet<u32>,
    components: HashMap<u32, (Option<Position>, Option<Velocity>)>,
}

impl Model {
    fn expected(&self, need_velocity: bool) -> BTreeSet<u32> {
        self.components
            .iter()
            .filter(|(_, (p, v))| p.is_some() && (!need_velocity || v.is_some()))
            .map(|(&i, _)| i)
            .collect()
    }
}

fn check(f: &Fixture, model: &Model) {
    assert_eq!(f.ecs.entity_count(), model.live.len());

    for (system, need_velocity) in [(f.moving.0, true), (f.placed.0, false)] {
        let active = f.ecs.active_entities(system).unwrap();
        let unique: BTreeSet<u32> = active.iter().map(|e| e.index()).collect();
        assert_eq!(unique.len(), active.len(), "duplicate in active list");
        assert_eq!(unique, model.expected(need_velocity));
    }

    for (&index, (pos, vel)) in &model.components {
        let e = Entity::from_index(index);
        assert_eq!(f.ecs.get::<Position>(e), pos.as_ref());
        assert_eq!(f.ecs.get::<Velocity>(e), vel.as_ref());
    }
}

#[test]
fn verify_random_sequences_against_model() {
    for seed in 0..8u64 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut f = fixture();
        let mut model = Model::default();

        for step in 0..2_000u32 {
            let live: Vec<u32> = model.live.iter().copied().collect();
            let pick = |rng: &mut ChaCha8Rng| live[rng.gen_range(0..live.len())];

            match rng.gen_range(0..10) {
                0..=2 => {
                    let e = f.ecs.create();
                    assert!(model.live.insert(e.index()), "index handed out twice");
                    model.components.insert(e.index(), (None, None));
                }
                3 if !live.is_empty() => {
                    let i = pick(&mut rng);
                    f.ecs.destroy(Entity::from_index(i)).unwrap();
                    model.live.remove(&i);
                    model.components.remove(&i);
                }
                4 | 5 if !live.is_empty() => {
                    let i = pick(&mut rng);
                    #[allow(clippy::cast_precision_loss)]
                    let p = Position {
                        x: step as f32,
                        y: 0.0,
                    };
                    f.ecs.add_component(Entity::from_index(i), p).unwrap();
                    model.components.entry(i).or_default().0 = Some(p);
                }
                6 | 7 if !live.is_empty() => {
                    let i = pick(&mut rng);
                    let v = Velocity { x: 1.0, y: -1.0 };
                    f.ecs.add_component(Entity::from_index(i), v).unwrap();
                    model.components.entry(i).or_default().1 = Some(v);
                }
                8 if !live.is_empty() => {
                    let i = pick(&mut rng);
                    f.ecs
                        .remove_component(Entity::from_index(i), f.position.id())
                        .unwrap();
                    model.components.entry(i).or_default().0 = None;
                }
                9 if !live.is_empty() => {
                    let i = pick(&mut rng);
                    f.ecs
                        .remove_component(Entity::from_index(i), f.velocity.id())
                        .unwrap();
                    model.components.entry(i).or_default().1 = None;
                }
                _ => {}
            }

            check(&f, &model);
        }

        f.ecs.process();
        assert_eq!(indices(&f.moving.1), model.expected(true));
        assert_eq!(indices(&f.placed.1), model.expected(false));
    }
}

#[test]
fn verify_config_from_toml() {
    let config = EcsConfig::from_toml_str("initial_capacity = 8\ntrace_lifecycle = true").unwrap();
    let ecs = Ecs::builder().with_config(config.clone()).build();
    assert_eq!(ecs.capacity(), 8);
    assert_eq!(ecs.config(), &config);
}
