//! Behaviour tests for multi-body gravity using rust-rspec.
//!
//! Covers attraction-radius cut-off, force superposition and the idle
//! result for entities outside every body's reach.

use glam::Vec3;
use gravwell::{
    AttractingBody, BodyId, GravityResolver, IntentMap, MovementIntent, MovingEntity,
    PhysicsConfig,
};
use test_utils::{entity, moon, scene_manager};

#[derive(Debug, Clone)]
struct GravityWorld {
    bodies: Vec<AttractingBody>,
    entity: MovingEntity,
    force: Vec3,
    nearest: Option<BodyId>,
    intent: Option<MovementIntent>,
}

impl Default for GravityWorld {
    fn default() -> Self {
        Self {
            bodies: Vec::new(),
            entity: entity(1, Vec3::ZERO),
            force: Vec3::splat(f32::NAN),
            nearest: None,
            intent: None,
        }
    }
}

impl GravityWorld {
    fn place(&mut self, bodies: Vec<AttractingBody>, position: Vec3) {
        self.bodies = bodies;
        self.entity = entity(1, position);
        self.force = Vec3::splat(f32::NAN);
        self.nearest = None;
        self.intent = None;
    }

    fn resolve(&mut self) {
        let resolution = GravityResolver::default().resolve(&self.entity, &self.bodies);
        self.force = resolution.force;
        self.nearest = resolution.nearest_body.map(|body| body.id);
    }

    fn step_without_intent(&mut self) {
        let (mut manager, _clock) = scene_manager(PhysicsConfig::default(), self.bodies.clone());
        let intents = manager.step(&[self.entity], &IntentMap::new());
        self.intent = intents.get(&self.entity.id).copied();
    }
}

#[test]
fn distant_body_exerts_no_force_but_is_nearest() {
    rspec::run(&rspec::given(
        "a moon whose attraction radius is 100 and an entity 200 away",
        GravityWorld::default(),
        |ctx| {
            ctx.before_each(|world| {
                world.place(vec![moon(7, Vec3::ZERO)], Vec3::new(200.0, 0.0, 0.0));
            });
            ctx.when("gravity is resolved", |ctx| {
                ctx.before_each(|world| world.resolve());
                ctx.then("the force is zero", |world| {
                    assert_eq!(world.force, Vec3::ZERO);
                });
                ctx.then("the moon is still reported as nearest", |world| {
                    assert_eq!(world.nearest, Some(BodyId(7)));
                });
            });
        },
    ));
}

#[test]
fn symmetric_bodies_cancel() {
    rspec::run(&rspec::given(
        "two equal moons on opposite sides of an entity",
        GravityWorld::default(),
        |ctx| {
            ctx.before_each(|world| {
                world.place(
                    vec![
                        moon(1, Vec3::new(-35.0, 10.0, 0.0)),
                        moon(2, Vec3::new(35.0, -10.0, 0.0)),
                    ],
                    Vec3::ZERO,
                );
            });
            ctx.when("gravity is resolved", |ctx| {
                ctx.before_each(|world| world.resolve());
                ctx.then("the net force is approximately zero", |world| {
                    assert!(world.force.length() < 1e-4, "force {:?}", world.force);
                });
                ctx.then("a nearest body is still selected", |world| {
                    assert!(matches!(world.nearest, Some(BodyId(1 | 2))));
                });
            });
        },
    ));
}

#[test]
fn unattracted_entity_without_intent_stays_idle() {
    rspec::run(&rspec::given(
        "an entity beyond every attraction radius and no base intent",
        GravityWorld::default(),
        |ctx| {
            ctx.before_each(|world| {
                world.place(vec![moon(1, Vec3::ZERO)], Vec3::new(0.0, 500.0, 0.0));
            });
            ctx.when("the manager steps once", |ctx| {
                ctx.before_each(|world| world.step_without_intent());
                ctx.then("the intent has zero speed", |world| {
                    let intent = world.intent.expect("entity should receive an intent");
                    assert_eq!(intent.speed, 0.0);
                });
                ctx.then("the direction is finite and zero", |world| {
                    let intent = world.intent.expect("entity should receive an intent");
                    assert!(intent.direction.is_finite());
                    assert_eq!(intent.direction, Vec3::ZERO);
                });
            });
        },
    ));
}
