//! Bevy adapter for the physics manager.
//!
//! [`GravwellPlugin`] inserts a [`GravwellPhysics`] resource and runs three
//! chained systems every update: release state of despawned movers, step the
//! manager with each mover's [`BaseIntent`], then integrate the resulting
//! [`CorrectedIntent`] into the mover's `Transform`. One update advances the
//! simulation by one tick of `1 / tick_rate_hz` seconds.

use bevy::prelude::*;
use log::error;

use crate::body::{AttractingBody, EntityId, MovingEntity};
use crate::config::PhysicsConfig;
use crate::intent::{IntentMap, MovementIntent, RotationBlend};
use crate::manager::PhysicsManager;

/// Resource owning the [`PhysicsManager`].
#[derive(Resource, Debug)]
pub struct GravwellPhysics(pub PhysicsManager);

/// Marks an entity as subject to gravity-well physics.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
#[require(CorrectedIntent, Transform)]
pub struct Mover {
    /// Mass in simulation units.
    pub mass: f32,
    /// Excludes the entity from physics while keeping the component.
    pub ignore_physics: bool,
}

impl Mover {
    /// A mover of `mass` that takes part in physics.
    #[must_use]
    pub const fn new(mass: f32) -> Self {
        Self {
            mass,
            ignore_physics: false,
        }
    }
}

/// Intent supplied by a controller. Movers without one are ballistic.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct BaseIntent(pub MovementIntent);

/// Intent produced by the last physics step.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct CorrectedIntent(pub MovementIntent);

/// Maps a Bevy entity onto the physics core's identifier.
#[must_use]
pub fn entity_id(entity: Entity) -> EntityId {
    EntityId(entity.to_bits())
}

/// Plugin wiring the physics manager into the `Update` schedule.
#[derive(Debug, Clone, Default)]
pub struct GravwellPlugin {
    config: PhysicsConfig,
    bodies: Vec<AttractingBody>,
}

impl GravwellPlugin {
    /// Creates a plugin for a scene made of `bodies`.
    #[must_use]
    pub const fn new(config: PhysicsConfig, bodies: Vec<AttractingBody>) -> Self {
        Self { config, bodies }
    }
}

impl Plugin for GravwellPlugin {
    fn build(&self, app: &mut App) {
        let manager = match PhysicsManager::new(self.config.clone(), self.bodies.clone()) {
            Ok(manager) => manager,
            Err(e) => {
                error!("failed to create physics manager: {e}");
                return;
            }
        };

        app.insert_resource(GravwellPhysics(manager));
        app.add_systems(
            Update,
            (
                release_despawned_movers_system,
                step_physics_system,
                apply_corrected_intents_system,
            )
                .chain(),
        );
    }
}

/// Drops side state of movers that were despawned or lost their component.
pub fn release_despawned_movers_system(
    physics: Option<ResMut<GravwellPhysics>>,
    mut removed: RemovedComponents<Mover>,
) {
    let Some(mut physics) = physics else {
        removed.clear();
        return;
    };
    for entity in removed.read() {
        physics.0.release_entity(entity_id(entity));
    }
}

/// Steps the manager and stores each mover's [`CorrectedIntent`].
pub fn step_physics_system(
    physics: Option<ResMut<GravwellPhysics>>,
    mut movers: Query<(
        Entity,
        &Mover,
        &Transform,
        Option<&BaseIntent>,
        &mut CorrectedIntent,
    )>,
) {
    let Some(mut physics) = physics else {
        return;
    };

    let mut entities = Vec::new();
    let mut base_intents = IntentMap::new();
    for (entity, mover, transform, base, _) in &movers {
        let id = entity_id(entity);
        entities.push(MovingEntity {
            id,
            position: transform.translation,
            rotation: transform.rotation,
            mass: mover.mass,
            ignore_physics: mover.ignore_physics,
        });
        if let Some(BaseIntent(intent)) = base {
            base_intents.insert(id, *intent);
        }
    }

    let corrected = physics.0.step(&entities, &base_intents);
    for (entity, _, _, _, mut slot) in &mut movers {
        if let Some(intent) = corrected.get(&entity_id(entity)) {
            slot.0 = *intent;
        }
    }
}

/// Integrates each participating mover's [`CorrectedIntent`].
pub fn apply_corrected_intents_system(
    physics: Option<Res<GravwellPhysics>>,
    mut movers: Query<(Entity, &Mover, &CorrectedIntent, &mut Transform)>,
) {
    let Some(physics) = physics else {
        return;
    };
    let delta = physics.0.config().tick_rate_hz.recip();
    for (entity, mover, CorrectedIntent(intent), mut transform) in &mut movers {
        if mover.ignore_physics {
            continue;
        }
        let mut state = MovingEntity {
            id: entity_id(entity),
            position: transform.translation,
            rotation: transform.rotation,
            mass: mover.mass,
            ignore_physics: false,
        };
        intent.apply_to(&mut state, delta, RotationBlend::Snap);
        transform.translation = state.position;
        transform.rotation = state.rotation;
    }
}
