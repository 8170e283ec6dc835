//! Movement intents and their layering.
//!
//! Controllers express "where I want to go" as a [`MovementIntent`]. The
//! physics manager corrects base intents; the [`IntentManager`] lets a
//! caller override the result for individual entities before integration.

use glam::{Quat, Vec3};
use hashbrown::HashMap;

use crate::body::{EntityId, MovingEntity};
use crate::vector_math::{normalize_or, sanitize_speed};

/// Per-entity intents keyed by entity id.
pub type IntentMap = HashMap<EntityId, MovementIntent>;

/// Desired travel and facing of an entity for one tick.
///
/// `direction` is a unit vector or zero; `speed` is never negative.
/// Facing is independent of travel so an entity can move one way while
/// turning its feet toward gravity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementIntent {
    /// Unit travel direction, or zero when stationary.
    pub direction: Vec3,
    /// Travel speed in units per second.
    pub speed: f32,
    /// Orientation the entity should assume.
    pub target_rotation: Quat,
}

impl Default for MovementIntent {
    fn default() -> Self {
        Self::IDLE
    }
}

fn sanitize_rotation(rotation: Quat) -> Quat {
    if rotation.is_finite() && rotation.length_squared() > f32::EPSILON {
        rotation.normalize()
    } else {
        Quat::IDENTITY
    }
}

/// How [`MovementIntent::apply_to`] reaches the target rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationBlend {
    /// Set the rotation directly.
    Snap,
    /// Spherically interpolate by the given factor in `[0, 1]`.
    Slerp(f32),
}

impl MovementIntent {
    /// No motion and identity facing.
    pub const IDLE: Self = Self {
        direction: Vec3::ZERO,
        speed: 0.0,
        target_rotation: Quat::IDENTITY,
    };

    /// Builds an intent, normalising `direction` and clamping `speed`.
    ///
    /// A degenerate direction becomes zero; a negative or non-finite speed
    /// becomes zero.
    ///
    /// ```
    /// use glam::{Quat, Vec3};
    /// use gravwell::MovementIntent;
    /// let intent = MovementIntent::new(Vec3::new(0.0, 0.0, 3.0), -2.0, Quat::IDENTITY);
    /// assert_eq!(intent.direction, Vec3::Z);
    /// assert_eq!(intent.speed, 0.0);
    /// ```
    #[must_use]
    pub fn new(direction: Vec3, speed: f32, target_rotation: Quat) -> Self {
        Self {
            direction: normalize_or(direction, Vec3::ZERO),
            speed: sanitize_speed(speed),
            target_rotation: sanitize_rotation(target_rotation),
        }
    }

    /// Velocity vector `direction * speed`.
    #[must_use]
    pub fn velocity(&self) -> Vec3 {
        self.direction * self.speed
    }

    /// Integrates the intent into `entity` over `delta` seconds.
    pub fn apply_to(&self, entity: &mut MovingEntity, delta: f32, blend: RotationBlend) {
        entity.position += self.velocity() * delta.max(0.0);
        entity.rotation = match blend {
            RotationBlend::Snap => self.target_rotation,
            RotationBlend::Slerp(t) => entity
                .rotation
                .slerp(self.target_rotation, t.clamp(0.0, 1.0)),
        };
    }
}

/// Base intents from controllers plus per-entity overrides.
///
/// The final intent of an entity is its override when one is set, otherwise
/// its base intent.
#[derive(Debug, Default, Clone)]
pub struct IntentManager {
    base: IntentMap,
    overrides: IntentMap,
}

impl IntentManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the controller-provided intent for `id`.
    pub fn set_base(&mut self, id: EntityId, intent: MovementIntent) {
        self.base.insert(id, intent);
    }

    /// Replaces all base intents, for example with corrected physics output.
    pub fn replace_base(&mut self, intents: IntentMap) {
        self.base = intents;
    }

    /// Forces `intent` for `id` until cleared.
    pub fn set_override(&mut self, id: EntityId, intent: MovementIntent) {
        self.overrides.insert(id, intent);
    }

    /// Removes the override of `id`, returning it if one was set.
    pub fn clear_override(&mut self, id: EntityId) -> Option<MovementIntent> {
        self.overrides.remove(&id)
    }

    /// Base intents in the shape expected by the physics manager.
    #[must_use]
    pub const fn base_intents(&self) -> &IntentMap {
        &self.base
    }

    /// Final intent of `id`.
    #[must_use]
    pub fn final_intent(&self, id: EntityId) -> Option<MovementIntent> {
        self.overrides
            .get(&id)
            .or_else(|| self.base.get(&id))
            .copied()
    }

    /// Final intents of every entity with a base intent or an override.
    #[must_use]
    pub fn final_intents(&self) -> IntentMap {
        let mut merged = self.base.clone();
        merged.extend(self.overrides.iter().map(|(id, intent)| (*id, *intent)));
        merged
    }

    /// Forgets every intent of `id`.
    pub fn release_entity(&mut self, id: EntityId) {
        self.base.remove(&id);
        self.overrides.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    fn apply_to_moves_along_velocity_and_snaps() {
        let mut entity = MovingEntity::new(EntityId(1), Vec3::ZERO, 1.0);
        let facing = Quat::from_rotation_x(0.5);
        let intent = MovementIntent::new(Vec3::X, 4.0, facing);
        intent.apply_to(&mut entity, 0.5, RotationBlend::Snap);
        assert_eq!(entity.position, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(entity.rotation, facing);
    }

    #[rstest]
    fn apply_to_slerps_part_way() {
        let mut entity = MovingEntity::new(EntityId(1), Vec3::ZERO, 1.0);
        let intent = MovementIntent::new(Vec3::ZERO, 0.0, Quat::from_rotation_y(1.0));
        intent.apply_to(&mut entity, 1.0, RotationBlend::Slerp(0.5));
        assert_relative_eq!(entity.rotation.angle_between(Quat::IDENTITY), 0.5, epsilon = 1e-4);
    }

    #[rstest]
    fn overrides_win_over_base_intents() {
        let mut manager = IntentManager::new();
        let walk = MovementIntent::new(Vec3::X, 1.0, Quat::IDENTITY);
        let stop = MovementIntent::IDLE;
        manager.set_base(EntityId(1), walk);
        manager.set_base(EntityId(2), walk);
        manager.set_override(EntityId(2), stop);
        manager.set_override(EntityId(3), stop);

        assert_eq!(manager.final_intent(EntityId(1)), Some(walk));
        assert_eq!(manager.final_intent(EntityId(2)), Some(stop));
        assert_eq!(manager.final_intents().len(), 3);

        assert_eq!(manager.clear_override(EntityId(2)), Some(stop));
        assert_eq!(manager.final_intent(EntityId(2)), Some(walk));

        manager.release_entity(EntityId(3));
        assert_eq!(manager.final_intent(EntityId(3)), None);
    }
}
