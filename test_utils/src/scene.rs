//! Convenience constructors for scene participants used in tests.

use glam::{Quat, Vec3};
use gravwell::{
    AttractingBody, BodyId, EntityId, ManualClock, MovementIntent, MovingEntity, PhysicsConfig,
    PhysicsManager,
};

/// A spherical moon of radius 10 whose attraction radius is 100.
///
/// # Examples
/// ```
/// use glam::Vec3;
/// let body = test_utils::moon(1, Vec3::ZERO);
/// assert_eq!(body.attraction_radius(), 100.0);
/// assert_eq!(body.bounding_radius(), 10.0);
/// ```
pub fn moon(id: u32, position: Vec3) -> AttractingBody {
    AttractingBody::sphere(BodyId(id), position, 100.0, 10.0)
}

/// A unit-mass entity at `position`.
pub fn entity(id: u64, position: Vec3) -> MovingEntity {
    MovingEntity::new(EntityId(id), position, 1.0)
}

/// An intent travelling along `direction` at `speed` with identity facing.
pub fn walking_intent(direction: Vec3, speed: f32) -> MovementIntent {
    MovementIntent::new(direction, speed, Quat::IDENTITY)
}

/// A manager over `bodies` driven by a shared [`ManualClock`].
///
/// # Panics
/// Panics if the scene is invalid.
pub fn scene_manager(
    config: PhysicsConfig,
    bodies: Vec<AttractingBody>,
) -> (PhysicsManager, ManualClock) {
    let clock = ManualClock::default();
    let manager = PhysicsManager::new(config, bodies)
        .unwrap_or_else(|e| panic!("invalid test scene: {e}"))
        .with_clock(Box::new(clock.clone()));
    (manager, clock)
}
