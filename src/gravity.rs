//! Multi-body gravity and "local up" orientation.
//!
//! Forces from every body whose attraction radius contains the entity are
//! summed. Nearest-body tracking runs independently and ignores attraction
//! radii, so a distant body is still reported as the closest candidate for
//! surface constraints.

use glam::{Quat, Vec3};
use log::trace;

use crate::body::{AttractingBody, MovingEntity};
use crate::config::{OrientationPolicy, PhysicsConfig};
use crate::constants::MIN_ATTRACTION_DISTANCE;
use crate::vector_math::{rotation_from_up, safe_normalize};

/// Output of [`GravityResolver::resolve`].
#[derive(Debug, Clone, Copy)]
pub struct GravityResolution<'a> {
    /// Net gravitational force on the entity.
    pub force: Vec3,
    /// Rotation the entity should assume so its up axis opposes gravity.
    pub orientation_target: Quat,
    /// Closest body by centre distance, in range or not.
    pub nearest_body: Option<&'a AttractingBody>,
    /// Distance from the entity to the nearest body's centre.
    pub nearest_distance: f32,
    /// Number of bodies that contributed force.
    pub contributing_bodies: usize,
}

impl GravityResolution<'_> {
    /// Whether any body pulled on the entity.
    #[must_use]
    pub const fn is_attracted(&self) -> bool {
        self.contributing_bodies > 0
    }
}

/// Computes gravity from a set of attracting bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityResolver {
    gravitational_constant: f32,
    orientation: OrientationPolicy,
}

impl Default for GravityResolver {
    fn default() -> Self {
        Self::from_config(&PhysicsConfig::default())
    }
}

impl GravityResolver {
    /// Creates a resolver with explicit parameters.
    #[must_use]
    pub const fn new(gravitational_constant: f32, orientation: OrientationPolicy) -> Self {
        Self {
            gravitational_constant,
            orientation,
        }
    }

    /// Creates a resolver from the relevant [`PhysicsConfig`] fields.
    #[must_use]
    pub const fn from_config(config: &PhysicsConfig) -> Self {
        Self::new(config.gravitational_constant, config.orientation)
    }

    /// Resolves the net force and orientation target for `entity`.
    ///
    /// With no body in range the force is zero and the target is the
    /// identity rotation.
    #[must_use]
    pub fn resolve<'a>(
        &self,
        entity: &MovingEntity,
        bodies: &'a [AttractingBody],
    ) -> GravityResolution<'a> {
        let (nearest_body, nearest_distance) = nearest(entity.position, bodies);

        let entity_mass = entity.mass.max(0.0);
        let mut force = Vec3::ZERO;
        let mut contributing_bodies = 0;
        // Share of the current rotation kept after every body's blend.
        let mut keep = 1.0_f32;
        for body in bodies {
            let offset = body.position - entity.position;
            let distance = offset.length();
            let radius = body.attraction_radius();
            if distance > radius || distance < MIN_ATTRACTION_DISTANCE {
                continue;
            }
            let magnitude =
                self.gravitational_constant * body.mass * entity_mass / (distance * distance);
            force += offset / distance * magnitude;
            contributing_bodies += 1;
            if let OrientationPolicy::Smoothed { max_blend } = self.orientation {
                let falloff = (1.0 - distance / radius).clamp(0.0, 1.0);
                keep *= 1.0 - falloff * max_blend.clamp(0.0, 1.0);
            }
        }

        let orientation_target = if contributing_bodies == 0 {
            Quat::IDENTITY
        } else {
            self.orientation_target(entity.rotation, force, 1.0 - keep)
        };
        trace!(
            "gravity on {}: force={force:?} bodies={contributing_bodies}",
            entity.id
        );

        GravityResolution {
            force,
            orientation_target,
            nearest_body,
            nearest_distance,
            contributing_bodies,
        }
    }

    fn orientation_target(&self, current: Quat, force: Vec3, blend: f32) -> Quat {
        // Balanced pulls leave no preferred up axis.
        let Some(down) = safe_normalize(force) else {
            return current;
        };
        let upright = rotation_from_up(-down);
        match self.orientation {
            OrientationPolicy::Snap => upright,
            OrientationPolicy::Smoothed { .. } => current.slerp(upright, blend.clamp(0.0, 1.0)),
        }
    }
}

fn nearest(position: Vec3, bodies: &[AttractingBody]) -> (Option<&AttractingBody>, f32) {
    bodies
        .iter()
        .map(|body| (body, body.position.distance(position)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or((None, f32::INFINITY), |(body, distance)| {
            (Some(body), distance)
        })
}
