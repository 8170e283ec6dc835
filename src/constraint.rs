//! Surface-following correction of a candidate movement.
//!
//! Near a body the solver keeps entities outside a speed-scaled clearance,
//! bends their path along the surface contour, and adjusts speed for slopes.
//! The zones, measured from the surface point:
//!
//! * below the clearance the inward motion is removed and a quadratic
//!   repulsion pushes the entity back out;
//! * up to twice the clearance the direction is blended toward the tangent
//!   plane and the slope speed factor applies;
//! * beyond that the movement passes through unchanged.

use glam::{Quat, Vec3};
use log::trace;

use crate::body::MovingEntity;
use crate::collision::{CollisionPrediction, PredictiveCollisionChecker};
use crate::config::PhysicsConfig;
use crate::constants::{
    AVOIDANCE_WEIGHT, CONSTRAINED_SPEED_FLOOR, CONTOUR_BLEND_WEIGHT, DOWNHILL_BOOST,
    DOWNHILL_DAMPING_RANGE, DOWNHILL_DAMPING_SPEED, MAX_DOWNHILL_PENALTY,
    MAX_REPULSION_SPEED_FACTOR, MAX_SLOPE_EFFECT, MAX_SLOPE_FACTOR, MIN_BRAKING_FACTOR,
    MIN_PROJECTION_LENGTH, MIN_PROXIMITY_FACTOR, MIN_SLOPE_FACTOR, REPULSION_REFERENCE_SPEED,
    REPULSION_WEIGHT, SLOPE_DIRECTION_THRESHOLD, SURFACE_UP_BIAS, UPHILL_SLOWDOWN,
};
use crate::smoothing::SpeedSmoother;
use crate::surface_cache::SurfaceData;
use crate::vector_math::{
    normalize_or, project_on_plane, remove_inward_component, rotation_from_up, safe_normalize,
    sanitize_speed,
};

/// Movement proposed before surface correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateMotion {
    /// Travel direction; normalised by the solver.
    pub direction: Vec3,
    /// Travel speed; negative values are treated as zero.
    pub speed: f32,
}

/// Clearance band the entity occupied when the correction was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintZone {
    /// Closer than the speed-scaled clearance.
    Violating,
    /// Within twice the clearance.
    Approach,
    /// Far enough that only predictive braking applies.
    Free,
}

/// Corrected movement fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConstraintResult {
    /// Unit direction, or the input direction when every correction
    /// degenerated.
    pub direction: Vec3,
    /// Smoothed, non-negative speed.
    pub speed: f32,
    /// Surface-aligned rotation, present near the surface.
    pub surface_rotation: Option<Quat>,
    /// Distance from the entity to the surface point.
    pub distance_to_surface: f32,
    /// Clearance demanded at the input speed.
    pub required_clearance: f32,
    /// Band the entity occupied.
    pub zone: ConstraintZone,
    /// Look-ahead outcome that drove any braking.
    pub prediction: CollisionPrediction,
}

/// Applies clearance, contour-following and slope rules to a movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceConstraintSolver {
    min_distance: f32,
    clearance_per_speed: f32,
    checker: PredictiveCollisionChecker,
}

impl Default for SurfaceConstraintSolver {
    fn default() -> Self {
        Self::from_config(&PhysicsConfig::default())
    }
}

impl SurfaceConstraintSolver {
    /// Builds a solver from [`PhysicsConfig`].
    #[must_use]
    pub fn from_config(config: &PhysicsConfig) -> Self {
        Self {
            min_distance: config.min_surface_distance,
            clearance_per_speed: config.clearance_per_speed,
            checker: PredictiveCollisionChecker::from_config(config),
        }
    }

    /// Base clearance before speed scaling.
    #[must_use]
    pub const fn min_distance(&self) -> f32 {
        self.min_distance
    }

    /// Look-ahead checker used in the braking step.
    #[must_use]
    pub const fn checker(&self) -> &PredictiveCollisionChecker {
        &self.checker
    }

    /// Clearance required at `speed`.
    #[must_use]
    pub fn required_clearance(&self, speed: f32) -> f32 {
        self.min_distance + sanitize_speed(speed) * self.clearance_per_speed
    }

    /// Corrects `motion` for `entity` standing over `surface`.
    ///
    /// `probe` answers look-ahead surface queries for predicted positions.
    /// The final speed passes through `smoother`, which keeps per-entity
    /// history.
    pub fn apply(
        &self,
        entity: &MovingEntity,
        surface: SurfaceData,
        motion: CandidateMotion,
        smoother: &mut SpeedSmoother,
        probe: impl FnMut(Vec3) -> Option<SurfaceData>,
    ) -> SurfaceConstraintResult {
        let input_speed = sanitize_speed(motion.speed);
        let input_direction = normalize_or(motion.direction, Vec3::ZERO);
        let radial = normalize_or(entity.position - surface.point, Vec3::Y);
        let normal = normalize_or(surface.normal, radial);
        let distance = surface.point.distance(entity.position);
        let required = self.required_clearance(input_speed);

        let prediction =
            self.checker
                .check(input_direction, input_speed, normal, entity.position, probe);
        let mut direction = input_direction;
        let mut speed = input_speed;
        if prediction.will_collide {
            speed *= (1.0 - prediction.urgency).max(MIN_BRAKING_FACTOR);
            let avoidance = normal * prediction.urgency * AVOIDANCE_WEIGHT;
            direction = normalize_or(direction + avoidance, direction);
        }

        let zone = if distance < required {
            ConstraintZone::Violating
        } else if distance < required * 2.0 {
            ConstraintZone::Approach
        } else {
            ConstraintZone::Free
        };

        match zone {
            ConstraintZone::Violating => {
                let tangent = remove_inward_component(direction, normal);
                let speed_factor =
                    (input_speed / REPULSION_REFERENCE_SPEED).min(MAX_REPULSION_SPEED_FACTOR);
                let depth = (required - distance) / required;
                let push = depth * depth * REPULSION_WEIGHT * speed_factor;
                // Head-on with a shallow violation: nothing left but the normal.
                direction = normalize_or(tangent + normal * push, normal);
                let proximity = (distance / required).max(MIN_PROXIMITY_FACTOR);
                speed = (speed * proximity).max(input_speed * CONSTRAINED_SPEED_FLOOR);
            }
            ConstraintZone::Approach => {
                let projected = project_on_plane(direction, normal);
                if projected.length() > MIN_PROJECTION_LENGTH {
                    let closeness = 1.0 - (distance - required) / required;
                    let blend = closeness * closeness * CONTOUR_BLEND_WEIGHT;
                    direction = normalize_or(
                        direction.lerp(projected.normalize(), blend.clamp(0.0, 1.0)),
                        direction,
                    );
                }
                speed *= speed_sensitive_slope_factor(
                    slope_speed_factor(direction, normal),
                    input_speed,
                );
            }
            ConstraintZone::Free => {}
        }

        let surface_rotation = (zone != ConstraintZone::Free).then(|| {
            let stabilised = normalize_or(normal.lerp(Vec3::Y, SURFACE_UP_BIAS), normal);
            rotation_from_up(stabilised)
        });

        let smoothed = smoother.smooth(entity.id, input_speed, speed);
        trace!(
            "surface constraint on {}: zone={zone:?} distance={distance:.3} \
             required={required:.3} speed {input_speed:.3} -> {smoothed:.3}",
            entity.id
        );

        SurfaceConstraintResult {
            direction,
            speed: smoothed,
            surface_rotation,
            distance_to_surface: distance,
            required_clearance: required,
            zone,
            prediction,
        }
    }
}

/// Speed multiplier for moving along a slope.
///
/// Uphill motion slows to at most 72% and downhill motion speeds up to at
/// most 150%, both scaled by the sine of the slope angle.
#[must_use]
pub fn slope_speed_factor(direction: Vec3, normal: Vec3) -> f32 {
    let Some(along_slope) = safe_normalize(project_on_plane(direction, normal)) else {
        return 1.0;
    };
    let slope_angle = normal.dot(Vec3::Y).abs().clamp(0.0, 1.0).acos();
    let effect = slope_angle.sin() * MAX_SLOPE_EFFECT;
    let climb = along_slope.dot(Vec3::Y);
    let factor = if climb > SLOPE_DIRECTION_THRESHOLD {
        1.0 - effect * UPHILL_SLOWDOWN
    } else if climb < -SLOPE_DIRECTION_THRESHOLD {
        1.0 + effect * DOWNHILL_BOOST
    } else {
        1.0
    };
    factor.clamp(MIN_SLOPE_FACTOR, MAX_SLOPE_FACTOR)
}

/// Damps the downhill bonus of `factor` at high speed.
#[must_use]
pub fn speed_sensitive_slope_factor(factor: f32, speed: f32) -> f32 {
    if factor > 1.0 && speed > DOWNHILL_DAMPING_SPEED {
        let penalty =
            ((speed - DOWNHILL_DAMPING_SPEED) / DOWNHILL_DAMPING_RANGE).min(MAX_DOWNHILL_PENALTY);
        factor - (factor - 1.0) * penalty
    } else {
        factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::EntityId;
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn solver() -> SurfaceConstraintSolver {
        SurfaceConstraintSolver::default()
    }

    fn ground() -> SurfaceData {
        SurfaceData {
            point: Vec3::ZERO,
            normal: Vec3::Y,
        }
    }

    fn flat(predicted: Vec3) -> Option<SurfaceData> {
        Some(SurfaceData {
            point: Vec3::new(predicted.x, 0.0, predicted.z),
            normal: Vec3::Y,
        })
    }

    fn hovering(height: f32) -> MovingEntity {
        MovingEntity::new(EntityId(1), Vec3::new(0.0, height, 0.0), 1.0)
    }

    #[rstest]
    fn far_entities_pass_through(solver: SurfaceConstraintSolver) {
        let mut smoother = SpeedSmoother::default();
        let motion = CandidateMotion {
            direction: Vec3::X,
            speed: 10.0,
        };
        let result = solver.apply(&hovering(20.0), ground(), motion, &mut smoother, flat);
        assert_eq!(result.zone, ConstraintZone::Free);
        assert_eq!(result.direction, Vec3::X);
        assert_relative_eq!(result.speed, 10.0);
        assert!(result.surface_rotation.is_none());
    }

    #[rstest]
    fn violating_entity_is_pushed_out(solver: SurfaceConstraintSolver) {
        let mut smoother = SpeedSmoother::default();
        let motion = CandidateMotion {
            direction: Vec3::new(1.0, -1.0, 0.0),
            speed: 20.0,
        };
        let result = solver.apply(&hovering(3.0), ground(), motion, &mut smoother, flat);
        assert_eq!(result.zone, ConstraintZone::Violating);
        assert!(result.direction.y > 0.0);
        assert_relative_eq!(result.direction.length(), 1.0, epsilon = 1e-5);
        assert!(result.speed >= 0.6 * 20.0 * 0.3);
    }

    #[rstest]
    #[case(3.0, 20.0)]
    #[case(3.999, 20.0)]
    #[case(3.9999, 20.0)]
    #[case(1.5, 0.001)]
    #[case(2.0, 0.0001)]
    fn head_on_violations_never_point_inward(
        solver: SurfaceConstraintSolver,
        #[case] height: f32,
        #[case] speed: f32,
    ) {
        let mut smoother = SpeedSmoother::default();
        let motion = CandidateMotion {
            direction: Vec3::NEG_Y,
            speed,
        };
        let result = solver.apply(&hovering(height), ground(), motion, &mut smoother, flat);
        assert_eq!(result.zone, ConstraintZone::Violating);
        assert!(result.direction.dot(Vec3::NEG_Y) <= 0.0, "{:?}", result.direction);
        assert_relative_eq!(result.direction.length(), 1.0, epsilon = 1e-5);
    }

    #[rstest]
    fn approach_zone_bends_toward_tangent(solver: SurfaceConstraintSolver) {
        let mut smoother = SpeedSmoother::default();
        let motion = CandidateMotion {
            direction: Vec3::new(1.0, -0.2, 0.0),
            speed: 5.0,
        };
        // Clearance at speed 5 is 2.5; 3.0 sits in the approach band.
        let result = solver.apply(&hovering(3.0), ground(), motion, &mut smoother, |_| None);
        assert_eq!(result.zone, ConstraintZone::Approach);
        let input = motion.direction.normalize();
        assert!(result.direction.y > input.y);
        assert!(result.surface_rotation.is_some());
    }

    #[rstest]
    #[case(Vec3::new(0.0, 0.8, -0.6), Vec3::Z, 1.0 - 0.6 * 0.4 * 0.7)]
    #[case(Vec3::new(0.0, 0.8, -0.6), Vec3::NEG_Z, 1.0 + 0.6 * 0.4 * 1.25)]
    #[case(Vec3::new(0.0, 0.8, -0.6), Vec3::X, 1.0)]
    #[case(Vec3::Y, Vec3::X, 1.0)]
    fn slope_factor_depends_on_climb(
        #[case] normal: Vec3,
        #[case] direction: Vec3,
        #[case] expected: f32,
    ) {
        assert_relative_eq!(slope_speed_factor(direction, normal), expected, epsilon = 1e-5);
    }

    #[rstest]
    #[case(1.5, 10.0, 1.5)]
    #[case(1.5, 25.0, 1.25)]
    #[case(1.5, 60.0, 1.25)]
    #[case(0.8, 60.0, 0.8)]
    fn downhill_bonus_is_damped_at_speed(
        #[case] factor: f32,
        #[case] speed: f32,
        #[case] expected: f32,
    ) {
        assert_relative_eq!(speed_sensitive_slope_factor(factor, speed), expected, epsilon = 1e-5);
    }

    #[rstest]
    fn stabilised_rotation_leans_toward_world_up(solver: SurfaceConstraintSolver) {
        let mut smoother = SpeedSmoother::default();
        let surface = SurfaceData {
            point: Vec3::ZERO,
            normal: Vec3::X,
        };
        let entity = MovingEntity::new(EntityId(1), Vec3::new(3.0, 0.0, 0.0), 1.0);
        let motion = CandidateMotion {
            direction: Vec3::Z,
            speed: 5.0,
        };
        let result = solver.apply(&entity, surface, motion, &mut smoother, |_| None);
        let up = result.surface_rotation.expect("rotation near surface") * Vec3::Y;
        let expected = Vec3::new(0.9, 0.1, 0.0).normalize();
        assert_relative_eq!(up.dot(expected), 1.0, epsilon = 1e-5);
    }
}
