//! Per-tick orchestration of gravity and surface constraints.
//!
//! [`PhysicsManager`] owns every piece of per-entity side state (surface
//! cache, raycast schedule, speed history, debug rays). `step` processes
//! entities strictly one after another, which the round-robin raycast
//! schedule relies upon.

use glam::{Quat, Vec3};
use hashbrown::{HashMap, HashSet};
use log::{debug, info, warn};

use crate::body::{AttractingBody, BodyId, EntityId, MovingEntity};
use crate::clock::{Clock, MonotonicClock};
use crate::config::PhysicsConfig;
use crate::constants::INPUT_SPEED_FLOOR;
use crate::constraint::{CandidateMotion, SurfaceConstraintSolver};
use crate::debug_rays::{DebugRayGroup, DebugRays};
use crate::error::SceneError;
use crate::geometry::{GeometryProvider, ShapeRaycaster};
use crate::gravity::{GravityResolution, GravityResolver};
use crate::intent::{IntentMap, MovementIntent};
use crate::smoothing::SpeedSmoother;
use crate::surface_cache::{RaycastStats, SurfaceQueryCache};
use crate::vector_math::{normalize_or, sanitize_speed};

/// Length of the surface normal debug ray.
const NORMAL_RAY_MAGNITUDE: f32 = 5.0;

/// How an entity's intent was computed on the last tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locomotion {
    /// No base intent: the entity follows gravity alone.
    Ballistic,
    /// Base intent combined with gravity, no surface in play.
    FreeFlight,
    /// Base intent combined with gravity, then surface-constrained.
    Surface {
        /// Body whose surface constrained the entity.
        body: BodyId,
    },
}

/// Gravity-well physics for a set of bodies and moving entities.
pub struct PhysicsManager {
    config: PhysicsConfig,
    bodies: Vec<AttractingBody>,
    geometry: Box<dyn GeometryProvider>,
    clock: Box<dyn Clock>,
    gravity: GravityResolver,
    solver: SurfaceConstraintSolver,
    cache: SurfaceQueryCache,
    smoother: SpeedSmoother,
    debug_rays: DebugRays,
    locomotion: HashMap<EntityId, Locomotion>,
    ticks: u64,
}

impl std::fmt::Debug for PhysicsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsManager")
            .field("config", &self.config)
            .field("bodies", &self.bodies.len())
            .field("ticks", &self.ticks)
            .field("stats", self.cache.stats())
            .finish_non_exhaustive()
    }
}

impl PhysicsManager {
    /// Creates a manager over `bodies` using the [`ShapeRaycaster`] and a
    /// [`MonotonicClock`].
    ///
    /// # Errors
    /// Returns [`SceneError`] when the configuration or a body is invalid,
    /// or when two bodies share an id.
    pub fn new(config: PhysicsConfig, bodies: Vec<AttractingBody>) -> Result<Self, SceneError> {
        config.validate()?;
        let mut seen = HashSet::new();
        for body in &bodies {
            body.validate()?;
            if !seen.insert(body.id) {
                return Err(SceneError::DuplicateBody(body.id));
            }
        }
        info!(
            "physics manager created with {} bodies and {:?} cache policy",
            bodies.len(),
            config.cache
        );
        Ok(Self {
            gravity: GravityResolver::from_config(&config),
            solver: SurfaceConstraintSolver::from_config(&config),
            cache: SurfaceQueryCache::new(config.cache),
            smoother: SpeedSmoother::from_config(&config),
            config,
            bodies,
            geometry: Box::new(ShapeRaycaster),
            clock: Box::new(MonotonicClock::new()),
            debug_rays: DebugRays::new(),
            locomotion: HashMap::new(),
            ticks: 0,
        })
    }

    /// Replaces the geometry provider.
    #[must_use]
    pub fn with_geometry(mut self, geometry: Box<dyn GeometryProvider>) -> Self {
        self.geometry = geometry;
        self
    }

    /// Replaces the clock used for cache staleness.
    #[must_use]
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Adds a body to the scene.
    ///
    /// # Errors
    /// Returns [`SceneError`] for an invalid body or a duplicate id.
    pub fn add_body(&mut self, body: AttractingBody) -> Result<(), SceneError> {
        body.validate()?;
        if self.bodies.iter().any(|existing| existing.id == body.id) {
            return Err(SceneError::DuplicateBody(body.id));
        }
        self.bodies.push(body);
        Ok(())
    }

    /// Bodies in the scene.
    #[must_use]
    pub fn bodies(&self) -> &[AttractingBody] {
        &self.bodies
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Surface query statistics.
    #[must_use]
    pub const fn raycast_stats(&self) -> &RaycastStats {
        self.cache.stats()
    }

    /// Surface query cache, for inspection.
    #[must_use]
    pub const fn surface_cache(&self) -> &SurfaceQueryCache {
        &self.cache
    }

    /// Debug rays recorded on the last tick.
    #[must_use]
    pub const fn debug_rays(&self) -> &DebugRays {
        &self.debug_rays
    }

    /// Debug ray settings, for toggling groups and changing styles.
    pub fn debug_rays_mut(&mut self) -> &mut DebugRays {
        &mut self.debug_rays
    }

    /// How `id` moved on the last tick it was processed.
    #[must_use]
    pub fn locomotion(&self, id: EntityId) -> Option<Locomotion> {
        self.locomotion.get(&id).copied()
    }

    /// Ticks stepped so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Drops all side state kept for `id`. Call when an entity is removed.
    pub fn release_entity(&mut self, id: EntityId) {
        self.cache.release(id);
        self.smoother.release(id);
        self.debug_rays.release(id);
        self.locomotion.remove(&id);
        debug!("released {id}");
    }

    /// Computes corrected intents for one tick.
    ///
    /// Entities flagged `ignore_physics` are skipped, absent from the result
    /// and lose their debug rays; every other entity gets exactly one entry.
    pub fn step(&mut self, entities: &[MovingEntity], base_intents: &IntentMap) -> IntentMap {
        self.ticks += 1;
        let now = self.clock.now();
        self.cache.begin_tick();
        if self.ticks % self.config.cleanup_interval_ticks == 0 {
            self.cache.cleanup_expired(now);
        }

        let mut corrected = IntentMap::with_capacity(entities.len());
        for entity in entities {
            if entity.ignore_physics {
                self.debug_rays.release(entity.id);
                continue;
            }
            let intent = self.correct(entity, base_intents.get(&entity.id), now);
            corrected.insert(entity.id, intent);
        }
        corrected
    }

    fn correct(
        &mut self,
        entity: &MovingEntity,
        base: Option<&MovementIntent>,
        now: std::time::Duration,
    ) -> MovementIntent {
        let Self {
            config,
            bodies,
            geometry,
            gravity,
            solver,
            cache,
            smoother,
            debug_rays,
            locomotion,
            ..
        } = self;

        let resolution = gravity.resolve(entity, bodies);
        debug_rays.record(
            DebugRayGroup::Gravity,
            entity.id,
            entity.position,
            resolution.force,
            resolution.force.length(),
        );

        let Some(base) = base else {
            clear_surface_rays(debug_rays, entity.id);
            locomotion.insert(entity.id, Locomotion::Ballistic);
            return ballistic_intent(&resolution);
        };

        let free = combine_with_gravity(entity.id, base, &resolution);
        let surface_body = resolution
            .nearest_body
            .filter(|_| resolution.nearest_distance <= config.proximity_threshold);
        let surface = surface_body.and_then(|body| {
            cache
                .query(entity, body, &**geometry, now)
                .map(|data| (body, data))
        });

        let intent = match surface {
            None => {
                clear_surface_rays(debug_rays, entity.id);
                locomotion.insert(entity.id, Locomotion::FreeFlight);
                free
            }
            Some((body, data)) => {
                locomotion.insert(entity.id, Locomotion::Surface { body: body.id });
                let motion = CandidateMotion {
                    direction: free.direction,
                    speed: free.speed,
                };
                let cache_view = &*cache;
                let result = solver.apply(entity, data, motion, smoother, |predicted| {
                    Some(cache_view.lookahead(entity.id, body, predicted))
                });

                let mut rotation = free.target_rotation;
                if let Some(surface_rotation) = result.surface_rotation {
                    let blend_distance = config.rotation_blend_distance;
                    if result.distance_to_surface < blend_distance {
                        let weight = 1.0 - result.distance_to_surface / blend_distance;
                        rotation = rotation.lerp(surface_rotation, weight.clamp(0.0, 1.0));
                    }
                }

                debug_rays.record(
                    DebugRayGroup::BodySurface,
                    entity.id,
                    entity.position,
                    data.point - entity.position,
                    result.distance_to_surface,
                );
                debug_rays.record(
                    DebugRayGroup::SurfaceNormal,
                    entity.id,
                    data.point,
                    data.normal,
                    NORMAL_RAY_MAGNITUDE,
                );
                MovementIntent {
                    direction: result.direction,
                    speed: result.speed,
                    target_rotation: rotation,
                }
            }
        };

        debug_rays.record(
            DebugRayGroup::Direction,
            entity.id,
            entity.position,
            intent.direction,
            intent.speed,
        );
        intent
    }
}

fn clear_surface_rays(debug_rays: &mut DebugRays, id: EntityId) {
    debug_rays.clear(DebugRayGroup::BodySurface, id);
    debug_rays.clear(DebugRayGroup::SurfaceNormal, id);
}

fn ballistic_intent(resolution: &GravityResolution<'_>) -> MovementIntent {
    MovementIntent {
        direction: normalize_or(resolution.force, Vec3::ZERO),
        speed: sanitize_speed(resolution.force.length()),
        target_rotation: resolution.orientation_target,
    }
}

/// Sums the base intent as a force with gravity.
///
/// Input speed dominates while it outweighs gravity and never drops below
/// [`INPUT_SPEED_FLOOR`] of itself.
fn combine_with_gravity(
    id: EntityId,
    base: &MovementIntent,
    resolution: &GravityResolution<'_>,
) -> MovementIntent {
    if !base.speed.is_finite() || base.speed < 0.0 {
        warn!("{id} has invalid intent speed {}; using zero", base.speed);
    }
    let input_speed = sanitize_speed(base.speed);
    let input_direction = normalize_or(base.direction, Vec3::ZERO);
    let total = input_direction * input_speed + resolution.force;
    let force_magnitude = resolution.force.length();

    let weight_sum = input_speed + force_magnitude;
    let input_ratio = if weight_sum > 0.0 {
        input_speed / weight_sum
    } else {
        1.0
    };
    let preserved = (input_speed * input_ratio + total.length() * (1.0 - input_ratio))
        .max(input_speed * INPUT_SPEED_FLOOR);

    let target_rotation: Quat = if resolution.is_attracted() {
        resolution.orientation_target
    } else {
        base.target_rotation
    };
    MovementIntent {
        direction: normalize_or(total, input_direction),
        speed: sanitize_speed(preserved),
        target_rotation,
    }
}
