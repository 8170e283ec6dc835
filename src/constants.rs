//! Tuning constants for the gravity-well simulation.
//!
//! These values feed the defaults of [`crate::PhysicsConfig`]. The factors
//! without a config field are heuristics tuned for "playable" feel rather
//! than physical accuracy.

/// Gravitational constant used by the simplified Newtonian attraction.
pub const GRAVITATIONAL_CONSTANT: f32 = 19.6;
/// Attraction radius per unit of `scale * sqrt(mass)` of a body.
pub const ATTRACTION_RADIUS_FACTOR: f32 = 1.0;
/// Distances below this are treated as "at the centre" and ignored.
pub const MIN_ATTRACTION_DISTANCE: f32 = 1e-3;

/// Base clearance kept between an entity and a body surface.
pub const MIN_SURFACE_DISTANCE: f32 = 2.0;
/// Additional clearance per unit of speed.
pub const CLEARANCE_PER_SPEED: f32 = 0.1;
/// Distance to the nearest body centre within which surface constraints run.
pub const PROXIMITY_THRESHOLD: f32 = 100.0;
/// Distance to the surface within which the surface rotation is blended in.
pub const ROTATION_BLEND_DISTANCE: f32 = 4.0;

/// Tick rate assumed when extrapolating look-ahead positions.
pub const TICK_RATE_HZ: f32 = 60.0;
/// Upper bound on simulated look-ahead frames.
pub const MAX_LOOKAHEAD_FRAMES: u32 = 4;
/// Speed covered by each look-ahead frame before another one is added.
pub const LOOKAHEAD_SPEED_PER_FRAME: f32 = 5.0;

/// Lowest braking factor applied on a predicted collision.
pub const MIN_BRAKING_FACTOR: f32 = 0.3;
/// Weight of the normal-aligned avoidance term per unit of urgency.
pub const AVOIDANCE_WEIGHT: f32 = 0.5;

/// Weight of the quadratic repulsion term.
pub const REPULSION_WEIGHT: f32 = 0.2;
/// Speed that maps to a repulsion speed factor of one.
pub const REPULSION_REFERENCE_SPEED: f32 = 20.0;
/// Cap on the repulsion speed factor.
pub const MAX_REPULSION_SPEED_FACTOR: f32 = 2.0;
/// Lower bound of the proximity speed factor inside the clearance.
pub const MIN_PROXIMITY_FACTOR: f32 = 0.5;
/// Floor on constrained speed as a fraction of the pre-constraint speed.
pub const CONSTRAINED_SPEED_FLOOR: f32 = 0.3;

/// Maximum weight given to the tangent projection in the approach zone.
pub const CONTOUR_BLEND_WEIGHT: f32 = 0.7;
/// Largest relative speed change produced by a slope.
pub const MAX_SLOPE_EFFECT: f32 = 0.4;
/// Share of the slope effect removed when moving uphill.
pub const UPHILL_SLOWDOWN: f32 = 0.7;
/// Share of the slope effect added when moving downhill.
pub const DOWNHILL_BOOST: f32 = 1.25;
/// Dot product with world up beyond which motion counts as up- or downhill.
pub const SLOPE_DIRECTION_THRESHOLD: f32 = 0.1;
/// Lower clamp of the slope speed factor.
pub const MIN_SLOPE_FACTOR: f32 = 0.4;
/// Upper clamp of the slope speed factor.
pub const MAX_SLOPE_FACTOR: f32 = 1.6;
/// Speed above which the downhill bonus is damped.
pub const DOWNHILL_DAMPING_SPEED: f32 = 15.0;
/// Speed range over which the downhill damping ramps up.
pub const DOWNHILL_DAMPING_RANGE: f32 = 20.0;
/// Largest share of the downhill bonus removed at high speed.
pub const MAX_DOWNHILL_PENALTY: f32 = 0.5;
/// Weight of world up in the stabilised surface normal.
pub const SURFACE_UP_BIAS: f32 = 0.1;

/// Largest relative change of speed between two ticks.
pub const MAX_SPEED_CHANGE: f32 = 0.15;
/// Floor of the smoothed speed as a fraction of the constrained speed.
pub const SMOOTHING_FLOOR: f32 = 0.6;

/// Share of the input speed that gravity can never remove.
pub const INPUT_SPEED_FLOOR: f32 = 0.7;

/// Default time-to-live of a cached surface query in milliseconds.
pub const SURFACE_CACHE_TTL_MS: u64 = 50;
/// Shortest scheduled raycast interval (entity touching the surface).
pub const SCHEDULED_MIN_INTERVAL_MS: u64 = 50;
/// Longest scheduled raycast interval (entity far from the surface).
pub const SCHEDULED_MAX_INTERVAL_MS: u64 = 500;
/// Altitude at which the scheduled interval reaches its maximum.
pub const SCHEDULED_FAR_ALTITUDE: f32 = 50.0;
/// Weight moved toward the analytic normal on each fallback query.
pub const FALLBACK_NORMAL_BLEND: f32 = 0.1;
/// Ticks between two sweeps of expired cache entries.
pub const CLEANUP_INTERVAL_TICKS: u64 = 300;

/// Default per-tick orientation blend for the smoothed policy.
pub const ORIENTATION_MAX_BLEND: f32 = 0.15;

/// Lengths below this are treated as degenerate when normalising.
pub const DEGENERATE_LENGTH: f32 = 1e-6;
/// Projections shorter than this are considered to have vanished.
pub const MIN_PROJECTION_LENGTH: f32 = 0.01;
