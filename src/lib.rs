#![cfg_attr(docsrs, feature(doc_cfg))]
//! Gravity-well movement physics for small planetoid scenes.
//!
//! Entities move under simplified multi-body gravity and are kept on, or
//! clear of, the surfaces of nearby bodies. Each tick the [`PhysicsManager`]
//! turns controller intents into corrected intents:
//!
//! 1. [`GravityResolver`] sums the pull of every body in range and proposes
//!    an "up" orientation opposing it.
//! 2. The base intent and gravity are combined.
//! 3. Near a body, [`SurfaceQueryCache`] supplies the surface point and
//!    normal and [`SurfaceConstraintSolver`] enforces clearance, follows the
//!    contour and applies slope speed changes, braking early when the
//!    [`collision::PredictiveCollisionChecker`] foresees penetration.
//! 4. [`SpeedSmoother`] limits per-tick speed changes.
//!
//! The [`plugin`] module adapts the manager to Bevy.
pub mod body;
pub mod clock;
pub mod collision;
pub mod config;
pub mod constants;
pub mod constraint;
pub mod debug_rays;
pub mod error;
pub mod geometry;
pub mod gravity;
pub mod intent;
pub mod logging;
pub mod manager;
pub mod plugin;
pub mod smoothing;
pub mod surface_cache;
pub mod vector_math;

// Re-export commonly used items
pub use body::{AttractingBody, BodyId, BodyShape, EntityId, MovingEntity};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{CachePolicy, OrientationPolicy, PhysicsConfig};
pub use constraint::{CandidateMotion, SurfaceConstraintResult, SurfaceConstraintSolver};
pub use debug_rays::{DebugRayGroup, DebugRays, RayStyle};
pub use error::{ConfigError, SceneError};
pub use geometry::{GeometryProvider, Ray, RayHit, ShapeRaycaster, TriangleMesh};
pub use gravity::{GravityResolution, GravityResolver};
pub use intent::{IntentManager, IntentMap, MovementIntent, RotationBlend};
pub use logging::init as init_logging;
pub use manager::{Locomotion, PhysicsManager};
pub use plugin::{BaseIntent, CorrectedIntent, GravwellPhysics, GravwellPlugin, Mover};
pub use smoothing::SpeedSmoother;
pub use surface_cache::{RaycastStats, SurfaceData, SurfaceQueryCache};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use gravwell::prelude::*;
    //! ```

    pub use crate::AttractingBody;
    pub use crate::BodyId;
    pub use crate::EntityId;
    pub use crate::IntentMap;
    pub use crate::MovementIntent;
    pub use crate::MovingEntity;
    pub use crate::PhysicsConfig;
    pub use crate::PhysicsManager;
    pub use glam::{Quat, Vec3};
}
