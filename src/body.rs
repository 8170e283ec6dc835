//! Scene participants: attracting bodies and moving entities.
//!
//! Bodies are static or quasi-static gravity sources carrying a surface shape
//! for raycasting. Moving entities are anything gravity acts upon. Both are
//! plain data; the physics manager owns all per-entity side state.

use std::fmt;
use std::sync::Arc;

use glam::{Quat, Vec3};

use crate::constants::ATTRACTION_RADIUS_FACTOR;
use crate::error::SceneError;
use crate::geometry::TriangleMesh;

/// Stable identifier of a moving entity.
///
/// Used as the key of every per-entity side table. Integration layers map
/// their own handles onto it, for example Bevy's `Entity::to_bits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Stable identifier of an attracting body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Surface geometry of a body in its local frame, before `scale` is applied.
#[derive(Debug, Clone)]
pub enum BodyShape {
    /// Analytic sphere centred on the body origin.
    Sphere {
        /// Local radius.
        radius: f32,
    },
    /// Triangle mesh shared between bodies that use the same model.
    Mesh(Arc<TriangleMesh>),
}

impl BodyShape {
    /// Radius of a sphere around the local origin enclosing the shape.
    #[must_use]
    pub fn local_bounding_radius(&self) -> f32 {
        match self {
            Self::Sphere { radius } => *radius,
            Self::Mesh(mesh) => mesh.bounding_radius(),
        }
    }
}

/// A gravity source with a surface.
#[derive(Debug, Clone)]
pub struct AttractingBody {
    /// Identifier used for cache bookkeeping.
    pub id: BodyId,
    /// World-space centre.
    pub position: Vec3,
    /// World-space orientation of the shape.
    pub rotation: Quat,
    /// Mass in simulation units.
    pub mass: f32,
    /// Uniform scale applied to the shape.
    pub scale: f32,
    /// Surface geometry.
    pub shape: BodyShape,
}

impl AttractingBody {
    /// Creates a spherical body with unit local radius scaled by `scale`.
    #[must_use]
    pub const fn sphere(id: BodyId, position: Vec3, mass: f32, scale: f32) -> Self {
        Self {
            id,
            position,
            rotation: Quat::IDENTITY,
            mass,
            scale,
            shape: BodyShape::Sphere { radius: 1.0 },
        }
    }

    /// Creates a body whose surface is `mesh`.
    #[must_use]
    pub const fn with_mesh(
        id: BodyId,
        position: Vec3,
        mass: f32,
        scale: f32,
        mesh: Arc<TriangleMesh>,
    ) -> Self {
        Self {
            id,
            position,
            rotation: Quat::IDENTITY,
            mass,
            scale,
            shape: BodyShape::Mesh(mesh),
        }
    }

    /// Distance from the centre beyond which the body exerts no force.
    ///
    /// Grows with `scale` and the square root of `mass`, so larger and
    /// denser bodies pull from further away.
    ///
    /// ```
    /// use glam::Vec3;
    /// use gravwell::{AttractingBody, BodyId};
    /// let moon = AttractingBody::sphere(BodyId(1), Vec3::ZERO, 100.0, 10.0);
    /// assert_eq!(moon.attraction_radius(), 100.0);
    /// ```
    #[must_use]
    pub fn attraction_radius(&self) -> f32 {
        self.scale * self.mass.max(0.0).sqrt() * ATTRACTION_RADIUS_FACTOR
    }

    /// World-space radius of a sphere enclosing the surface.
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        self.shape.local_bounding_radius() * self.scale
    }

    /// Converts a world-space point into the body's unscaled local frame.
    #[must_use]
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.rotation.inverse() * (world - self.position) / self.scale
    }

    /// Converts a local-frame point into world space.
    #[must_use]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * (local * self.scale)
    }

    /// Checks that mass and scale are finite and positive.
    ///
    /// # Errors
    /// Returns [`SceneError::InvalidBodyMass`] or
    /// [`SceneError::InvalidBodyScale`] naming this body.
    pub fn validate(&self) -> Result<(), SceneError> {
        if !self.mass.is_finite() || self.mass <= 0.0 {
            return Err(SceneError::InvalidBodyMass {
                id: self.id,
                mass: self.mass,
            });
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(SceneError::InvalidBodyScale {
                id: self.id,
                scale: self.scale,
            });
        }
        Ok(())
    }
}

/// Anything gravity and the surface constraints act upon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovingEntity {
    /// Cache and throttle key.
    pub id: EntityId,
    /// World-space position.
    pub position: Vec3,
    /// Current orientation.
    pub rotation: Quat,
    /// Mass in simulation units.
    pub mass: f32,
    /// Excludes the entity from the physics core entirely.
    pub ignore_physics: bool,
}

impl MovingEntity {
    /// Creates an entity with identity rotation that takes part in physics.
    #[must_use]
    pub const fn new(id: EntityId, position: Vec3, mass: f32) -> Self {
        Self {
            id,
            position,
            rotation: Quat::IDENTITY,
            mass,
            ignore_physics: false,
        }
    }

    /// Returns the entity with `ignore_physics` set.
    #[must_use]
    pub const fn ignoring_physics(mut self) -> Self {
        self.ignore_physics = true;
        self
    }
}
