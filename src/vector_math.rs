//! Basic vector math helper functions.
//! Degenerate-safe normalisation, tangent-plane projection and up-alignment.
use glam::{Quat, Vec3};

use crate::constants::DEGENERATE_LENGTH;

/// Returns the unit vector in the direction of `vector`, or `None`.
///
/// The function checks that all components are finite and the vector is
/// longer than [`DEGENERATE_LENGTH`] before normalising.
///
/// # Examples
///
/// ```
/// use glam::Vec3;
/// use gravwell::vector_math::safe_normalize;
/// let unit = safe_normalize(Vec3::new(3.0, 0.0, 4.0)).unwrap();
/// assert!((unit.x - 0.6).abs() < 1e-6);
/// assert!((unit.z - 0.8).abs() < 1e-6);
///
/// assert!(safe_normalize(Vec3::ZERO).is_none());
/// ```
#[must_use]
pub fn safe_normalize(vector: Vec3) -> Option<Vec3> {
    if !vector.is_finite() || vector.length_squared() <= DEGENERATE_LENGTH * DEGENERATE_LENGTH {
        return None;
    }
    vector.try_normalize()
}

/// Normalises `vector`, returning `fallback` when it is degenerate.
#[must_use]
pub fn normalize_or(vector: Vec3, fallback: Vec3) -> Vec3 {
    safe_normalize(vector).unwrap_or(fallback)
}

/// Removes the component of `vector` parallel to `normal`.
///
/// `normal` is expected to be unit length.
///
/// # Examples
///
/// ```
/// use glam::Vec3;
/// use gravwell::vector_math::project_on_plane;
/// let tangent = project_on_plane(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
/// assert_eq!(tangent, Vec3::X);
/// ```
#[must_use]
pub fn project_on_plane(vector: Vec3, normal: Vec3) -> Vec3 {
    vector - normal * vector.dot(normal)
}

/// Removes only the component of `vector` that points into the surface.
///
/// Motion away from the surface is left untouched.
#[must_use]
pub fn remove_inward_component(vector: Vec3, normal: Vec3) -> Vec3 {
    let along = vector.dot(normal);
    if along < 0.0 {
        vector - normal * along
    } else {
        vector
    }
}

/// Rotation mapping world up onto `up`.
///
/// Returns the identity when `up` is degenerate.
#[must_use]
pub fn rotation_from_up(up: Vec3) -> Quat {
    safe_normalize(up).map_or(Quat::IDENTITY, |unit| Quat::from_rotation_arc(Vec3::Y, unit))
}

/// Returns `value` when finite and non-negative, otherwise zero.
#[must_use]
pub fn sanitize_speed(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
