//! Surface raycasting against attracting bodies.
//!
//! The physics core only needs "closest point and outward normal along a ray
//! toward the body". [`GeometryProvider`] is the seam for that query;
//! [`ShapeRaycaster`] answers it for analytic spheres and triangle meshes.

use glam::Vec3;

use crate::body::{AttractingBody, BodyShape};
use crate::error::SceneError;
use crate::vector_math::{normalize_or, safe_normalize};

const DETERMINANT_EPSILON: f32 = 1e-8;

/// Half-line with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Start of the ray.
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    /// Builds a ray, normalising `direction`.
    ///
    /// Returns `None` when `direction` is degenerate.
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        safe_normalize(direction).map(|unit| Self {
            origin,
            direction: unit,
        })
    }

    /// Ray from `origin` pointing at `target`.
    #[must_use]
    pub fn towards(origin: Vec3, target: Vec3) -> Option<Self> {
        Self::new(origin, target - origin)
    }

    /// Point at parameter `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Result of a successful surface query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space hit point.
    pub point: Vec3,
    /// Outward unit normal at the hit point.
    pub normal: Vec3,
    /// Distance from the ray origin to `point`.
    pub distance: f32,
}

/// Answers surface queries against a single body.
///
/// Implementations must be synchronous and bounded. Returning `None` means
/// "no surface along this ray" and is not an error.
pub trait GeometryProvider: Send + Sync {
    /// Finds the surface of `body` along `ray`.
    ///
    /// When the ray origin lies below the surface, the surface point directly
    /// behind the origin is reported so callers always see the surface on
    /// the origin's side of the body.
    fn raycast(&self, body: &AttractingBody, ray: Ray) -> Option<RayHit>;
}

/// Indexed triangle mesh in a body's local frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    bounding_radius: f32,
}

impl TriangleMesh {
    /// Creates a mesh, checking that every index refers to a vertex.
    ///
    /// Triangles are expected to wind counter-clockwise when seen from
    /// outside, so face normals point outward.
    ///
    /// # Errors
    /// Returns [`SceneError::InvalidMeshIndex`] for the first bad index.
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Result<Self, SceneError> {
        for (triangle, corners) in triangles.iter().enumerate() {
            for &index in corners {
                let in_range = usize::try_from(index).is_ok_and(|i| i < vertices.len());
                if !in_range {
                    return Err(SceneError::InvalidMeshIndex {
                        triangle,
                        index,
                        vertex_count: vertices.len(),
                    });
                }
            }
        }
        let bounding_radius = vertices.iter().map(|v| v.length()).fold(0.0_f32, f32::max);
        Ok(Self {
            vertices,
            triangles,
            bounding_radius,
        })
    }

    /// Latitude/longitude sphere of `radius`.
    ///
    /// Pole rows repeat the pole vertex, so the first and last rings contain
    /// zero-area triangles.
    ///
    /// # Errors
    /// Propagates [`TriangleMesh::new`] errors; with at least three segments
    /// and two rings none occur.
    #[expect(
        clippy::cast_precision_loss,
        reason = "Ring and segment counts are small."
    )]
    pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Result<Self, SceneError> {
        let columns = segments.max(3);
        let rows = rings.max(2);
        let mut vertices = Vec::new();
        for ring in 0..=rows {
            let theta = std::f32::consts::PI * ring as f32 / rows as f32;
            for segment in 0..columns {
                let phi = std::f32::consts::TAU * segment as f32 / columns as f32;
                vertices.push(
                    Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin())
                        * radius,
                );
            }
        }
        let mut triangles = Vec::new();
        for ring in 0..rows {
            for segment in 0..columns {
                let next = (segment + 1) % columns;
                let a = ring * columns + segment;
                let b = ring * columns + next;
                let c = (ring + 1) * columns + segment;
                let d = (ring + 1) * columns + next;
                triangles.push([a, b, c]);
                triangles.push([b, d, c]);
            }
        }
        Self::new(vertices, triangles)
    }

    /// Largest vertex distance from the local origin.
    #[must_use]
    pub const fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    fn corners(&self) -> impl Iterator<Item = (Vec3, Vec3, Vec3)> + '_ {
        self.triangles.iter().filter_map(|&[a, b, c]| {
            let fetch = |i: u32| usize::try_from(i).ok().and_then(|i| self.vertices.get(i));
            Some((*fetch(a)?, *fetch(b)?, *fetch(c)?))
        })
    }

    /// Intersects the infinite line through `ray` with every triangle.
    ///
    /// Yields `(t, face_normal)` where the normal falls back to the radial
    /// direction of the hit when the face is too thin to define one.
    fn line_hits(&self, ray: Ray) -> impl Iterator<Item = (f32, Vec3)> + '_ {
        self.corners().filter_map(move |(v0, v1, v2)| {
            let t = moller_trumbore(ray, v0, v1, v2)?;
            let radial = normalize_or(ray.at(t), Vec3::Y);
            let normal = safe_normalize((v1 - v0).cross(v2 - v0)).unwrap_or(radial);
            Some((t, normal))
        })
    }

    fn raycast_local(&self, ray: Ray) -> Option<(f32, Vec3)> {
        // Bounding sphere rejection.
        let closest = ray.origin - ray.direction * ray.origin.dot(ray.direction);
        if closest.length_squared() > self.bounding_radius * self.bounding_radius {
            return None;
        }

        let front = self
            .line_hits(ray)
            .filter(|(_, normal)| normal.dot(ray.direction) < 0.0)
            .min_by(|a, b| a.0.abs().total_cmp(&b.0.abs()));
        if front.is_some() {
            return front;
        }
        // Inconsistent winding: take the nearest hit ahead and face it
        // against the ray.
        self.line_hits(ray)
            .filter(|(t, _)| *t >= 0.0)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(t, normal)| {
                if normal.dot(ray.direction) > 0.0 {
                    (t, -normal)
                } else {
                    (t, normal)
                }
            })
    }
}

fn moller_trumbore(ray: Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < DETERMINANT_EPSILON {
        return None;
    }
    let inv_det = det.recip();
    let s = ray.origin - v0;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    Some(edge2.dot(q) * inv_det)
}

fn raycast_sphere(body: &AttractingBody, radius: f32, ray: Ray) -> Option<RayHit> {
    let world_radius = radius * body.scale;
    let offset = ray.origin - body.position;
    let b = offset.dot(ray.direction);
    let c = offset.length_squared() - world_radius * world_radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 || (c > 0.0 && b > 0.0) {
        return None;
    }
    // Near root: ahead when outside, behind when the origin is below the surface.
    let t = -b - discriminant.sqrt();
    let point = ray.at(t);
    let normal = normalize_or(point - body.position, -ray.direction);
    Some(RayHit {
        point,
        normal,
        distance: t.abs(),
    })
}

fn raycast_mesh(body: &AttractingBody, mesh: &TriangleMesh, ray: Ray) -> Option<RayHit> {
    let local_ray = Ray::new(
        body.to_local(ray.origin),
        body.rotation.inverse() * ray.direction,
    )?;
    let (t, local_normal) = mesh.raycast_local(local_ray)?;
    let point = body.to_world(local_ray.at(t));
    Some(RayHit {
        point,
        normal: normalize_or(body.rotation * local_normal, -ray.direction),
        distance: point.distance(ray.origin),
    })
}

/// Default [`GeometryProvider`] handling every [`BodyShape`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ShapeRaycaster;

impl GeometryProvider for ShapeRaycaster {
    fn raycast(&self, body: &AttractingBody, ray: Ray) -> Option<RayHit> {
        match &body.shape {
            BodyShape::Sphere { radius } => raycast_sphere(body, *radius, ray),
            BodyShape::Mesh(mesh) => raycast_mesh(body, mesh, ray),
        }
    }
}
