//! Instrumented [`GeometryProvider`]s.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use gravwell::{AttractingBody, GeometryProvider, Ray, RayHit, ShapeRaycaster};

/// Wraps [`ShapeRaycaster`] and counts raycasts.
///
/// Clones share the counter so a test can keep a handle after moving the
/// provider into a manager.
#[derive(Debug, Clone, Default)]
pub struct CountingGeometry {
    calls: Arc<AtomicUsize>,
}

impl CountingGeometry {
    /// Create a provider with a zeroed counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raycasts performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GeometryProvider for CountingGeometry {
    fn raycast(&self, body: &AttractingBody, ray: Ray) -> Option<RayHit> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ShapeRaycaster.raycast(body, ray)
    }
}

/// Returns whatever hit the test last scripted, ignoring the ray.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGeometry {
    hit: Arc<Mutex<Option<RayHit>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedGeometry {
    /// Create a provider that initially answers `hit`.
    pub fn new(hit: Option<RayHit>) -> Self {
        let geometry = Self::default();
        geometry.script(hit);
        geometry
    }

    /// Change the answer of subsequent raycasts.
    pub fn script(&self, hit: Option<RayHit>) {
        *self.hit.lock().unwrap_or_else(PoisonError::into_inner) = hit;
    }

    /// Raycasts performed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GeometryProvider for ScriptedGeometry {
    fn raycast(&self, _body: &AttractingBody, _ray: Ray) -> Option<RayHit> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.hit.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
