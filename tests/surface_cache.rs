//! Surface query cache behaviour against a mocked geometry provider.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use glam::Vec3;
use gravwell::{
    AttractingBody, CachePolicy, GeometryProvider, Ray, RayHit, ShapeRaycaster, SurfaceQueryCache,
};
use mockall::mock;
use rstest::{fixture, rstest};
use test_utils::{entity, moon};

mock! {
    pub Geometry {}
    impl GeometryProvider for Geometry {
        fn raycast(&self, body: &AttractingBody, ray: Ray) -> Option<RayHit>;
    }
}

#[fixture]
fn body() -> AttractingBody {
    moon(1, Vec3::ZERO)
}

fn hit(point: Vec3, normal: Vec3) -> RayHit {
    RayHit {
        point,
        normal,
        distance: 0.0,
    }
}

#[rstest]
fn queries_within_ttl_are_bit_identical(body: AttractingBody) {
    let mut geometry = MockGeometry::new();
    geometry
        .expect_raycast()
        .times(1)
        .returning(|_, _| {
            let normal = Vec3::new(0.01, 1.0, 0.02).normalize();
            Some(hit(Vec3::new(0.1, 10.0, 0.2), normal))
        });
    let mut cache = SurfaceQueryCache::new(CachePolicy::FixedTtl { ttl_ms: 50 });
    let walker = entity(1, Vec3::new(0.0, 14.0, 0.0));

    let first = cache
        .query(&walker, &body, &geometry, Duration::from_millis(100))
        .expect("surface");
    let second = cache
        .query(&walker, &body, &geometry, Duration::from_millis(130))
        .expect("surface");

    let bits = |v: Vec3| v.to_array().map(f32::to_bits);
    assert_eq!(bits(first.point), bits(second.point));
    assert_eq!(bits(first.normal), bits(second.normal));
}

#[rstest]
fn expired_entries_reflect_new_provider_results(body: AttractingBody) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut geometry = MockGeometry::new();
    geometry.expect_raycast().times(2).returning(move |_, _| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Some(hit(Vec3::new(0.0, 10.0, 0.0), Vec3::Y))
        } else {
            Some(hit(Vec3::new(0.0, 9.0, 0.0), Vec3::X))
        }
    });
    let mut cache = SurfaceQueryCache::new(CachePolicy::FixedTtl { ttl_ms: 50 });
    let walker = entity(1, Vec3::new(0.0, 14.0, 0.0));

    cache.query(&walker, &body, &geometry, Duration::ZERO);
    let refreshed = cache
        .query(&walker, &body, &geometry, Duration::from_millis(51))
        .expect("surface");

    assert_eq!(refreshed.point, Vec3::new(0.0, 9.0, 0.0));
    assert_eq!(refreshed.normal, Vec3::X);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[rstest]
fn provider_miss_means_no_surface(body: AttractingBody) {
    let mut geometry = MockGeometry::new();
    geometry.expect_raycast().times(1).returning(|_, _| None);
    let mut cache = SurfaceQueryCache::default();
    let walker = entity(3, Vec3::new(0.0, 14.0, 0.0));

    assert!(cache.query(&walker, &body, &geometry, Duration::ZERO).is_none());
    assert_eq!(cache.stats().raycast_misses, 1);
    assert!(cache.is_empty());
}

#[rstest]
fn rays_point_from_entity_to_body_centre(body: AttractingBody) {
    let mut geometry = MockGeometry::new();
    geometry
        .expect_raycast()
        .withf(|_, ray| {
            ray.origin == Vec3::new(0.0, 0.0, 30.0) && ray.direction.abs_diff_eq(Vec3::NEG_Z, 1e-6)
        })
        .times(1)
        .returning(|_, _| Some(hit(Vec3::new(0.0, 0.0, 10.0), Vec3::Z)));
    let mut cache = SurfaceQueryCache::default();

    cache.query(&entity(4, Vec3::new(0.0, 0.0, 30.0)), &body, &geometry, Duration::ZERO);
}

#[rstest]
fn scheduled_policy_never_exceeds_one_raycast_per_tick(body: AttractingBody) {
    let mut cache = SurfaceQueryCache::new(CachePolicy::scheduled());
    let walkers: Vec<_> = (0..5)
        .map(|i| entity(i, Vec3::new(0.0, 11.0, 0.0) + Vec3::X * i as f32))
        .collect();

    let mut previous = 0;
    for tick in 0..40_u64 {
        cache.begin_tick();
        let now = Duration::from_millis(tick * 16);
        for walker in &walkers {
            assert!(cache.query(walker, &body, &ShapeRaycaster, now).is_some());
        }
        let raycasts = cache.stats().true_raycasts;
        assert!(raycasts - previous <= 1, "tick {tick} raycast {} times", raycasts - previous);
        previous = raycasts;
    }
    assert!(cache.stats().true_raycasts >= 5, "every walker got a turn");
    assert!(cache.stats().fallbacks > 0);
}

#[rstest]
fn scheduled_interval_grows_with_altitude(body: AttractingBody) {
    let mut cache = SurfaceQueryCache::new(CachePolicy::scheduled());
    let near = entity(1, Vec3::new(0.0, 11.0, 0.0));
    let far = entity(2, Vec3::new(0.0, 70.0, 0.0));

    // Registration tick, then one raycast each.
    cache.begin_tick();
    cache.query(&near, &body, &ShapeRaycaster, Duration::ZERO);
    cache.query(&far, &body, &ShapeRaycaster, Duration::ZERO);
    for _ in 0..2 {
        cache.begin_tick();
        cache.query(&near, &body, &ShapeRaycaster, Duration::ZERO);
        cache.query(&far, &body, &ShapeRaycaster, Duration::ZERO);
    }
    assert_eq!(cache.stats().true_raycasts, 2);

    // 200 ms later only the far entity's entry is still fresh.
    let hits_before = cache.stats().cache_hits;
    let later = Duration::from_millis(200);
    cache.query(&near, &body, &ShapeRaycaster, later);
    cache.query(&far, &body, &ShapeRaycaster, later);
    assert_eq!(cache.stats().cache_hits - hits_before, 1);
}
