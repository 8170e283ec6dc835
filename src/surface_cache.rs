//! Per-entity memoisation of surface queries.
//!
//! Raycasting against a body mesh is the most expensive operation of a tick.
//! [`SurfaceQueryCache`] bounds how often it runs with one of two policies:
//!
//! * [`CachePolicy::FixedTtl`] recomputes as soon as an entry expires.
//! * [`CachePolicy::Scheduled`] lets a single entity raycast per tick, in
//!   round-robin order, and answers everyone else from fresh entries or an
//!   analytic sphere estimate with a temporally smoothed normal.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use glam::Vec3;
use hashbrown::{HashMap, HashSet};
use log::debug;

use crate::body::{AttractingBody, BodyId, EntityId, MovingEntity};
use crate::config::CachePolicy;
use crate::constants::FALLBACK_NORMAL_BLEND;
use crate::geometry::{GeometryProvider, Ray};
use crate::vector_math::normalize_or;

/// Closest surface point and outward normal seen from an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceData {
    /// World-space point on the body surface.
    pub point: Vec3,
    /// Outward unit normal at `point`.
    pub normal: Vec3,
}

impl SurfaceData {
    /// Analytic estimate treating `body` as a sphere of its bounding radius.
    #[must_use]
    pub fn sphere_estimate(body: &AttractingBody, position: Vec3) -> Self {
        let normal = normalize_or(position - body.position, Vec3::Y);
        Self {
            point: body.position + normal * body.bounding_radius(),
            normal,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    data: SurfaceData,
    body: BodyId,
    /// Time of the raycast behind `data`; `None` for fallback-only entries.
    raycast_at: Option<Duration>,
    updated_at: Duration,
}

impl CacheEntry {
    fn is_fresh(&self, body: BodyId, now: Duration, window: Duration) -> bool {
        self.body == body
            && self
                .raycast_at
                .is_some_and(|at| now.saturating_sub(at) < window)
    }
}

/// Counters describing how surface queries were answered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RaycastStats {
    /// Queries that reached the geometry provider.
    pub true_raycasts: u64,
    /// Raycasts that found no surface.
    pub raycast_misses: u64,
    /// Queries answered from a fresh entry.
    pub cache_hits: u64,
    /// Queries answered by the analytic estimate.
    pub fallbacks: u64,
    /// Wall-clock time spent inside the geometry provider.
    pub total_raycast_time: Duration,
}

impl RaycastStats {
    /// Total queries answered.
    #[must_use]
    pub const fn total_queries(&self) -> u64 {
        self.true_raycasts + self.cache_hits + self.fallbacks
    }

    /// Fraction of queries served without raycasting.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "Counters are reported as an approximate ratio."
    )]
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_queries();
        if total == 0 {
            0.0
        } else {
            (self.cache_hits + self.fallbacks) as f64 / total as f64
        }
    }

    /// Mean duration of a raycast.
    #[must_use]
    pub fn average_raycast_time(&self) -> Duration {
        u32::try_from(self.true_raycasts)
            .ok()
            .filter(|count| *count > 0)
            .map_or(Duration::ZERO, |count| self.total_raycast_time / count)
    }
}

/// Surface query memoisation keyed by [`EntityId`].
#[derive(Debug, Clone)]
pub struct SurfaceQueryCache {
    policy: CachePolicy,
    entries: HashMap<EntityId, CacheEntry>,
    schedule: VecDeque<EntityId>,
    scheduled: HashSet<EntityId>,
    raycast_grant: Option<EntityId>,
    stats: RaycastStats,
}

impl Default for SurfaceQueryCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl SurfaceQueryCache {
    /// Creates an empty cache using `policy`.
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
            schedule: VecDeque::new(),
            scheduled: HashSet::new(),
            raycast_grant: None,
            stats: RaycastStats::default(),
        }
    }

    /// Active staleness policy.
    #[must_use]
    pub const fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Query statistics since construction or the last reset.
    #[must_use]
    pub const fn stats(&self) -> &RaycastStats {
        &self.stats
    }

    /// Zeroes the statistics.
    pub fn reset_stats(&mut self) {
        self.stats = RaycastStats::default();
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entity allowed to raycast during the current tick, if any.
    #[must_use]
    pub const fn raycast_grant(&self) -> Option<EntityId> {
        self.raycast_grant
    }

    /// Starts a tick. Under the scheduled policy the next entity in
    /// round-robin order receives this tick's raycast.
    pub fn begin_tick(&mut self) {
        if !matches!(self.policy, CachePolicy::Scheduled { .. }) {
            return;
        }
        self.raycast_grant = self.schedule.pop_front();
        if let Some(id) = self.raycast_grant {
            self.schedule.push_back(id);
        }
    }

    /// Returns the surface seen by `entity` on `body`.
    ///
    /// `None` means the geometry provider found no surface along the ray
    /// toward the body centre; no constraint applies this tick.
    pub fn query(
        &mut self,
        entity: &MovingEntity,
        body: &AttractingBody,
        geometry: &dyn GeometryProvider,
        now: Duration,
    ) -> Option<SurfaceData> {
        match self.policy {
            CachePolicy::FixedTtl { ttl_ms } => {
                let window = Duration::from_millis(ttl_ms);
                if let Some(data) = self.fresh(entity.id, body.id, now, window) {
                    return Some(data);
                }
                self.raycast(entity, body, geometry, now)
            }
            CachePolicy::Scheduled {
                min_interval_ms,
                max_interval_ms,
                far_altitude,
            } => {
                if self.scheduled.insert(entity.id) {
                    self.schedule.push_back(entity.id);
                }
                let altitude =
                    (entity.position.distance(body.position) - body.bounding_radius()).max(0.0);
                let remoteness = (altitude / far_altitude).clamp(0.0, 1.0);
                let min = Duration::from_millis(min_interval_ms);
                let max = Duration::from_millis(max_interval_ms);
                let window = min + max.saturating_sub(min).mul_f32(remoteness);
                if let Some(data) = self.fresh(entity.id, body.id, now, window) {
                    return Some(data);
                }
                if self.raycast_grant == Some(entity.id) {
                    self.raycast_grant = None;
                    return self.raycast(entity, body, geometry, now);
                }
                Some(self.fallback(entity, body, now))
            }
        }
    }

    /// Best available surface estimate for a hypothetical `position`.
    ///
    /// Never raycasts and never writes. Uses the entity's latest entry for
    /// `body` when there is one, otherwise the analytic sphere estimate.
    #[must_use]
    pub fn lookahead(&self, id: EntityId, body: &AttractingBody, position: Vec3) -> SurfaceData {
        self.entries
            .get(&id)
            .filter(|entry| entry.body == body.id)
            .map_or_else(
                || SurfaceData::sphere_estimate(body, position),
                |entry| entry.data,
            )
    }

    /// Drops entries not updated for twice the policy's cache duration,
    /// along with the raycast slots of entities left without an entry.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self, now: Duration) -> usize {
        let horizon = self.policy.cache_duration() * 2;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_sub(entry.updated_at) <= horizon);
        let entries = &self.entries;
        self.schedule.retain(|id| entries.contains_key(id));
        self.scheduled.retain(|id| entries.contains_key(id));
        if self
            .raycast_grant
            .is_some_and(|id| !entries.contains_key(&id))
        {
            self.raycast_grant = None;
        }
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!("surface cache purged {removed} expired entries");
        }
        removed
    }

    /// Forgets everything known about `id`.
    pub fn release(&mut self, id: EntityId) {
        self.entries.remove(&id);
        self.schedule.retain(|queued| *queued != id);
        self.scheduled.remove(&id);
        if self.raycast_grant == Some(id) {
            self.raycast_grant = None;
        }
    }

    fn fresh(
        &mut self,
        id: EntityId,
        body: BodyId,
        now: Duration,
        window: Duration,
    ) -> Option<SurfaceData> {
        let entry = self.entries.get(&id)?;
        if entry.is_fresh(body, now, window) {
            self.stats.cache_hits += 1;
            Some(entry.data)
        } else {
            None
        }
    }

    fn raycast(
        &mut self,
        entity: &MovingEntity,
        body: &AttractingBody,
        geometry: &dyn GeometryProvider,
        now: Duration,
    ) -> Option<SurfaceData> {
        let Some(ray) = Ray::towards(entity.position, body.position) else {
            debug!("{} sits at the centre of {}; no surface ray", entity.id, body.id);
            self.entries.remove(&entity.id);
            return None;
        };
        let started = Instant::now();
        let outcome = geometry.raycast(body, ray);
        self.stats.total_raycast_time += started.elapsed();
        self.stats.true_raycasts += 1;

        let Some(hit) = outcome else {
            self.stats.raycast_misses += 1;
            debug!("raycast from {} found no surface on {}", entity.id, body.id);
            self.entries.remove(&entity.id);
            return None;
        };
        let data = SurfaceData {
            point: hit.point,
            normal: hit.normal,
        };
        self.entries.insert(
            entity.id,
            CacheEntry {
                data,
                body: body.id,
                raycast_at: Some(now),
                updated_at: now,
            },
        );
        Some(data)
    }

    fn fallback(
        &mut self,
        entity: &MovingEntity,
        body: &AttractingBody,
        now: Duration,
    ) -> SurfaceData {
        self.stats.fallbacks += 1;
        let estimate = SurfaceData::sphere_estimate(body, entity.position);
        let previous = self.entries.get(&entity.id).filter(|entry| entry.body == body.id);
        let normal = previous.map_or(estimate.normal, |entry| {
            normalize_or(
                entry.data.normal.lerp(estimate.normal, FALLBACK_NORMAL_BLEND),
                estimate.normal,
            )
        });
        let raycast_at = previous.and_then(|entry| entry.raycast_at);
        let data = SurfaceData {
            point: estimate.point,
            normal,
        };
        self.entries.insert(
            entity.id,
            CacheEntry {
                data,
                body: body.id,
                raycast_at,
                updated_at: now,
            },
        );
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ShapeRaycaster;
    use rstest::{fixture, rstest};

    #[fixture]
    fn moon() -> AttractingBody {
        AttractingBody::sphere(BodyId(1), Vec3::ZERO, 100.0, 10.0)
    }

    fn walker(id: u64, position: Vec3) -> MovingEntity {
        MovingEntity::new(EntityId(id), position, 1.0)
    }

    #[rstest]
    fn fixed_ttl_hits_then_expires(moon: AttractingBody) {
        let mut cache = SurfaceQueryCache::new(CachePolicy::FixedTtl { ttl_ms: 50 });
        let entity = walker(1, Vec3::new(0.0, 15.0, 0.0));
        let first = cache.query(&entity, &moon, &ShapeRaycaster, Duration::ZERO);
        let second = cache.query(&entity, &moon, &ShapeRaycaster, Duration::from_millis(49));
        assert_eq!(first, second);
        assert_eq!(cache.stats().cache_hits, 1);
        assert_eq!(cache.stats().true_raycasts, 1);

        cache.query(&entity, &moon, &ShapeRaycaster, Duration::from_millis(50));
        assert_eq!(cache.stats().true_raycasts, 2);
    }

    #[rstest]
    fn switching_body_is_a_miss(moon: AttractingBody) {
        let mut cache = SurfaceQueryCache::default();
        let entity = walker(1, Vec3::new(0.0, 15.0, 0.0));
        let other = AttractingBody::sphere(BodyId(2), Vec3::new(0.0, 40.0, 0.0), 100.0, 10.0);
        cache.query(&entity, &moon, &ShapeRaycaster, Duration::ZERO);
        let data = cache
            .query(&entity, &other, &ShapeRaycaster, Duration::ZERO)
            .expect("surface of second body");
        assert!(data.normal.y < -0.99);
        assert_eq!(cache.stats().true_raycasts, 2);
    }

    #[rstest]
    fn scheduled_policy_grants_one_raycast_per_tick(moon: AttractingBody) {
        let mut cache = SurfaceQueryCache::new(CachePolicy::scheduled());
        let entities: Vec<_> = (0..3)
            .map(|i| walker(i, Vec3::new(0.0, 12.0 + i as f32, 0.0)))
            .collect();
        // Registration tick: nobody is scheduled yet.
        cache.begin_tick();
        for entity in &entities {
            cache.query(entity, &moon, &ShapeRaycaster, Duration::ZERO);
        }
        assert_eq!(cache.stats().true_raycasts, 0);
        assert_eq!(cache.stats().fallbacks, 3);

        for tick in 1..=3_u64 {
            cache.begin_tick();
            let now = Duration::from_millis(tick);
            for entity in &entities {
                cache.query(entity, &moon, &ShapeRaycaster, now);
            }
            assert_eq!(cache.stats().true_raycasts, tick);
        }
    }

    #[rstest]
    fn fallback_normal_moves_gradually(moon: AttractingBody) {
        let mut cache = SurfaceQueryCache::new(CachePolicy::scheduled());
        let mut entity = walker(1, Vec3::new(0.0, 12.0, 0.0));
        cache.query(&entity, &moon, &ShapeRaycaster, Duration::ZERO);
        entity.position = Vec3::new(12.0, 0.0, 0.0);
        let data = cache.query(&entity, &moon, &ShapeRaycaster, Duration::from_millis(1));
        let normal = data.expect("fallback").normal;
        assert!(normal.y > 0.85 && normal.x > 0.05, "normal {normal:?}");
    }

    #[rstest]
    fn cleanup_purges_old_entries_only(moon: AttractingBody) {
        let mut cache = SurfaceQueryCache::new(CachePolicy::FixedTtl { ttl_ms: 50 });
        cache.query(&walker(1, Vec3::Y * 20.0), &moon, &ShapeRaycaster, Duration::ZERO);
        cache.query(
            &walker(2, Vec3::X * 20.0),
            &moon,
            &ShapeRaycaster,
            Duration::from_millis(80),
        );
        assert_eq!(cache.cleanup_expired(Duration::from_millis(101)), 1);
        assert_eq!(cache.len(), 1);
    }

    #[rstest]
    fn purged_entities_lose_their_raycast_slot(moon: AttractingBody) {
        let mut cache = SurfaceQueryCache::new(CachePolicy::scheduled());
        let gone = walker(1, Vec3::Y * 12.0);
        let staying = walker(2, Vec3::X * 12.0);
        cache.query(&gone, &moon, &ShapeRaycaster, Duration::ZERO);
        cache.query(&staying, &moon, &ShapeRaycaster, Duration::ZERO);
        cache.begin_tick();
        assert_eq!(cache.raycast_grant(), Some(gone.id));

        let later = Duration::from_secs(2);
        assert_eq!(cache.cleanup_expired(later), 2);
        assert_eq!(cache.raycast_grant(), None);

        let mut grants = Vec::new();
        for tick in 1..=10_u64 {
            cache.begin_tick();
            grants.extend(cache.raycast_grant());
            let now = later + Duration::from_millis(tick * 100);
            cache.query(&staying, &moon, &ShapeRaycaster, now);
        }
        assert!(!grants.contains(&gone.id));
        assert_eq!(grants.len(), 9);
        assert_eq!(cache.stats().true_raycasts, 9);
    }

    #[rstest]
    fn release_forgets_entity(moon: AttractingBody) {
        let mut cache = SurfaceQueryCache::new(CachePolicy::scheduled());
        let entity = walker(9, Vec3::Y * 20.0);
        cache.query(&entity, &moon, &ShapeRaycaster, Duration::ZERO);
        cache.release(entity.id);
        assert!(cache.is_empty());
        cache.begin_tick();
        assert_eq!(cache.raycast_grant(), None);
    }

    #[rstest]
    fn stats_report_hit_rate() {
        let stats = RaycastStats {
            true_raycasts: 1,
            cache_hits: 2,
            fallbacks: 1,
            total_raycast_time: Duration::from_micros(30),
            ..RaycastStats::default()
        };
        assert!((stats.hit_rate() - 0.75).abs() < 1e-9);
        assert_eq!(stats.average_raycast_time(), Duration::from_micros(30));
    }
}
