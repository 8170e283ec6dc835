//! Read-only debug rays describing the last tick.
//!
//! The manager records, per entity, the raw gravity vector, the corrected
//! travel direction, the link to the surface point and the surface normal.
//! A renderer may draw them; nothing here feeds back into physics.

use glam::Vec3;
use hashbrown::HashMap;

use crate::body::EntityId;
use crate::vector_math::safe_normalize;

/// Category of debug ray.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugRayGroup {
    /// Net gravitational force.
    Gravity,
    /// Corrected travel direction scaled by speed.
    Direction,
    /// Link from the entity to its surface point.
    BodySurface,
    /// Surface normal at the surface point.
    SurfaceNormal,
}

impl DebugRayGroup {
    /// Every group.
    pub const ALL: [Self; 4] = [
        Self::Gravity,
        Self::Direction,
        Self::BodySurface,
        Self::SurfaceNormal,
    ];

    /// Default drawing style of the group.
    #[must_use]
    pub const fn default_style(self) -> RayStyle {
        match self {
            Self::Gravity => RayStyle::new(0x00ff_0000, 10.0, 50.0, 0.8),
            Self::Direction => RayStyle::new(0x0000_ff00, 10.0, 30.0, 0.9),
            Self::BodySurface => RayStyle::new(0x0000_99ff, 1.0, 100.0, 0.8),
            Self::SurfaceNormal => RayStyle::new(0x00ff_9900, 1.0, 20.0, 0.9),
        }
    }
}

/// How the rays of a group are drawn and scaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayStyle {
    /// `0xRRGGBB` colour.
    pub color: u32,
    /// Multiplier applied to the recorded magnitude.
    pub scale_factor: f32,
    /// Cap on the drawn length.
    pub max_length: f32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
}

impl RayStyle {
    /// Creates a style.
    #[must_use]
    pub const fn new(color: u32, scale_factor: f32, max_length: f32, opacity: f32) -> Self {
        Self {
            color,
            scale_factor,
            max_length,
            opacity,
        }
    }
}

/// A drawable ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugRay {
    /// Start point.
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
    /// Drawn length after scaling and capping.
    pub length: f32,
}

#[derive(Debug, Clone)]
struct GroupState {
    style: RayStyle,
    enabled: bool,
    rays: HashMap<EntityId, DebugRay>,
}

/// Per-group, per-entity store of debug rays.
#[derive(Debug, Clone)]
pub struct DebugRays {
    groups: HashMap<DebugRayGroup, GroupState>,
}

impl Default for DebugRays {
    fn default() -> Self {
        let groups = DebugRayGroup::ALL
            .into_iter()
            .map(|group| {
                (
                    group,
                    GroupState {
                        style: group.default_style(),
                        enabled: true,
                        rays: HashMap::new(),
                    },
                )
            })
            .collect();
        Self { groups }
    }
}

impl DebugRays {
    /// Creates a store with every group enabled and default styles.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self, group: DebugRayGroup) -> Option<&GroupState> {
        self.groups.get(&group)
    }

    fn state_mut(&mut self, group: DebugRayGroup) -> &mut GroupState {
        self.groups.entry(group).or_insert_with(|| GroupState {
            style: group.default_style(),
            enabled: true,
            rays: HashMap::new(),
        })
    }

    /// Current style of `group`.
    #[must_use]
    pub fn style(&self, group: DebugRayGroup) -> RayStyle {
        self.state(group)
            .map_or_else(|| group.default_style(), |state| state.style)
    }

    /// Replaces the style of `group`. Existing rays keep their length until
    /// recorded again.
    pub fn set_style(&mut self, group: DebugRayGroup, style: RayStyle) {
        self.state_mut(group).style = style;
    }

    /// Whether `group` records rays.
    #[must_use]
    pub fn is_enabled(&self, group: DebugRayGroup) -> bool {
        self.state(group).is_some_and(|state| state.enabled)
    }

    /// Enables or disables `group`. Disabling drops its rays.
    pub fn set_enabled(&mut self, group: DebugRayGroup, enabled: bool) {
        let state = self.state_mut(group);
        state.enabled = enabled;
        if !enabled {
            state.rays.clear();
        }
    }

    /// Flips `group` and returns the new state.
    pub fn toggle(&mut self, group: DebugRayGroup) -> bool {
        let enabled = !self.is_enabled(group);
        self.set_enabled(group, enabled);
        enabled
    }

    /// Records a ray along `vector` from `origin` with length `magnitude`
    /// before styling. A degenerate `vector` removes the entity's ray.
    pub fn record(
        &mut self,
        group: DebugRayGroup,
        id: EntityId,
        origin: Vec3,
        vector: Vec3,
        magnitude: f32,
    ) {
        let state = self.state_mut(group);
        if !state.enabled {
            return;
        }
        let Some(direction) = safe_normalize(vector) else {
            state.rays.remove(&id);
            return;
        };
        let length = (magnitude.max(0.0) * state.style.scale_factor).min(state.style.max_length);
        state.rays.insert(
            id,
            DebugRay {
                origin,
                direction,
                length,
            },
        );
    }

    /// Ray of `id` in `group`.
    #[must_use]
    pub fn ray(&self, group: DebugRayGroup, id: EntityId) -> Option<&DebugRay> {
        self.state(group).and_then(|state| state.rays.get(&id))
    }

    /// Every ray of `group`.
    pub fn rays(&self, group: DebugRayGroup) -> impl Iterator<Item = (EntityId, &DebugRay)> + '_ {
        self.state(group)
            .into_iter()
            .flat_map(|state| state.rays.iter().map(|(id, ray)| (*id, ray)))
    }

    /// Drops the ray of `id` in `group`.
    pub fn clear(&mut self, group: DebugRayGroup, id: EntityId) {
        if let Some(state) = self.groups.get_mut(&group) {
            state.rays.remove(&id);
        }
    }

    /// Drops every ray of `id`.
    pub fn release(&mut self, id: EntityId) {
        for state in self.groups.values_mut() {
            state.rays.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    fn lengths_are_scaled_and_capped() {
        let mut rays = DebugRays::new();
        rays.record(DebugRayGroup::Gravity, EntityId(1), Vec3::ZERO, Vec3::NEG_Y, 2.0);
        rays.record(DebugRayGroup::Gravity, EntityId(2), Vec3::ZERO, Vec3::NEG_Y, 9.0);
        let short = rays.ray(DebugRayGroup::Gravity, EntityId(1)).expect("ray");
        assert_relative_eq!(short.length, 20.0);
        let long = rays.ray(DebugRayGroup::Gravity, EntityId(2)).expect("ray");
        assert_relative_eq!(long.length, 50.0);
    }

    #[rstest]
    fn clearing_one_group_keeps_the_others() {
        let mut rays = DebugRays::new();
        rays.record(DebugRayGroup::Gravity, EntityId(1), Vec3::ZERO, Vec3::NEG_Y, 1.0);
        rays.record(DebugRayGroup::SurfaceNormal, EntityId(1), Vec3::ZERO, Vec3::Y, 1.0);
        rays.clear(DebugRayGroup::SurfaceNormal, EntityId(1));
        assert!(rays.ray(DebugRayGroup::SurfaceNormal, EntityId(1)).is_none());
        assert!(rays.ray(DebugRayGroup::Gravity, EntityId(1)).is_some());
    }

    #[rstest]
    fn disabled_groups_record_nothing() {
        let mut rays = DebugRays::new();
        rays.record(DebugRayGroup::Direction, EntityId(1), Vec3::ZERO, Vec3::X, 1.0);
        assert!(!rays.toggle(DebugRayGroup::Direction));
        assert_eq!(rays.rays(DebugRayGroup::Direction).count(), 0);
        rays.record(DebugRayGroup::Direction, EntityId(1), Vec3::ZERO, Vec3::X, 1.0);
        assert!(rays.ray(DebugRayGroup::Direction, EntityId(1)).is_none());
    }

    #[rstest]
    fn degenerate_vectors_clear_and_release_drops_all() {
        let mut rays = DebugRays::new();
        for group in DebugRayGroup::ALL {
            rays.record(group, EntityId(4), Vec3::ZERO, Vec3::Z, 1.0);
        }
        rays.record(DebugRayGroup::Gravity, EntityId(4), Vec3::ZERO, Vec3::ZERO, 1.0);
        assert!(rays.ray(DebugRayGroup::Gravity, EntityId(4)).is_none());
        rays.release(EntityId(4));
        assert!(DebugRayGroup::ALL
            .into_iter()
            .all(|group| rays.ray(group, EntityId(4)).is_none()));
    }
}
