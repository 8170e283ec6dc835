//! Cross-tick speed smoothing.
//!
//! Constraints switch on and off abruptly as an entity crosses clearance
//! bands. [`SpeedSmoother`] limits how far the resolved speed can move in a
//! single tick so those transitions do not snap.

use hashbrown::HashMap;

use crate::body::EntityId;
use crate::config::PhysicsConfig;
use crate::constants::{MAX_SPEED_CHANGE, SMOOTHING_FLOOR};
use crate::vector_math::sanitize_speed;

/// Remembers each entity's last resolved speed.
#[derive(Debug, Clone)]
pub struct SpeedSmoother {
    max_change: f32,
    floor: f32,
    previous: HashMap<EntityId, f32>,
}

impl Default for SpeedSmoother {
    fn default() -> Self {
        Self::new(MAX_SPEED_CHANGE, SMOOTHING_FLOOR)
    }
}

fn fraction_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

impl SpeedSmoother {
    /// Creates a smoother allowing `max_change` relative change per tick and
    /// never dropping below `floor` times the constrained speed.
    #[must_use]
    pub fn new(max_change: f32, floor: f32) -> Self {
        Self {
            max_change: fraction_or(max_change, MAX_SPEED_CHANGE),
            floor: fraction_or(floor, SMOOTHING_FLOOR),
            previous: HashMap::new(),
        }
    }

    /// Creates a smoother from [`PhysicsConfig`].
    #[must_use]
    pub fn from_config(config: &PhysicsConfig) -> Self {
        Self::new(config.max_speed_change, config.smoothing_floor)
    }

    /// Smooths `constrained_speed` against the entity's previous speed.
    ///
    /// The first call for an entity treats `raw_speed` as the previous
    /// speed. The change is clamped to `max_change` of the previous speed,
    /// then floored at `floor` of the constrained speed; when those bounds
    /// conflict the floor wins.
    ///
    /// ```
    /// use gravwell::{EntityId, SpeedSmoother};
    /// let mut smoother = SpeedSmoother::new(0.15, 0.6);
    /// assert_eq!(smoother.smooth(EntityId(1), 10.0, 5.0), 8.5);
    /// ```
    pub fn smooth(&mut self, id: EntityId, raw_speed: f32, constrained_speed: f32) -> f32 {
        let constrained = sanitize_speed(constrained_speed);
        let previous = self
            .previous
            .get(&id)
            .copied()
            .unwrap_or_else(|| sanitize_speed(raw_speed));
        let band = previous * self.max_change;
        let result = constrained
            .clamp(previous - band, previous + band)
            .max(constrained * self.floor)
            .max(0.0);
        self.previous.insert(id, result);
        result
    }

    /// Last resolved speed of `id`.
    #[must_use]
    pub fn previous(&self, id: EntityId) -> Option<f32> {
        self.previous.get(&id).copied()
    }

    /// Forgets `id`.
    pub fn release(&mut self, id: EntityId) {
        self.previous.remove(&id);
    }
}
