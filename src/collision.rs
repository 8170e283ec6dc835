//! Look-ahead detection of imminent surface penetration.

use glam::Vec3;

use crate::config::PhysicsConfig;
use crate::constants::LOOKAHEAD_SPEED_PER_FRAME;
use crate::surface_cache::SurfaceData;

/// Outcome of a look-ahead check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionPrediction {
    /// Whether the clearance is violated within the look-ahead window.
    pub will_collide: bool,
    /// Severity in `[0, 1]`; zero when no collision is predicted.
    pub urgency: f32,
    /// First look-ahead frame that violates the clearance.
    pub frame: Option<u32>,
}

impl CollisionPrediction {
    /// No predicted collision.
    pub const CLEAR: Self = Self {
        will_collide: false,
        urgency: 0.0,
        frame: None,
    };
}

/// Extrapolates motion a few ticks ahead and scores the first clearance
/// violation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictiveCollisionChecker {
    tick_rate_hz: f32,
    max_frames: u32,
    min_surface_distance: f32,
    clearance_per_speed: f32,
}

impl Default for PredictiveCollisionChecker {
    fn default() -> Self {
        Self::from_config(&PhysicsConfig::default())
    }
}

impl PredictiveCollisionChecker {
    /// Builds a checker from the look-ahead and clearance settings.
    #[must_use]
    pub fn from_config(config: &PhysicsConfig) -> Self {
        Self {
            tick_rate_hz: config.tick_rate_hz,
            max_frames: config.max_lookahead_frames.max(1),
            min_surface_distance: config.min_surface_distance,
            clearance_per_speed: config.clearance_per_speed,
        }
    }

    /// Number of frames simulated at `speed`: one per
    /// [`LOOKAHEAD_SPEED_PER_FRAME`], between one and the configured cap.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        reason = "The quotient is floored, non-negative and clamped to the frame cap."
    )]
    pub fn lookahead_frames(&self, speed: f32) -> u32 {
        let frames = (speed.max(0.0) / LOOKAHEAD_SPEED_PER_FRAME).floor();
        (frames.min(self.max_frames as f32) as u32).clamp(1, self.max_frames)
    }

    /// Clearance demanded at `speed`.
    #[must_use]
    pub fn required_clearance(&self, speed: f32) -> f32 {
        self.min_surface_distance + speed.max(0.0) * self.clearance_per_speed
    }

    /// Checks whether moving along `direction` at `speed` from `position`
    /// breaks the clearance within the look-ahead window.
    ///
    /// `probe` returns the surface seen from a predicted position; a `None`
    /// ends the look-ahead without a collision.
    ///
    /// # Examples
    /// ```
    /// use glam::Vec3;
    /// use gravwell::collision::PredictiveCollisionChecker;
    /// use gravwell::SurfaceData;
    ///
    /// let checker = PredictiveCollisionChecker::default();
    /// let floor = |p: Vec3| Some(SurfaceData { point: Vec3::new(p.x, 0.0, p.z), normal: Vec3::Y });
    /// let rising = checker.check(Vec3::Y, 10.0, Vec3::Y, Vec3::new(0.0, 3.0, 0.0), floor);
    /// assert!(!rising.will_collide);
    /// ```
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "Frame counts never exceed the small look-ahead cap."
    )]
    pub fn check(
        &self,
        direction: Vec3,
        speed: f32,
        surface_normal: Vec3,
        position: Vec3,
        mut probe: impl FnMut(Vec3) -> Option<SurfaceData>,
    ) -> CollisionPrediction {
        if direction.dot(-surface_normal) <= 0.0 || speed <= 0.0 {
            return CollisionPrediction::CLEAR;
        }

        let frames = self.lookahead_frames(speed);
        let required = self.required_clearance(speed);
        let step = direction * speed / self.tick_rate_hz;
        for frame in 1..=frames {
            let predicted = position + step * frame as f32;
            let Some(surface) = probe(predicted) else {
                return CollisionPrediction::CLEAR;
            };
            let distance = surface.point.distance(predicted);
            if distance < required {
                let depth = ((required - distance) / required).min(1.0);
                let imminence = 1.0 - frame as f32 / frames as f32;
                return CollisionPrediction {
                    will_collide: true,
                    urgency: ((depth + imminence) * 0.5).clamp(0.0, 1.0),
                    frame: Some(frame),
                };
            }
        }
        CollisionPrediction::CLEAR
    }
}
