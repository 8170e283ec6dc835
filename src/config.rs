//! Runtime configuration for the physics core.
//!
//! Defaults come from [`crate::constants`]. Configurations can be loaded from
//! JSON, in which case any omitted field keeps its default.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CLEANUP_INTERVAL_TICKS, CLEARANCE_PER_SPEED, GRAVITATIONAL_CONSTANT, MAX_LOOKAHEAD_FRAMES,
    MAX_SPEED_CHANGE, MIN_SURFACE_DISTANCE, ORIENTATION_MAX_BLEND, PROXIMITY_THRESHOLD,
    ROTATION_BLEND_DISTANCE, SCHEDULED_FAR_ALTITUDE, SCHEDULED_MAX_INTERVAL_MS,
    SCHEDULED_MIN_INTERVAL_MS, SMOOTHING_FLOOR, SURFACE_CACHE_TTL_MS, TICK_RATE_HZ,
};
use crate::error::ConfigError;

/// How an entity's "up" axis follows the net gravity direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum OrientationPolicy {
    /// Target rotation maps world up straight onto the anti-gravity direction.
    Snap,
    /// Current rotation is blended toward the snap target by a factor that
    /// decays with distance to each contributing body.
    Smoothed {
        /// Blend factor contributed by a body the entity touches.
        max_blend: f32,
    },
}

impl Default for OrientationPolicy {
    fn default() -> Self {
        Self::Smoothed {
            max_blend: ORIENTATION_MAX_BLEND,
        }
    }
}

/// Staleness policy of the surface query cache.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum CachePolicy {
    /// Recompute unconditionally once an entry is older than `ttl_ms`.
    FixedTtl {
        /// Lifetime of an entry in milliseconds.
        ttl_ms: u64,
    },
    /// Grant one raycast per tick in round-robin order, with a recompute
    /// interval that shrinks as the entity approaches the surface. Entities
    /// without a raycast this tick use an analytic sphere estimate.
    Scheduled {
        /// Interval at zero altitude in milliseconds.
        min_interval_ms: u64,
        /// Interval at or beyond `far_altitude` in milliseconds.
        max_interval_ms: u64,
        /// Altitude above the estimated surface where the interval peaks.
        far_altitude: f32,
    },
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::FixedTtl {
            ttl_ms: SURFACE_CACHE_TTL_MS,
        }
    }
}

impl CachePolicy {
    /// Default parameters for the scheduled policy.
    #[must_use]
    pub const fn scheduled() -> Self {
        Self::Scheduled {
            min_interval_ms: SCHEDULED_MIN_INTERVAL_MS,
            max_interval_ms: SCHEDULED_MAX_INTERVAL_MS,
            far_altitude: SCHEDULED_FAR_ALTITUDE,
        }
    }

    /// Longest time an entry may be considered fresh under this policy.
    #[must_use]
    pub const fn cache_duration(&self) -> Duration {
        match *self {
            Self::FixedTtl { ttl_ms } => Duration::from_millis(ttl_ms),
            Self::Scheduled {
                max_interval_ms, ..
            } => Duration::from_millis(max_interval_ms),
        }
    }
}

/// Tunable parameters of the gravity and surface-constraint pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravitational constant `G`.
    pub gravitational_constant: f32,
    /// Base clearance from a body surface.
    pub min_surface_distance: f32,
    /// Extra clearance per unit of speed.
    pub clearance_per_speed: f32,
    /// Distance to the nearest body centre within which constraints apply.
    pub proximity_threshold: f32,
    /// Surface distance within which the surface rotation is blended in.
    pub rotation_blend_distance: f32,
    /// Tick rate assumed by the predictive look-ahead.
    pub tick_rate_hz: f32,
    /// Cap on look-ahead frames.
    pub max_lookahead_frames: u32,
    /// Orientation policy of the gravity resolver.
    pub orientation: OrientationPolicy,
    /// Staleness policy of the surface query cache.
    pub cache: CachePolicy,
    /// Ticks between two sweeps of expired cache entries.
    pub cleanup_interval_ticks: u64,
    /// Largest relative speed change between ticks.
    pub max_speed_change: f32,
    /// Floor of the smoothed speed relative to the constrained speed.
    pub smoothing_floor: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: GRAVITATIONAL_CONSTANT,
            min_surface_distance: MIN_SURFACE_DISTANCE,
            clearance_per_speed: CLEARANCE_PER_SPEED,
            proximity_threshold: PROXIMITY_THRESHOLD,
            rotation_blend_distance: ROTATION_BLEND_DISTANCE,
            tick_rate_hz: TICK_RATE_HZ,
            max_lookahead_frames: MAX_LOOKAHEAD_FRAMES,
            orientation: OrientationPolicy::default(),
            cache: CachePolicy::default(),
            cleanup_interval_ticks: CLEANUP_INTERVAL_TICKS,
            max_speed_change: MAX_SPEED_CHANGE,
            smoothing_floor: SMOOTHING_FLOOR,
        }
    }
}

fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: f64::from(value),
        })
    }
}

fn require_fraction(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: f64::from(value),
        })
    }
}

fn require_nonzero(field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        #[expect(
            clippy::cast_precision_loss,
            reason = "The value is only reported in an error message."
        )]
        let reported = value as f64;
        return Err(ConfigError::OutOfRange {
            field,
            value: reported,
        });
    }
    Ok(())
}

impl PhysicsConfig {
    /// Parses a configuration from a JSON string and validates it.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::OutOfRange`] for invalid values.
    ///
    /// # Examples
    /// ```
    /// use gravwell::PhysicsConfig;
    /// let config = PhysicsConfig::from_json_str(r#"{ "min_surface_distance": 3.0 }"#).unwrap();
    /// assert_eq!(config.min_surface_distance, 3.0);
    /// assert_eq!(config.proximity_threshold, 100.0);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise the
    /// errors of [`PhysicsConfig::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let json = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks every field against its allowed range.
    ///
    /// # Errors
    /// Returns [`ConfigError::OutOfRange`] naming the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("gravitational_constant", self.gravitational_constant)?;
        require_positive("min_surface_distance", self.min_surface_distance)?;
        if !self.clearance_per_speed.is_finite() || self.clearance_per_speed < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "clearance_per_speed",
                value: f64::from(self.clearance_per_speed),
            });
        }
        require_positive("proximity_threshold", self.proximity_threshold)?;
        require_positive("rotation_blend_distance", self.rotation_blend_distance)?;
        require_positive("tick_rate_hz", self.tick_rate_hz)?;
        require_nonzero("max_lookahead_frames", u64::from(self.max_lookahead_frames))?;
        require_nonzero("cleanup_interval_ticks", self.cleanup_interval_ticks)?;
        require_fraction("max_speed_change", self.max_speed_change)?;
        require_fraction("smoothing_floor", self.smoothing_floor)?;
        if let OrientationPolicy::Smoothed { max_blend } = self.orientation {
            require_fraction("orientation.max_blend", max_blend)?;
        }
        match self.cache {
            CachePolicy::FixedTtl { ttl_ms } => require_nonzero("cache.ttl_ms", ttl_ms)?,
            CachePolicy::Scheduled {
                min_interval_ms,
                max_interval_ms,
                far_altitude,
            } => {
                require_nonzero("cache.min_interval_ms", min_interval_ms)?;
                if max_interval_ms < min_interval_ms {
                    #[expect(
                        clippy::cast_precision_loss,
                        reason = "The value is only reported in an error message."
                    )]
                    let reported = max_interval_ms as f64;
                    return Err(ConfigError::OutOfRange {
                        field: "cache.max_interval_ms",
                        value: reported,
                    });
                }
                require_positive("cache.far_altitude", far_altitude)?;
            }
        }
        Ok(())
    }

    /// Clearance required at `speed`: `min_surface_distance + speed * k`.
    #[must_use]
    pub fn speed_scaled_clearance(&self, speed: f32) -> f32 {
        self.min_surface_distance + speed.max(0.0) * self.clearance_per_speed
    }
}
