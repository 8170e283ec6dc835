//! Error types for configuration and scene construction.
//!
//! Stepping the simulation never fails; degenerate runtime input is clamped
//! or skipped instead. Only loading configuration and assembling a scene
//! report errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::body::BodyId;

/// Failure while loading or validating a [`crate::PhysicsConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration was not valid JSON for [`crate::PhysicsConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A numeric field was non-finite or outside its allowed range.
    #[error("config field `{field}` is out of range: {value}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Value that failed validation.
        value: f64,
    },
}

/// Failure while assembling a [`crate::PhysicsManager`].
#[derive(Debug, Error)]
pub enum SceneError {
    /// A body was given a non-finite or non-positive mass.
    #[error("attracting body {id} has invalid mass {mass}")]
    InvalidBodyMass {
        /// Offending body.
        id: BodyId,
        /// Rejected mass.
        mass: f32,
    },
    /// A body was given a non-finite or non-positive scale.
    #[error("attracting body {id} has invalid scale {scale}")]
    InvalidBodyScale {
        /// Offending body.
        id: BodyId,
        /// Rejected scale.
        scale: f32,
    },
    /// A mesh triangle referenced a vertex that does not exist.
    #[error("mesh triangle {triangle} references vertex {index} of {vertex_count}")]
    InvalidMeshIndex {
        /// Position of the triangle in the index list.
        triangle: usize,
        /// Offending vertex index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },
    /// Two bodies share an identifier.
    #[error("attracting body id {0} is used more than once")]
    DuplicateBody(BodyId),
    /// The configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
