//! Utility helpers for tests.
//!
//! Scene builders, instrumented geometry providers and float assertions
//! shared by the integration and behaviour tests.
pub mod assertions;
pub mod geometry;
pub mod scene;

pub use assertions::{assert_near, assert_unit, assert_vec3_near};
pub use geometry::{CountingGeometry, ScriptedGeometry};
pub use scene::{entity, moon, scene_manager, walking_intent};
