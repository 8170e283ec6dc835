//! Float and vector assertions with readable failure messages.
use glam::Vec3;

/// Assert that `actual` is within `tolerance` of `expected`.
///
/// # Panics
/// Panics with both values if they differ by more than `tolerance`.
#[track_caller]
pub fn assert_near(actual: f32, expected: f32, tolerance: f32) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} ± {tolerance}, got {actual}"
    );
}

/// Assert that every component of `actual` is within `tolerance` of
/// `expected`.
///
/// # Panics
/// Panics with both vectors on mismatch.
#[track_caller]
pub fn assert_vec3_near(actual: Vec3, expected: Vec3, tolerance: f32) {
    assert!(
        actual.abs_diff_eq(expected, tolerance),
        "expected {expected:?} ± {tolerance}, got {actual:?}"
    );
}

/// Assert that `v` has unit length.
///
/// # Panics
/// Panics if the length differs from one by more than `1e-4`.
#[track_caller]
pub fn assert_unit(v: Vec3) {
    assert!(
        (v.length() - 1.0).abs() <= 1e-4,
        "expected a unit vector, got {v:?} (length {})",
        v.length()
    );
}
