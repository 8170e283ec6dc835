//! Bounds of cross-tick speed smoothing.

use gravwell::{EntityId, PhysicsConfig, SpeedSmoother};
use rstest::rstest;

const ID: EntityId = EntityId(11);

fn primed(previous: f32) -> SpeedSmoother {
    let mut smoother = SpeedSmoother::from_config(&PhysicsConfig::default());
    smoother.smooth(ID, previous, previous);
    smoother
}

#[rstest]
fn smoothed_speed_stays_within_both_bounds(
    #[values(2.0, 10.0, 35.0)] previous: f32,
    #[values(0.0, 0.5, 0.9, 1.0, 1.1, 1.5, 1.9)] ratio: f32,
) {
    let constrained = previous * ratio;
    let mut smoother = primed(previous);
    let smoothed = smoother.smooth(ID, previous, constrained);

    let tolerance = 1e-4 * previous;
    assert!(
        (smoothed - previous).abs() <= 0.15 * previous + tolerance,
        "{previous} -> {smoothed} for target {constrained}"
    );
    assert!(smoothed + tolerance >= 0.6 * constrained);
}

#[rstest]
fn repeated_targets_are_approached_gradually() {
    let mut smoother = primed(10.0);
    let mut speeds = Vec::new();
    for _ in 0..10 {
        speeds.push(smoother.smooth(ID, 10.0, 20.0));
    }
    assert!(speeds
        .iter()
        .zip(speeds.iter().skip(1))
        .all(|(earlier, later)| later >= earlier));
    assert!(speeds.first().is_some_and(|first| (first - 11.5).abs() < 1e-4));
    assert!(speeds.last().is_some_and(|last| (last - 20.0).abs() < 1e-4));
}

#[rstest]
fn raw_speed_seeds_the_first_tick() {
    let mut smoother = SpeedSmoother::default();
    assert!((smoother.smooth(ID, 10.0, 2.0) - 8.5).abs() < 1e-5);
}

#[rstest]
#[case(10.0, 3.0)]
#[case(4.0, 2.5)]
#[case(20.0, 5.0)]
fn floor_wins_over_the_change_band(#[case] previous: f32, #[case] ratio: f32) {
    let constrained = previous * ratio;
    let mut smoother = primed(previous);
    let smoothed = smoother.smooth(ID, previous, constrained);

    assert!((smoothed - 0.6 * constrained).abs() < 1e-4 * constrained);
    assert!(smoothed > 1.15 * previous);
}
