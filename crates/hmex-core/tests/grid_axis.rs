use approx::assert_relative_eq;
use hmex_core::grid::{format_value, linspace, settled_mean, Axis, SweepGrid, MAX_AXIS_POINTS};
use proptest::prelude::*;

#[test]
fn default_grid_matches_reference_sweep() {
    let grid = SweepGrid::default();
    assert_eq!(grid.j.points(), vec![-2.0, -1.5, -1.0]);
    assert_eq!(grid.h.len(), 101);
    assert_eq!(grid.pair_count(), 303);
    assert_eq!(grid.settling_window, 20);
    grid.validate().expect("default grid is valid");
}

#[test]
fn reversed_range_is_sorted() {
    let axis = Axis::new(1.0, 0.0, 0.5);
    assert_eq!(axis.points(), vec![0.0, 0.5, 1.0]);
}

#[test]
fn degenerate_range_has_one_point() {
    let axis = Axis::new(0.3, 0.3, 0.1);
    assert_eq!(axis.len(), 1);
    assert_eq!(axis.points(), vec![0.3]);
}

#[test]
fn non_divisible_span_rounds_point_count() {
    // 1.0 / 0.3 = 3.33 rounds to 3 intervals.
    let axis = Axis::new(0.0, 1.0, 0.3);
    let points = axis.points();
    assert_eq!(points.len(), 4);
    assert_relative_eq!(points[1], 1.0 / 3.0, epsilon = 1e-12);
    assert_eq!(points[3], 1.0);
}

#[test]
fn invalid_increment_is_rejected() {
    let err = Axis::new(0.0, 1.0, 0.0).validate("h").expect_err("zero increment");
    assert_eq!(err.info().code, "axis_increment");
    assert!(Axis::new(0.0, f64::NAN, 0.1).validate("h").is_err());
    let dense = Axis::new(0.0, 1e300, 1e-10);
    assert_eq!(dense.validate("j").expect_err("too many points").info().code, "axis_points");
    assert!(Axis::new(-1e308, 1e308, 1.0).validate("j").is_err());
    assert_eq!(dense.len(), usize::MAX);
    let grid = SweepGrid {
        j: dense.clone(),
        h: dense,
        settling_window: 1,
    };
    assert_eq!(grid.pair_count(), usize::MAX);
    let edge = Axis::new(0.0, (MAX_AXIS_POINTS - 1) as f64, 1.0);
    edge.validate("h").expect("largest accepted axis");
    assert_eq!(edge.len(), MAX_AXIS_POINTS);
    let grid = SweepGrid {
        settling_window: 0,
        ..SweepGrid::default()
    };
    assert!(grid.validate().is_err());
}

#[test]
fn values_format_for_labels() {
    assert_eq!(format_value(-1.0), "-1.0");
    assert_eq!(format_value(0.0), "0.0");
    assert_eq!(format_value(0.06), "0.06");
    assert_eq!(format_value(-1.5), "-1.5");
}

#[test]
fn settled_mean_uses_trailing_window() {
    let values = [10.0, 1.0, 2.0, 3.0];
    assert_relative_eq!(settled_mean(&values, 3), 2.0);
    assert_relative_eq!(settled_mean(&values, 10), 4.0);
    assert!(settled_mean(&[], 5).is_nan());
}

proptest! {
    #[test]
    fn linspace_hits_endpoints(start in -10.0f64..10.0, width in 0.01f64..10.0, count in 2usize..200) {
        let stop = start + width;
        let values = linspace(start, stop, count);
        prop_assert_eq!(values.len(), count);
        prop_assert_eq!(values[0], start);
        prop_assert_eq!(values[count - 1], stop);
        prop_assert!(values.windows(2).all(|pair| pair[1] > pair[0]));
    }

    #[test]
    fn axis_spacing_stays_near_increment(min in -5.0f64..5.0, steps in 1usize..100, increment in 0.01f64..1.0) {
        let axis = Axis::new(min, min + steps as f64 * increment, increment);
        let points = axis.points();
        prop_assert_eq!(points.len(), steps + 1);
        for pair in points.windows(2) {
            prop_assert!((pair[1] - pair[0] - increment).abs() < 1e-9);
        }
    }
}
