//! End-to-end behaviour on a synthetic DEM that is half smooth ramp, half
//! high-frequency texture.

use dynex_core::{DynamicExaggeration, ExaggerationParams, Grid, VarianceMethod};

const SIZE: usize = 50;

/// Columns 0..25 hold a gentle ramp, columns 25..50 a sinusoidal texture on
/// the same base level.
fn split_dem() -> Grid {
    Grid::from_fn(SIZE, SIZE, |r, c| {
        let base = 500.0 + 0.5 * r as f64;
        if c < SIZE / 2 {
            base
        } else {
            base + 20.0 * (1.3 * r as f64).sin() * (1.7 * c as f64).cos()
        }
    })
}

fn params() -> ExaggerationParams {
    ExaggerationParams {
        neighborhood: 15,
        blur: 5,
        q: 6.0,
        ..ExaggerationParams::new(2.0)
    }
}

/// output / (elevation × factor) for every cell in `cols`.
fn ratios(dem: &Grid, out: &Grid, cols: std::ops::Range<usize>) -> Vec<f64> {
    let mut v = Vec::new();
    for r in 0..SIZE {
        for c in cols.clone() {
            v.push(out.get(r, c) / (dem.get(r, c) * 2.0));
        }
    }
    v
}

#[test]
fn smooth_half_is_exaggerated_more_than_rough_half() {
    let dem = split_dem();
    let result = DynamicExaggeration::new(params()).unwrap().run(&dem).unwrap();
    assert!(!result.stats.degenerate);

    // Stay clear of the seam: slope window (±7) plus blur (±2) plus the
    // central difference reaching one cell across.
    let smooth = ratios(&dem, &result.exaggerated, 0..12);
    let rough = ratios(&dem, &result.exaggerated, 38..SIZE);

    let smooth_min = smooth.iter().cloned().fold(f64::INFINITY, f64::min);
    let rough_max = rough.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    assert!(
        smooth_min > rough_max,
        "smooth ratio {smooth_min} should exceed rough ratio {rough_max}"
    );
    // Both halves are still amplified beyond plain 2× scaling.
    assert!(rough_max > 1.0);
}

#[test]
fn both_variance_methods_give_the_same_surface() {
    let dem = split_dem();
    let fast = DynamicExaggeration::new(params()).unwrap().run(&dem).unwrap();
    let slow = DynamicExaggeration::new(ExaggerationParams {
        variance: VarianceMethod::Direct,
        ..params()
    })
    .unwrap()
    .run(&dem)
    .unwrap();
    assert_eq!(slow.method, VarianceMethod::Direct);
    for (a, b) in fast.exaggerated.data.iter().zip(&slow.exaggerated.data) {
        assert!((a - b).abs() <= 1e-6 * b.abs().max(1.0), "{a} vs {b}");
    }
}

#[test]
fn roughness_is_non_negative_and_planar_interior_is_zero() {
    let dem = split_dem();
    let result = DynamicExaggeration::new(params()).unwrap().run(&dem).unwrap();
    assert!(result.roughness.data.iter().all(|&v| v >= 0.0));
    for r in 0..SIZE {
        for c in 0..10 {
            assert!(result.roughness.get(r, c) < 1e-6);
        }
    }
}

#[test]
fn repeated_runs_are_identical() {
    let dem = split_dem();
    let pipeline = DynamicExaggeration::new(params()).unwrap();
    let first = pipeline.run(&dem).unwrap().exaggerated;
    let second = pipeline.run(&dem).unwrap().exaggerated;
    assert_eq!(first, second);
}
