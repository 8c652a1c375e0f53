//! Terrain roughness as the local standard deviation of slope magnitude.
//!
//! Roughness here measures how much the *slope* varies around a cell, not how
//! much the elevation varies: a steep but planar ramp scores near zero, while
//! terrain whose gradient keeps changing direction or magnitude scores high.
//!
//! Two strategies compute the same local deviation:
//!
//! - [`SeparableMoments`]: `sqrt(|mean(s²) − mean(s)²|)` from two separable box
//!   means. O(1) per cell in the window size.
//! - [`DirectWindow`]: population standard deviation of each N×N window,
//!   evaluated directly. O(N²) per cell.
//!
//! They agree to floating-point tolerance. The separable identity cancels
//! catastrophically on near-planar slopes, so a variance within
//! [`CANCELLATION_ULPS`] · size rounding units of the mean square is taken as
//! exactly zero.
//!
//! The separable identity has also been seen to return a mean of squares
//! equal to the squared mean (zero variance everywhere) in at least one host
//! numeric environment; [`VarianceMethod::Auto`] detects that collapse and
//! recomputes with the direct window.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::filter::{box_mean, window_std};
use crate::gradient::slope_magnitude;
use crate::grid::{ElevationGrid, Grid, RoughnessField};

/// A way of computing the local standard deviation of a field.
pub trait LocalDeviation {
    /// Standard deviation of `field` over the `size`×`size` window around
    /// every cell. Every returned value is ≥ 0.
    fn local_std(&self, field: &Grid, size: usize) -> Grid;
}

/// Rounding units per window cell that `mean(s²) − mean(s)²` may carry from
/// the two box-mean passes.
pub const CANCELLATION_ULPS: f64 = 32.0;

/// Relative variance (against the mean square) below which a separable
/// result is indistinguishable from rounding.
fn cancellation_tolerance(size: usize) -> f64 {
    CANCELLATION_ULPS * size as f64 * f64::EPSILON
}

/// Variance from the moment identity over two separable box means.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeparableMoments;

impl LocalDeviation for SeparableMoments {
    fn local_std(&self, field: &Grid, size: usize) -> Grid {
        let mean = box_mean(field, size);
        let sq_mean = box_mean(&field.map(|v| v * v), size);
        let tol = cancellation_tolerance(size);
        let data = sq_mean
            .data
            .iter()
            .zip(&mean.data)
            .map(|(&sq, &m)| {
                let var = sq - m * m;
                if var.abs() <= tol * sq {
                    0.0
                } else {
                    var.abs().sqrt()
                }
            })
            .collect();
        Grid {
            data,
            width: field.width,
            height: field.height,
        }
    }
}

/// Variance evaluated window by window.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectWindow;

impl LocalDeviation for DirectWindow {
    fn local_std(&self, field: &Grid, size: usize) -> Grid {
        window_std(field, size)
    }
}

/// Which local-variance strategy the estimator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarianceMethod {
    /// Fast separable moment identity.
    #[default]
    Separable,
    /// Slow direct window evaluation.
    Direct,
    /// Separable, falling back to direct if the separable result collapses.
    Auto,
}

impl fmt::Display for VarianceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VarianceMethod::Separable => "separable",
            VarianceMethod::Direct => "direct",
            VarianceMethod::Auto => "auto",
        };
        f.write_str(name)
    }
}

impl FromStr for VarianceMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "separable" | "fast" => Ok(VarianceMethod::Separable),
            "direct" | "robust" => Ok(VarianceMethod::Direct),
            "auto" => Ok(VarianceMethod::Auto),
            _ => Err(Error::UnknownVarianceMethod(s.to_string())),
        }
    }
}

/// Output of [`RoughnessEstimator::estimate`].
#[derive(Debug, Clone)]
pub struct RoughnessEstimate {
    pub field: RoughnessField,
    /// Strategy that produced `field`; never `Auto`.
    pub method: VarianceMethod,
}

/// Converts an elevation grid into a roughness field.
#[derive(Debug, Clone, Copy)]
pub struct RoughnessEstimator {
    neighborhood: usize,
    method: VarianceMethod,
}

impl RoughnessEstimator {
    pub fn new(neighborhood: usize, method: VarianceMethod) -> Result<Self> {
        if neighborhood == 0 {
            return Err(Error::InvalidParameter {
                name: "neighborhood",
                value: neighborhood.to_string(),
                reason: "must be at least 1",
            });
        }
        Ok(Self {
            neighborhood,
            method,
        })
    }

    pub fn neighborhood(&self) -> usize {
        self.neighborhood
    }

    pub fn method(&self) -> VarianceMethod {
        self.method
    }

    /// Slope magnitude → local standard deviation over the neighbourhood.
    ///
    /// Fails only on a grid with no cells or with a buffer that does not
    /// match its dimensions. Windows larger than the grid are filled by
    /// reflection.
    pub fn estimate(&self, elevation: &ElevationGrid) -> Result<RoughnessEstimate> {
        elevation.validate()?;
        let slope = slope_magnitude(elevation);
        let n = self.neighborhood;

        let (field, method) = match self.method {
            VarianceMethod::Separable => (SeparableMoments.local_std(&slope, n), VarianceMethod::Separable),
            VarianceMethod::Direct => (DirectWindow.local_std(&slope, n), VarianceMethod::Direct),
            VarianceMethod::Auto => {
                let fast = SeparableMoments.local_std(&slope, n);
                if separable_collapsed(&fast, &slope, n) {
                    warn!(
                        neighborhood = n,
                        "separable variance is zero everywhere on a non-constant slope field; \
                         recomputing with direct windows"
                    );
                    (DirectWindow.local_std(&slope, n), VarianceMethod::Direct)
                } else {
                    (fast, VarianceMethod::Separable)
                }
            }
        };

        debug!(
            width = elevation.width,
            height = elevation.height,
            neighborhood = n,
            %method,
            max_roughness = field.max_value(),
            "roughness estimated"
        );
        Ok(RoughnessEstimate { field, method })
    }
}

/// True when the separable result is identically zero although the slope
/// field varies by more than rounding. With a window wider than one cell
/// every pair of adjacent cells shares some window, so a varying slope field
/// must produce a nonzero deviation somewhere.
fn separable_collapsed(fast: &Grid, slope: &Grid, size: usize) -> bool {
    if size <= 1 || fast.data.iter().any(|&v| v != 0.0) {
        return false;
    }
    let (lo, hi) = (slope.min_value(), slope.max_value());
    let scale = lo.abs().max(hi.abs());
    hi - lo > cancellation_tolerance(size).sqrt() * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sinusoid(width: usize, height: usize) -> Grid {
        Grid::from_fn(width, height, |r, c| {
            let (x, y) = (c as f64, r as f64);
            120.0 * (0.31 * x).sin() * (0.23 * y).cos() + 15.0 * (0.9 * x + 0.4 * y).sin()
        })
    }

    #[test]
    fn planar_slope_has_zero_roughness() {
        let plane = Grid::from_fn(40, 30, |r, c| 500.0 + 4.0 * r as f64 - 7.5 * c as f64);
        for method in [VarianceMethod::Separable, VarianceMethod::Direct] {
            let est = RoughnessEstimator::new(15, method).unwrap().estimate(&plane).unwrap();
            for &v in &est.field.data {
                assert!(v.abs() < 1e-6, "{method}: expected ≈0, got {v}");
            }
        }
    }

    #[test]
    fn separable_and_direct_agree_on_sinusoid() {
        let dem = sinusoid(48, 40);
        for n in [3, 4, 15] {
            let fast = RoughnessEstimator::new(n, VarianceMethod::Separable).unwrap().estimate(&dem).unwrap();
            let slow = RoughnessEstimator::new(n, VarianceMethod::Direct).unwrap().estimate(&dem).unwrap();
            for (a, b) in fast.field.data.iter().zip(&slow.field.data) {
                assert!(
                    (a - b).abs() <= 1e-6 * b.abs().max(1.0),
                    "n = {n}: separable {a} vs direct {b}"
                );
            }
        }
    }

    #[test]
    fn roughness_is_non_negative_on_random_terrain() {
        let mut rng = StdRng::seed_from_u64(0x5d51_0e7e);
        for _ in 0..8 {
            let w = rng.gen_range(1..24);
            let h = rng.gen_range(1..24);
            // Large offset with tiny perturbations stresses the moment identity.
            let dem = Grid::from_fn(w, h, |_, _| 1.0e6 + rng.gen_range(-1e-3..1e-3));
            let n = rng.gen_range(1..12);
            for method in [VarianceMethod::Separable, VarianceMethod::Direct] {
                let est = RoughnessEstimator::new(n, method).unwrap().estimate(&dem).unwrap();
                assert!(est.field.data.iter().all(|&v| v >= 0.0 && v.is_finite()));
            }
        }
    }

    #[test]
    fn rough_texture_scores_higher_than_ramp() {
        let ramp = Grid::from_fn(30, 30, |r, _| 10.0 * r as f64);
        let rough = Grid::from_fn(30, 30, |r, c| 10.0 * (1.7 * c as f64).sin() * (1.3 * r as f64).cos());
        let est = RoughnessEstimator::new(5, VarianceMethod::Separable).unwrap();
        assert!(est.estimate(&rough).unwrap().field.mean() > est.estimate(&ramp).unwrap().field.mean() + 1.0);
    }

    #[test]
    fn window_larger_than_grid_is_handled() {
        let dem = sinusoid(4, 3);
        let est = RoughnessEstimator::new(9, VarianceMethod::Direct).unwrap().estimate(&dem).unwrap();
        assert_eq!((est.field.width, est.field.height), (4, 3));
        assert!(est.field.data.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn auto_keeps_separable_when_it_is_sound() {
        let dem = sinusoid(20, 20);
        let auto = RoughnessEstimator::new(5, VarianceMethod::Auto).unwrap().estimate(&dem).unwrap();
        let fast = RoughnessEstimator::new(5, VarianceMethod::Separable).unwrap().estimate(&dem).unwrap();
        assert_eq!(auto.method, VarianceMethod::Separable);
        assert_eq!(auto.field, fast.field);
    }

    #[test]
    fn collapse_check_flags_false_zero_variance() {
        let slope = Grid::from_fn(6, 6, |r, c| (r + c) as f64);
        let zeros = Grid::new(6, 6, 0.0);
        assert!(separable_collapsed(&zeros, &slope, 3));
        // A single-cell window has zero deviation legitimately.
        assert!(!separable_collapsed(&zeros, &slope, 1));
        // A constant slope field has zero deviation legitimately.
        assert!(!separable_collapsed(&zeros, &Grid::new(6, 6, 2.0), 3));
        let sound = SeparableMoments.local_std(&slope, 3);
        assert!(!separable_collapsed(&sound, &slope, 3));
    }

    #[test]
    fn ramp_with_inexact_steps_has_exactly_zero_separable_roughness() {
        // 0.1 and 0.3 are not representable, so the slope field carries
        // rounding noise on top of a large elevation offset.
        let ramp = Grid::from_fn(60, 60, |r, c| 2345.678 + 0.1 * r as f64 + 0.3 * c as f64);
        let fast = RoughnessEstimator::new(15, VarianceMethod::Separable).unwrap().estimate(&ramp).unwrap();
        assert_eq!(fast.field.max_value(), 0.0);

        let auto = RoughnessEstimator::new(15, VarianceMethod::Auto).unwrap().estimate(&ramp).unwrap();
        assert_eq!(auto.method, VarianceMethod::Separable);
    }

    #[test]
    fn malformed_grids_are_rejected() {
        let est = RoughnessEstimator::new(3, VarianceMethod::Auto).unwrap();
        assert_eq!(est.estimate(&Grid::new(0, 5, 0.0)).unwrap_err(), Error::EmptyGrid);
        let short = Grid {
            data: vec![1.0; 5],
            width: 3,
            height: 2,
        };
        assert_eq!(
            est.estimate(&short).unwrap_err(),
            Error::DataLength { len: 5, width: 3, height: 2 }
        );
    }

    #[test]
    fn zero_neighborhood_is_rejected() {
        assert!(matches!(
            RoughnessEstimator::new(0, VarianceMethod::Separable),
            Err(Error::InvalidParameter { name: "neighborhood", .. })
        ));
    }

    #[test]
    fn variance_method_parses_aliases() {
        assert_eq!("fast".parse::<VarianceMethod>().unwrap(), VarianceMethod::Separable);
        assert_eq!("Robust".parse::<VarianceMethod>().unwrap(), VarianceMethod::Direct);
        assert_eq!("auto".parse::<VarianceMethod>().unwrap(), VarianceMethod::Auto);
        assert!("median".parse::<VarianceMethod>().is_err());
        assert_eq!(VarianceMethod::Direct.to_string(), "direct");
    }

    #[test]
    fn single_cell_window_is_zero() {
        let dem = sinusoid(10, 10);
        let est = RoughnessEstimator::new(1, VarianceMethod::Separable).unwrap().estimate(&dem).unwrap();
        assert_abs_diff_eq!(est.field.max_value(), 0.0, epsilon = 1e-9);
    }
}
