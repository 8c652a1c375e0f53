//! Roughness-weighted vertical exaggeration.
//!
//! Pipeline for one grid:
//!   1. Box-blur the roughness field (`blur` ≤ 1 leaves it untouched).
//!   2. z-score every cell against the GLOBAL mean and standard deviation
//!      of the blurred field.
//!   3. weight = curve(z); the default curve is `2 − tanh(z)`, so rough cells
//!      (high z) approach 1 and smooth cells (low z) approach 3.
//!   4. raw    = elevation · weight
//!   5. damped = elevation + (raw − elevation) / q
//!   6. output = damped · exaggeration
//!
//! `q` pulls the result back toward the unmodified elevation; as q → ∞ the
//! output degrades to plain uniform exaggeration.
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::filter::box_mean;
use crate::grid::{ElevationGrid, ExaggerationWeightField, Grid, RoughnessField};
use crate::params::check_positive;

/// Relative threshold below which the blurred roughness field is treated as
/// constant.
const DEGENERATE_STD: f64 = 1e-12;

/// Maps a roughness z-score to an exaggeration weight.
pub trait WeightCurve {
    fn weight(&self, z: f64) -> f64;

    /// Weight assigned to every cell when the roughness field is constant.
    fn neutral(&self) -> f64 {
        self.weight(0.0)
    }
}

/// `weight = offset − tanh(z)`.
///
/// tanh saturates extreme z-scores so a handful of outlier cells cannot
/// dominate. With the default offset of 2 weights lie in (1, 3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TanhCurve {
    pub offset: f64,
}

impl Default for TanhCurve {
    fn default() -> Self {
        Self { offset: 2.0 }
    }
}

impl WeightCurve for TanhCurve {
    #[inline]
    fn weight(&self, z: f64) -> f64 {
        self.offset - z.tanh()
    }
}

/// Global statistics of the blurred roughness field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoughnessStats {
    pub mean: f64,
    pub std: f64,
    /// True when `std` was too small for z-scores and every weight was set
    /// to the curve's neutral value.
    pub degenerate: bool,
}

/// Output of [`ExaggerationBlender::weights`].
#[derive(Debug, Clone)]
pub struct WeightEstimate {
    pub field: ExaggerationWeightField,
    pub stats: RoughnessStats,
}

/// Output of [`ExaggerationBlender::blend`].
///
/// `weights` and `stats` are kept so callers can inspect or render the
/// intermediate fields.
#[derive(Debug, Clone)]
pub struct Blend {
    pub exaggerated: ElevationGrid,
    pub weights: ExaggerationWeightField,
    pub stats: RoughnessStats,
}

/// Turns roughness into weights and blends them into the elevation.
#[derive(Debug, Clone, Copy)]
pub struct ExaggerationBlender<C = TanhCurve> {
    exaggeration: f64,
    q: f64,
    blur: usize,
    curve: C,
}

impl ExaggerationBlender<TanhCurve> {
    /// Blender with the default `2 − tanh(z)` curve.
    ///
    /// Rejects non-finite or non-positive `exaggeration` and `q`; a q of zero
    /// would divide the dynamic term by zero.
    pub fn new(exaggeration: f64, q: f64, blur: usize) -> Result<Self> {
        check_positive("exaggeration", exaggeration)?;
        check_positive("q", q)?;
        Ok(Self {
            exaggeration,
            q,
            blur,
            curve: TanhCurve::default(),
        })
    }
}

impl<C: WeightCurve> ExaggerationBlender<C> {
    /// Replace the weight curve, keeping the other settings.
    pub fn with_curve<D: WeightCurve>(self, curve: D) -> ExaggerationBlender<D> {
        ExaggerationBlender {
            exaggeration: self.exaggeration,
            q: self.q,
            blur: self.blur,
            curve,
        }
    }

    /// Blur the roughness field and map it through the weight curve.
    pub fn weights(&self, roughness: &RoughnessField) -> WeightEstimate {
        let filtered = box_mean(roughness, self.blur);
        let mean = filtered.mean();
        let std = filtered.std();

        if !(std > DEGENERATE_STD * mean.abs().max(1.0)) {
            let neutral = self.curve.neutral();
            warn!(
                mean,
                std,
                neutral,
                "roughness field is constant after blurring; using neutral weight everywhere"
            );
            return WeightEstimate {
                field: Grid::new(roughness.width, roughness.height, neutral),
                stats: RoughnessStats {
                    mean,
                    std,
                    degenerate: true,
                },
            };
        }

        let field = filtered.map(|v| self.curve.weight((v - mean) / std));
        WeightEstimate {
            field,
            stats: RoughnessStats {
                mean,
                std,
                degenerate: false,
            },
        }
    }

    /// Exaggerate `elevation` using weights derived from `roughness`.
    ///
    /// The two grids must be well-formed and have the same shape.
    pub fn blend(&self, elevation: &ElevationGrid, roughness: &RoughnessField) -> Result<Blend> {
        elevation.validate()?;
        roughness.validate()?;
        if !elevation.same_shape(roughness) {
            return Err(Error::ShapeMismatch {
                expected_width: elevation.width,
                expected_height: elevation.height,
                actual_width: roughness.width,
                actual_height: roughness.height,
            });
        }

        let WeightEstimate { field: weights, stats } = self.weights(roughness);

        let data = elevation
            .data
            .iter()
            .zip(&weights.data)
            .map(|(&e, &w)| {
                let raw = e * w;
                let damped = e + (raw - e) / self.q;
                damped * self.exaggeration
            })
            .collect();

        debug!(
            blur = self.blur,
            q = self.q,
            exaggeration = self.exaggeration,
            roughness_mean = stats.mean,
            roughness_std = stats.std,
            "exaggeration blended"
        );

        Ok(Blend {
            exaggerated: Grid {
                data,
                width: elevation.width,
                height: elevation.height,
            },
            weights,
            stats,
        })
    }
}
