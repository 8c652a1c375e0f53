//! Pipeline orchestrator: roughness estimation followed by the exaggeration blend.
//!
//! Pipeline order:
//!   1. Gradient → slope magnitude
//!   2. Local slope deviation (RoughnessEstimator)
//!   3. Roughness blur → global z-score → weights (ExaggerationBlender)
//!   4. Blend with the elevation → damping → uniform scaling
//!
//! Step 3 needs the whole blurred field for its global statistics, so the two
//! components run strictly one after the other. Roughness is handed over in
//! memory.

use tracing::info;

use crate::blend::{ExaggerationBlender, RoughnessStats, TanhCurve};
use crate::error::{Error, Result};
use crate::grid::{ElevationGrid, ExaggerationWeightField, RoughnessField};
use crate::params::ExaggerationParams;
use crate::roughness::{RoughnessEstimator, VarianceMethod};

/// Full output of one exaggeration run.
#[derive(Debug, Clone)]
pub struct ExaggerationResult {
    pub exaggerated: ElevationGrid,
    /// Unblurred roughness, kept for diagnostics.
    pub roughness: RoughnessField,
    pub weights: ExaggerationWeightField,
    pub stats: RoughnessStats,
    /// Variance strategy that actually ran.
    pub method: VarianceMethod,
}

/// Roughness-aware vertical exaggeration over in-memory grids.
#[derive(Debug, Clone, Copy)]
pub struct DynamicExaggeration {
    estimator: RoughnessEstimator,
    blender: ExaggerationBlender<TanhCurve>,
    params: ExaggerationParams,
}

impl DynamicExaggeration {
    pub fn new(params: ExaggerationParams) -> Result<Self> {
        params.validate()?;
        let estimator = RoughnessEstimator::new(params.neighborhood, params.variance)?;
        let blender = ExaggerationBlender::new(params.exaggeration, params.q, params.blur)?
            .with_curve(params.curve);
        Ok(Self {
            estimator,
            blender,
            params,
        })
    }

    pub fn params(&self) -> &ExaggerationParams {
        &self.params
    }

    pub fn estimator(&self) -> &RoughnessEstimator {
        &self.estimator
    }

    pub fn blender(&self) -> &ExaggerationBlender<TanhCurve> {
        &self.blender
    }

    /// Run the full pipeline on `elevation`.
    ///
    /// Rejects grids with no cells and grids smaller than the neighbourhood
    /// along either axis.
    pub fn run(&self, elevation: &ElevationGrid) -> Result<ExaggerationResult> {
        check_grid(elevation, self.params.neighborhood)?;

        let roughness = self.estimator.estimate(elevation)?;
        let blend = self.blender.blend(elevation, &roughness.field)?;

        info!(
            width = elevation.width,
            height = elevation.height,
            method = %roughness.method,
            degenerate = blend.stats.degenerate,
            "dynamic exaggeration complete"
        );

        Ok(ExaggerationResult {
            exaggerated: blend.exaggerated,
            roughness: roughness.field,
            weights: blend.weights,
            stats: blend.stats,
            method: roughness.method,
        })
    }
}

/// Shape checks shared by every entry point that takes an elevation grid.
pub fn check_grid(elevation: &ElevationGrid, neighborhood: usize) -> Result<()> {
    elevation.validate()?;
    if elevation.width < neighborhood || elevation.height < neighborhood {
        return Err(Error::GridTooSmall {
            width: elevation.width,
            height: elevation.height,
            window: neighborhood,
        });
    }
    Ok(())
}

/// Run the pipeline once and return only the exaggerated grid.
pub fn exaggerate(elevation: &ElevationGrid, params: &ExaggerationParams) -> Result<ElevationGrid> {
    Ok(DynamicExaggeration::new(*params)?.run(elevation)?.exaggerated)
}
