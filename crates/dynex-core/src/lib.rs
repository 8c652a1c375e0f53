//! Terrain-roughness-aware vertical exaggeration of digital elevation models.
//!
//! Smooth regions (plains) are exaggerated more than rough regions
//! (mountains), so high- and low-relief terrain both read well in the same 3D
//! view. Roughness is the local standard deviation of slope magnitude.
//!
//! ```no_run
//! use dynex_core::{exaggerate, ExaggerationParams, Grid};
//!
//! let dem = Grid::from_fn(64, 64, |r, c| (r as f64 * 0.1).sin() * 50.0 + c as f64);
//! let out = exaggerate(&dem, &ExaggerationParams::new(2.0))?;
//! # Ok::<(), dynex_core::Error>(())
//! ```
pub mod blend;
pub mod error;
pub mod filter;
pub mod gradient;
pub mod grid;
mod parallel;
pub mod params;
pub mod pipeline;
pub mod roughness;

pub use blend::{ExaggerationBlender, RoughnessStats, TanhCurve, WeightCurve};
pub use error::{Error, Result};
pub use grid::{ElevationGrid, ExaggerationWeightField, Grid, RoughnessField};
pub use params::ExaggerationParams;
pub use pipeline::{exaggerate, DynamicExaggeration, ExaggerationResult};
pub use roughness::{RoughnessEstimate, RoughnessEstimator, VarianceMethod};
