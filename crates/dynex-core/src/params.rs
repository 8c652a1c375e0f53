use serde::{Deserialize, Serialize};

use crate::blend::TanhCurve;
use crate::error::{Error, Result};
use crate::roughness::VarianceMethod;

pub const DEFAULT_NEIGHBORHOOD: usize = 15;
pub const DEFAULT_Q: f64 = 6.0;
pub const DEFAULT_BLUR: usize = 30;

/// Shared check for the exaggeration factor and the damping factor.
pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: "must be a finite number greater than 0",
        })
    }
}

fn default_neighborhood() -> usize {
    DEFAULT_NEIGHBORHOOD
}

fn default_q() -> f64 {
    DEFAULT_Q
}

fn default_blur() -> usize {
    DEFAULT_BLUR
}

/// Tunables for one exaggeration run.
///
/// `exaggeration` has no default; every other field falls back to the
/// defaults above when omitted from JSON.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExaggerationParams {
    /// Uniform exaggeration applied after the roughness-aware blend (typically 1-30).
    pub exaggeration: f64,
    /// Side length, in cells, of the slope-deviation window (default 15).
    #[serde(default = "default_neighborhood")]
    pub neighborhood: usize,
    /// Damping of the roughness-weighted term; larger is closer to uniform (default 6).
    #[serde(default = "default_q")]
    pub q: f64,
    /// Side length of the box blur applied to roughness; 0 or 1 disables it (default 30).
    #[serde(default = "default_blur")]
    pub blur: usize,
    #[serde(default)]
    pub variance: VarianceMethod,
    #[serde(default)]
    pub curve: TanhCurve,
}

impl ExaggerationParams {
    /// Parameters with every tunable at its default.
    pub fn new(exaggeration: f64) -> Self {
        Self {
            exaggeration,
            neighborhood: DEFAULT_NEIGHBORHOOD,
            q: DEFAULT_Q,
            blur: DEFAULT_BLUR,
            variance: VarianceMethod::default(),
            curve: TanhCurve::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_positive("exaggeration", self.exaggeration)?;
        if self.neighborhood == 0 {
            return Err(Error::InvalidParameter {
                name: "neighborhood",
                value: self.neighborhood.to_string(),
                reason: "must be at least 1",
            });
        }
        check_positive("q", self.q)?;
        if !self.curve.offset.is_finite() {
            return Err(Error::InvalidParameter {
                name: "curve.offset",
                value: self.curve.offset.to_string(),
                reason: "must be finite",
            });
        }
        Ok(())
    }
}
