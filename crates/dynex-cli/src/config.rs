//! Parameter resolution: command-line flags over an optional JSON params
//! file over built-in defaults.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use dynex_core::{ExaggerationParams, TanhCurve, VarianceMethod};
use serde::Deserialize;

/// Exaggeration tunables accepted on the command line.
#[derive(Args, Debug, Clone, Default)]
pub struct Tunables {
    /// Uniform exaggeration factor applied after the roughness blend (required
    /// here or in the params file)
    #[arg(short = 'f', long = "factor")]
    pub exaggeration: Option<f64>,

    /// Slope-deviation window side length in cells [default: 15]
    #[arg(short, long)]
    pub neighborhood: Option<usize>,

    /// Damping factor; larger values approach uniform exaggeration [default: 6]
    #[arg(short, long)]
    pub q: Option<f64>,

    /// Roughness blur window side length; 0 or 1 disables blurring [default: 30]
    #[arg(short, long)]
    pub blur: Option<usize>,

    /// Local variance strategy: separable, direct or auto [default: separable]
    #[arg(long)]
    pub variance: Option<VarianceMethod>,

    /// Offset of the `offset − tanh(z)` weight curve [default: 2]
    #[arg(long)]
    pub curve_offset: Option<f64>,

    /// JSON file with any of the above (keys: exaggeration, neighborhood, q,
    /// blur, variance, curve.offset)
    #[arg(long)]
    pub params: Option<PathBuf>,
}

/// Params file contents; every key is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(default, deny_unknown_fields)]
struct ParamsFile {
    exaggeration: Option<f64>,
    neighborhood: Option<usize>,
    q: Option<f64>,
    blur: Option<usize>,
    variance: Option<VarianceMethod>,
    curve: Option<TanhCurve>,
}

fn load_params_file(path: &Path) -> Result<ParamsFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

impl Tunables {
    /// Merge flags, params file and defaults, then validate.
    pub fn resolve(&self) -> Result<ExaggerationParams> {
        let file = match &self.params {
            Some(path) => load_params_file(path)?,
            None => ParamsFile::default(),
        };
        self.merge(file)
    }

    fn merge(&self, file: ParamsFile) -> Result<ExaggerationParams> {
        let exaggeration = self
            .exaggeration
            .or(file.exaggeration)
            .context("an exaggeration factor is required (pass --factor or set it in the params file)")?;

        let mut params = ExaggerationParams::new(exaggeration);
        if let Some(n) = self.neighborhood.or(file.neighborhood) {
            params.neighborhood = n;
        }
        if let Some(q) = self.q.or(file.q) {
            params.q = q;
        }
        if let Some(b) = self.blur.or(file.blur) {
            params.blur = b;
        }
        if let Some(v) = self.variance.or(file.variance) {
            params.variance = v;
        }
        if let Some(curve) = file.curve {
            params.curve = curve;
        }
        if let Some(offset) = self.curve_offset {
            params.curve.offset = offset;
        }

        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(json: &str) -> ParamsFile {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn defaults_apply_when_only_factor_given() {
        let t = Tunables { exaggeration: Some(3.0), ..Tunables::default() };
        let p = t.merge(ParamsFile::default()).unwrap();
        assert_eq!(p, ExaggerationParams::new(3.0));
    }

    #[test]
    fn flags_override_file_values() {
        let t = Tunables {
            q: Some(10.0),
            variance: Some(VarianceMethod::Auto),
            ..Tunables::default()
        };
        let p = t
            .merge(file(r#"{ "exaggeration": 4, "q": 2, "blur": 7, "variance": "direct" }"#))
            .unwrap();
        assert_eq!(p.exaggeration, 4.0);
        assert_eq!(p.q, 10.0);
        assert_eq!(p.blur, 7);
        assert_eq!(p.variance, VarianceMethod::Auto);
        assert_eq!(p.neighborhood, 15);
    }

    #[test]
    fn curve_offset_flag_wins_over_file_curve() {
        let t = Tunables { curve_offset: Some(2.5), ..Tunables::default() };
        let p = t
            .merge(file(r#"{ "exaggeration": 1, "curve": { "offset": 3 } }"#))
            .unwrap();
        assert_eq!(p.curve.offset, 2.5);
    }

    #[test]
    fn missing_factor_is_an_error() {
        let err = Tunables::default().merge(ParamsFile::default()).unwrap_err();
        assert!(err.to_string().contains("exaggeration factor is required"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let t = Tunables { exaggeration: Some(2.0), q: Some(0.0), ..Tunables::default() };
        assert!(t.merge(ParamsFile::default()).is_err());
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        assert!(serde_json::from_str::<ParamsFile>(r#"{ "exagerration": 2 }"#).is_err());
    }
}
