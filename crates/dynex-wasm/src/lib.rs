//! Browser bindings for dynamic exaggeration.
//!
//! Grids cross the boundary as flat row-major `Float64Array`s plus their
//! dimensions. Parameters are a plain JS object with the same keys as the
//! JSON params file; only `exaggeration` is required.
use dynex_core::{DynamicExaggeration, ExaggerationParams, Grid, RoughnessEstimator, VarianceMethod};
use wasm_bindgen::prelude::*;

fn to_grid(elevation: Vec<f64>, width: usize, height: usize) -> Result<Grid, String> {
    Grid::from_vec(elevation, width, height).map_err(|e| e.to_string())
}

fn run_exaggerate(
    elevation: Vec<f64>,
    width: usize,
    height: usize,
    params: ExaggerationParams,
) -> Result<Vec<f64>, String> {
    let grid = to_grid(elevation, width, height)?;
    let pipeline = DynamicExaggeration::new(params).map_err(|e| e.to_string())?;
    let result = pipeline.run(&grid).map_err(|e| e.to_string())?;
    Ok(result.exaggerated.data)
}

fn run_roughness(
    elevation: Vec<f64>,
    width: usize,
    height: usize,
    neighborhood: usize,
    variance: &str,
) -> Result<Vec<f64>, String> {
    let grid = to_grid(elevation, width, height)?;
    let method: VarianceMethod = variance.parse().map_err(|e: dynex_core::Error| e.to_string())?;
    let estimator = RoughnessEstimator::new(neighborhood, method).map_err(|e| e.to_string())?;
    let estimate = estimator.estimate(&grid).map_err(|e| e.to_string())?;
    Ok(estimate.field.data)
}

/// Exaggerate a DEM. `params` is `{ exaggeration, neighborhood?, q?, blur?,
/// variance?, curve? }`.
#[wasm_bindgen]
pub fn exaggerate(
    elevation: Vec<f64>,
    width: usize,
    height: usize,
    params: JsValue,
) -> Result<Vec<f64>, JsValue> {
    let params: ExaggerationParams = serde_wasm_bindgen::from_value(params)
        .map_err(|e| JsValue::from_str(&format!("Invalid params: {e}")))?;
    run_exaggerate(elevation, width, height, params).map_err(|e| JsValue::from_str(&e))
}

/// Local standard deviation of slope magnitude over a square window.
/// `variance` is `"separable"`, `"direct"` or `"auto"`.
#[wasm_bindgen]
pub fn roughness(
    elevation: Vec<f64>,
    width: usize,
    height: usize,
    neighborhood: usize,
    variance: &str,
) -> Result<Vec<f64>, JsValue> {
    run_roughness(elevation, width, height, neighborhood, variance).map_err(|e| JsValue::from_str(&e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bumpy(width: usize, height: usize) -> Vec<f64> {
        Grid::from_fn(width, height, |r, c| {
            100.0 + 10.0 * (r as f64 * 0.7).sin() + 3.0 * (c as f64 * 1.1).cos()
        })
        .data
    }

    #[test]
    fn exaggerate_matches_core_pipeline() {
        let params = ExaggerationParams { neighborhood: 5, blur: 3, ..ExaggerationParams::new(2.0) };
        let out = run_exaggerate(bumpy(12, 10), 12, 10, params).unwrap();
        let grid = Grid::from_vec(bumpy(12, 10), 12, 10).unwrap();
        let expected = dynex_core::exaggerate(&grid, &params).unwrap();
        assert_eq!(out, expected.data);
    }

    #[test]
    fn wrong_length_is_reported() {
        let err = run_exaggerate(vec![1.0; 5], 3, 2, ExaggerationParams::new(2.0)).unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn roughness_has_one_value_per_cell() {
        let out = run_roughness(bumpy(8, 6), 8, 6, 3, "separable").unwrap();
        assert_eq!(out.len(), 48);
        assert!(out.iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn direct_variance_is_reachable() {
        let fast = run_roughness(bumpy(10, 10), 10, 10, 5, "separable").unwrap();
        let slow = run_roughness(bumpy(10, 10), 10, 10, 5, "direct").unwrap();
        for (a, b) in fast.iter().zip(&slow) {
            assert!((a - b).abs() <= 1e-6 * b.abs().max(1.0), "{a} vs {b}");
        }
    }

    #[test]
    fn bad_roughness_arguments_are_rejected() {
        assert!(run_roughness(bumpy(4, 4), 4, 4, 0, "separable").is_err());
        let err = run_roughness(bumpy(4, 4), 4, 4, 3, "median").unwrap_err();
        assert!(err.contains("median"));
        assert!(run_roughness(vec![], 0, 4, 3, "direct").is_err());
    }
}
