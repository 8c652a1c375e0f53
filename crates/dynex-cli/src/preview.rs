//! Grayscale PNG previews of pipeline stages.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use dynex_core::{ExaggerationResult, Grid};
use image::GrayImage;
use tracing::info;

/// Linear min→0, max→255 stretch. A constant grid maps to mid-gray.
fn to_gray(grid: &Grid) -> Vec<u8> {
    let (lo, hi) = (grid.min_value(), grid.max_value());
    let span = hi - lo;
    grid.data
        .iter()
        .map(|&v| {
            if !(span > 0.0) || !v.is_finite() {
                128
            } else {
                ((v - lo) / span * 255.0).round().clamp(0.0, 255.0) as u8
            }
        })
        .collect()
}

fn write_png(grid: &Grid, path: &Path) -> Result<()> {
    let img = GrayImage::from_raw(grid.width as u32, grid.height as u32, to_gray(grid))
        .context("grid dimensions do not match its data")?;
    img.save(path)
        .with_context(|| format!("Cannot write {}", path.display()))?;
    Ok(())
}

/// Write elevation, roughness, weights and output images into `out_dir`.
pub fn write_previews(elevation: &Grid, result: &ExaggerationResult, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Cannot create {}", out_dir.display()))?;

    let layers = [
        ("elevation.png", elevation),
        ("roughness.png", &result.roughness),
        ("weights.png", &result.weights),
        ("exaggerated.png", &result.exaggerated),
    ];
    for (name, grid) in layers {
        let path = out_dir.join(name);
        write_png(grid, &path)?;
        info!("wrote {}", path.display());
    }
    Ok(())
}
