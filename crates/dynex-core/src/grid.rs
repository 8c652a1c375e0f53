use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A 2D grid of f64 samples, row-major.
///
/// The same container carries elevations, roughness magnitudes and
/// exaggeration weights; the aliases below name the role a grid plays.
/// Cell spacing and georeference live outside the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// Row-major samples.
    pub data: Vec<f64>,
    pub width: usize,
    pub height: usize,
}

/// Elevation samples as read from a DEM.
pub type ElevationGrid = Grid;
/// Local standard deviation of slope magnitude; every value is ≥ 0.
pub type RoughnessField = Grid;
/// Dimensionless per-cell exaggeration multipliers.
pub type ExaggerationWeightField = Grid;

impl Grid {
    /// Create a grid filled with the given value.
    pub fn new(width: usize, height: usize, fill: f64) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
        }
    }

    /// Wrap an existing row-major buffer.
    pub fn from_vec(data: Vec<f64>, width: usize, height: usize) -> Result<Self> {
        let grid = Self { data, width, height };
        grid.validate()?;
        Ok(grid)
    }

    /// Reject grids with no cells or whose buffer does not hold exactly
    /// `width * height` samples.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::EmptyGrid);
        }
        if self.data.len() != self.width * self.height {
            return Err(Error::DataLength {
                len: self.data.len(),
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Build a grid by evaluating `f(row, col)` at every cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for r in 0..height {
            for c in 0..width {
                data.push(f(r, c));
            }
        }
        Self { data, width, height }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: f64) {
        self.data[row * self.width + col] = val;
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.width..(row + 1) * self.width]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn same_shape(&self, other: &Grid) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Arithmetic mean over every cell. NaN for an empty grid.
    pub fn mean(&self) -> f64 {
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    /// Population standard deviation (divides by N) over every cell.
    pub fn std(&self) -> f64 {
        let mean = self.mean();
        let var = self
            .data
            .iter()
            .map(|&v| {
                let d = v - mean;
                d * d
            })
            .sum::<f64>()
            / self.data.len() as f64;
        var.sqrt()
    }

    pub fn min_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    pub fn max_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Apply `f` to every cell, producing a new grid of the same shape.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Grid {
        Grid {
            data: self.data.iter().map(|&v| f(v)).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Swap rows and columns.
    pub fn transpose(&self) -> Grid {
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..self.width {
            for r in 0..self.height {
                data.push(self.get(r, c));
            }
        }
        Grid {
            data,
            width: self.height,
            height: self.width,
        }
    }
}
