//! Discrete elevation gradient and slope magnitude.
//!
//! Unit cell spacing: slopes are rise per cell, not per metre. The roughness
//! metric only compares slopes against each other, so the georeferenced cell
//! size never enters the computation.
use crate::grid::Grid;

/// Derivative along one line: central differences inside, first-order
/// one-sided differences at both ends. A line of length 1 has zero derivative.
fn diff_line(line: &[f64], out: &mut [f64]) {
    let n = line.len();
    if n < 2 {
        out.iter_mut().for_each(|v| *v = 0.0);
        return;
    }
    out[0] = line[1] - line[0];
    for i in 1..n - 1 {
        out[i] = (line[i + 1] - line[i - 1]) / 2.0;
    }
    out[n - 1] = line[n - 1] - line[n - 2];
}

/// Gradient of `grid` along both axes.
///
/// Returns `(d_row, d_col)`: the derivative down the rows (axis 0) and
/// across the columns (axis 1), each the same shape as `grid`.
pub fn gradient(grid: &Grid) -> (Grid, Grid) {
    let mut d_col = Grid::new(grid.width, grid.height, 0.0);
    for r in 0..grid.height {
        let start = r * grid.width;
        diff_line(grid.row(r), &mut d_col.data[start..start + grid.width]);
    }

    let transposed = grid.transpose();
    let mut d_row_t = Grid::new(transposed.width, transposed.height, 0.0);
    for r in 0..transposed.height {
        let start = r * transposed.width;
        diff_line(transposed.row(r), &mut d_row_t.data[start..start + transposed.width]);
    }

    (d_row_t.transpose(), d_col)
}

/// Euclidean norm of the gradient at every cell.
pub fn slope_magnitude(grid: &Grid) -> Grid {
    let (d_row, d_col) = gradient(grid);
    let data = d_row
        .data
        .iter()
        .zip(&d_col.data)
        .map(|(&gr, &gc)| (gr * gr + gc * gc).sqrt())
        .collect();
    Grid {
        data,
        width: grid.width,
        height: grid.height,
    }
}
