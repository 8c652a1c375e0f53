//! Moving-window primitives over a `Grid`.
//!
//! Every window is `size` cells wide per axis. Cells outside the grid are
//! supplied by half-sample symmetric reflection, so each window is always
//! full-sized, even when it is wider than the grid itself:
//!
//! ```text
//!   d c b a | a b c d | d c b a
//! ```
//!
//! Window placement for even sizes follows the usual uniform-filter
//! convention: the extra cell falls before the centre (`size = 4` covers
//! offsets −2..=+1).
use crate::grid::Grid;
use crate::parallel::*;

/// Offsets `(before, after)` of a `size`-wide window around its centre cell.
///
/// `size` must be ≥ 1.
#[inline]
pub fn window_extent(size: usize) -> (usize, usize) {
    let before = size / 2;
    (before, size - before - 1)
}

/// Map a possibly out-of-range index onto `0..n` by repeated reflection.
#[inline]
pub fn reflect_index(i: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = i.rem_euclid(period);
    if m < n as isize {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

/// Running-sum box mean along one line.
fn box_mean_line(line: &[f64], size: usize, out: &mut [f64]) {
    let n = line.len();
    let (before, after) = window_extent(size);
    let at = |i: isize| line[reflect_index(i, n)];
    let norm = size as f64;

    let window_sum = |i: isize| -> f64 { (0..size as isize).map(|k| at(i - before as isize + k)).sum() };

    let mut sum = window_sum(0);
    out[0] = sum / norm;
    for i in 1..n as isize {
        // Re-seed every `size` steps so rounding drift stays bounded by the
        // window length rather than the line length.
        if i as usize % size == 0 {
            sum = window_sum(i);
        } else {
            sum += at(i + after as isize) - at(i - before as isize - 1);
        }
        out[i as usize] = sum / norm;
    }
}

/// Box mean along every row.
fn box_mean_rows(grid: &Grid, size: usize) -> Grid {
    let width = grid.width;
    let data: Vec<f64> = (0..grid.height)
        .into_par_iter()
        .flat_map(|r| {
            let mut out = vec![0.0; width];
            box_mean_line(grid.row(r), size, &mut out);
            out
        })
        .collect();
    Grid {
        data,
        width,
        height: grid.height,
    }
}

/// Separable `size`×`size` uniform (box) filter.
///
/// Columns are filtered first, then rows. Each pass is a running sum, so the
/// cost per cell does not grow with `size`. `size <= 1` is the identity.
pub fn box_mean(grid: &Grid, size: usize) -> Grid {
    if size <= 1 {
        return grid.clone();
    }
    let columns = box_mean_rows(&grid.transpose(), size).transpose();
    box_mean_rows(&columns, size)
}

/// Population standard deviation of every `size`×`size` window, evaluated
/// directly: O(size²) per cell.
pub fn window_std(grid: &Grid, size: usize) -> Grid {
    let (width, height) = (grid.width, grid.height);
    if size <= 1 {
        return Grid::new(width, height, 0.0);
    }
    let (before, _) = window_extent(size);
    let n = (size * size) as f64;

    let data: Vec<f64> = (0..height)
        .into_par_iter()
        .flat_map(|r| {
            let mut window = Vec::with_capacity(size * size);
            let mut row_out = vec![0.0; width];
            for (c, out) in row_out.iter_mut().enumerate() {
                window.clear();
                for dr in 0..size as isize {
                    let rr = reflect_index(r as isize - before as isize + dr, height);
                    for dc in 0..size as isize {
                        let cc = reflect_index(c as isize - before as isize + dc, width);
                        window.push(grid.get(rr, cc));
                    }
                }
                let mean = window.iter().sum::<f64>() / n;
                let var = window
                    .iter()
                    .map(|&v| {
                        let d = v - mean;
                        d * d
                    })
                    .sum::<f64>()
                    / n;
                *out = var.sqrt();
            }
            row_out
        })
        .collect();

    Grid { data, width, height }
}
