//! Error types for the exaggeration pipeline

use thiserror::Error;

/// Failures the pipeline reports instead of computing.
///
/// All of them are caller misconfiguration or malformed input; the numeric
/// edge cases (negative variance, constant roughness) are handled in place.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Grid shape mismatch: expected {expected_width}x{expected_height}, got {actual_width}x{actual_height}")]
    ShapeMismatch {
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },

    #[error("Grid of {width}x{height} cells is smaller than the {window}x{window} neighbourhood")]
    GridTooSmall {
        width: usize,
        height: usize,
        window: usize,
    },

    #[error("Grid data length {len} does not match {width}x{height}")]
    DataLength { len: usize, width: usize, height: usize },

    #[error("Grid has no cells")]
    EmptyGrid,

    #[error("Unknown variance method: {0} (expected separable, direct or auto)")]
    UnknownVarianceMethod(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
