//! Error types for the shared value types.

use thiserror::Error;

/// Result type alias using GeoError.
pub type GeoResult<T> = Result<T, GeoError>;

/// Errors raised while constructing or querying the shared geographic types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeoError {
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Invalid extent: {0}")]
    InvalidExtent(String),

    #[error("Invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("Invalid geotransform: {0}")]
    InvalidGeoTransform(String),

    #[error("Cell (row {row}, col {col}) is outside the {height}x{width} grid")]
    OutOfBounds {
        row: i64,
        col: i64,
        height: usize,
        width: usize,
    },
}

impl GeoError {
    /// True for errors caused by caller-supplied values rather than by
    /// a lookup falling outside a grid.
    pub fn is_invalid_input(&self) -> bool {
        !matches!(self, GeoError::OutOfBounds { .. })
    }
}
