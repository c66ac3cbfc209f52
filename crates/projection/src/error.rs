//! Error types for projection operations.

use geo_common::GeoError;
use thiserror::Error;

/// Errors that can occur while projecting or indexing coordinates.
///
/// Every variant is a per-call, recoverable condition: callers are expected
/// to branch on it (skip the point, skip the scene) rather than abort.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// Non-finite or out-of-range input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The point is not visible from the satellite.
    #[error("not visible from the satellite: {0}")]
    OutOfView(String),

    /// The computed index falls outside the grid.
    #[error("index (row {row}, col {col}) is outside the {height}x{width} grid")]
    OutOfBounds {
        row: i64,
        col: i64,
        height: usize,
        width: usize,
    },

    /// The projection descriptor could not be understood.
    #[error("invalid projection descriptor: {0}")]
    InvalidDescriptor(String),
}

impl ProjectionError {
    /// Create an InvalidInput error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an OutOfView error.
    pub fn out_of_view(msg: impl Into<String>) -> Self {
        Self::OutOfView(msg.into())
    }

    /// Create an InvalidDescriptor error.
    pub fn invalid_descriptor(msg: impl Into<String>) -> Self {
        Self::InvalidDescriptor(msg.into())
    }

    /// True if the error only means "outside the satellite's view".
    pub fn is_out_of_view(&self) -> bool {
        matches!(self, Self::OutOfView(_))
    }
}

impl From<GeoError> for ProjectionError {
    fn from(err: GeoError) -> Self {
        match err {
            GeoError::OutOfBounds {
                row,
                col,
                height,
                width,
            } => Self::OutOfBounds {
                row,
                col,
                height,
                width,
            },
            other => Self::InvalidInput(other.to_string()),
        }
    }
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
