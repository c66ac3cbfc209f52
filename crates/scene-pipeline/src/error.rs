//! Error types for the scene pipeline.

use geo_common::GeoError;
use projection::ProjectionError;
use thiserror::Error;

/// Errors that can occur while decoding, accumulating, reprojecting or
/// sampling scenes.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Rasters that must share a grid do not.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A row/col falls outside a raster.
    #[error("index (row {row}, col {col}) is outside the {height}x{width} raster")]
    OutOfBounds {
        row: i64,
        col: i64,
        height: usize,
        width: usize,
    },

    /// Invalid extent, resolution or coordinate.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Projection or indexing failure.
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// A scene whose arrays do not agree with its declared shape.
    #[error("invalid scene: {0}")]
    InvalidScene(String),

    /// Nothing to accumulate.
    #[error("cannot accumulate an empty sequence of rasters")]
    EmptyAccumulation,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage/IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl PipelineError {
    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an InvalidScene error.
    pub fn invalid_scene(msg: impl Into<String>) -> Self {
        Self::InvalidScene(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True if the error only means "outside the satellite's view".
    pub fn is_out_of_view(&self) -> bool {
        matches!(self, Self::Projection(e) if e.is_out_of_view())
    }
}

impl From<GeoError> for PipelineError {
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

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
