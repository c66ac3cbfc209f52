//! Common types shared across the goes-raster crates.

pub mod bbox;
pub mod coord;
pub mod error;
pub mod geotransform;
pub mod grid;

pub use bbox::BoundingBox;
pub use coord::GeodeticCoordinate;
pub use error::{GeoError, GeoResult};
pub use geotransform::GeoTransform;
pub use grid::GeoGrid;
