//! Coordinate transformations between geodetic coordinates and the
//! geostationary fixed grid.
//!
//! - [`geostationary`]: lat/lon ⇄ scan angle for a satellite over an oblate ellipsoid
//! - [`calibration`]: scan angle → row/col of a specific product grid
//! - [`descriptor`]: PROJ.4 style projection strings carried by decoded scenes

pub mod calibration;
pub mod descriptor;
pub mod error;
pub mod geostationary;

pub use calibration::{to_pixel, to_pixel_checked, AxisCalibration, FixedGrid, GridCalibration};
pub use descriptor::NativeProjection;
pub use error::{ProjectionError, Result};
pub use geostationary::{to_geodetic, to_scan, EllipsoidModel, ScanCoordinate};
