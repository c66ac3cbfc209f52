//! Cropping a native fixed-grid raster to a geographic extent.
//!
//! Useful before accumulation when only a region is of interest: the four
//! extent corners are projected into the native grid and the raster is cut
//! to the row/col window that contains them.

use geo_common::{BoundingBox, GeodeticCoordinate};
use projection::{to_pixel, EllipsoidModel, GridCalibration, NativeProjection};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::types::MaskedRaster;

/// Row/col window of a raster, end-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl PixelWindow {
    pub fn width(&self) -> usize {
        self.col_end - self.col_start
    }

    pub fn height(&self) -> usize {
        self.row_end - self.row_start
    }
}

/// Native window covering `extent`, clamped to the raster.
///
/// The raster must be on the fixed grid of `model`, and every corner must be
/// in view of the satellite.
pub fn native_window(
    raster: &MaskedRaster,
    model: &EllipsoidModel,
    extent: BoundingBox,
) -> Result<PixelWindow> {
    extent.validate()?;
    match NativeProjection::parse(&raster.projection)? {
        NativeProjection::Geostationary(native) if native.same_geometry(model) => {}
        NativeProjection::Geostationary(native) => {
            return Err(PipelineError::invalid_input(format!(
                "raster is on the fixed grid at lon_0={}, model is at lon_0={}",
                native.sub_satellite_longitude, model.sub_satellite_longitude
            )));
        }
        NativeProjection::LatLon => {
            return Err(PipelineError::invalid_input(
                "raster is already on a lat/lon grid, not a native fixed grid",
            ));
        }
    }
    let calibration =
        GridCalibration::from_geotransform(&raster.geotransform, model.perspective_point_height)?;

    let corners = [
        (extent.max_lat, extent.min_lon),
        (extent.max_lat, extent.max_lon),
        (extent.min_lat, extent.min_lon),
        (extent.min_lat, extent.max_lon),
    ];

    let (mut row_min, mut row_max) = (i64::MAX, i64::MIN);
    let (mut col_min, mut col_max) = (i64::MAX, i64::MIN);
    for (lat, lon) in corners {
        let scan = model.to_scan(GeodeticCoordinate::new(lat, lon)?)?;
        let (row, col) = to_pixel(scan, &calibration)?;
        row_min = row_min.min(row);
        row_max = row_max.max(row);
        col_min = col_min.min(col);
        col_max = col_max.max(col);
    }

    let (height, width) = (raster.height as i64, raster.width as i64);
    if row_max < 0 || col_max < 0 || row_min >= height || col_min >= width {
        return Err(PipelineError::OutOfBounds {
            row: row_min,
            col: col_min,
            height: raster.height,
            width: raster.width,
        });
    }

    Ok(PixelWindow {
        row_start: row_min.max(0) as usize,
        row_end: (row_max + 1).min(height) as usize,
        col_start: col_min.max(0) as usize,
        col_end: (col_max + 1).min(width) as usize,
    })
}

/// Cut `raster` down to the native window covering `extent`.
pub fn crop_to_extent(
    raster: &MaskedRaster,
    model: &EllipsoidModel,
    extent: BoundingBox,
) -> Result<MaskedRaster> {
    let window = native_window(raster, model, extent)?;

    let values: Vec<f32> = (window.row_start..window.row_end)
        .flat_map(|row| {
            let start = row * raster.width;
            raster.values[start + window.col_start..start + window.col_end].iter().copied()
        })
        .collect();

    debug!(
        rows = window.height(),
        cols = window.width(),
        row_start = window.row_start,
        col_start = window.col_start,
        "Cropped native raster"
    );

    MaskedRaster::new(
        window.width(),
        window.height(),
        values,
        raster.geotransform.window(window.row_start, window.col_start),
        raster.projection.clone(),
    )
}
