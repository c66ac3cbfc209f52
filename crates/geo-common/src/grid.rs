//! Regular latitude/longitude grids.

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, GeoResult};
use crate::{BoundingBox, GeoTransform};

/// Relative slack applied before taking the ceiling of `span / resolution`.
///
/// `39.5 / 0.02` evaluates to `1975.0000000000002`; without the slack an
/// exact multiple would gain a spurious extra row.
const CELL_COUNT_TOLERANCE: f64 = 1e-9;

/// A regular lat/lon grid, stored north-to-south, west-to-east.
///
/// Row 0 is the northernmost row (its top edge is `max_lat`), column 0 the
/// westernmost column (its left edge is `min_lon`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoGrid {
    pub extent: BoundingBox,
    pub x_res: f64,
    pub y_res: f64,
    pub width: usize,
    pub height: usize,
}

impl GeoGrid {
    /// Build the grid covering `extent` at the given resolution.
    ///
    /// Shape is `(ceil(height / y_res), ceil(width / x_res))`.
    pub fn new(extent: BoundingBox, x_res: f64, y_res: f64) -> GeoResult<Self> {
        extent.validate()?;
        for (name, res) in [("x_res", x_res), ("y_res", y_res)] {
            if !res.is_finite() || res <= 0.0 {
                return Err(GeoError::InvalidResolution(format!(
                    "{} must be a positive finite number, got {}",
                    name, res
                )));
            }
        }

        Ok(Self {
            extent,
            x_res,
            y_res,
            width: cell_count(extent.width(), x_res),
            height: cell_count(extent.height(), y_res),
        })
    }

    /// Grid shape as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Total number of cells.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Geographic center of cell (row, col) as (lon, lat).
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        let lon = self.extent.min_lon + (col as f64 + 0.5) * self.x_res;
        let lat = self.extent.max_lat - (row as f64 + 0.5) * self.y_res;
        (lon, lat)
    }

    /// Cell containing a geographic point.
    ///
    /// `col = floor((lon - min_lon) / x_res)`, `row = floor((max_lat - lat) / y_res)`.
    pub fn cell_of(&self, lon: f64, lat: f64) -> GeoResult<(usize, usize)> {
        let col = ((lon - self.extent.min_lon) / self.x_res).floor();
        let row = ((self.extent.max_lat - lat) / self.y_res).floor();

        if !row.is_finite() || !col.is_finite() {
            return Err(GeoError::InvalidCoordinate(format!(
                "cannot index non-finite point (lon={}, lat={})",
                lon, lat
            )));
        }

        let (row, col) = (row as i64, col as i64);
        if row < 0 || col < 0 || row >= self.height as i64 || col >= self.width as i64 {
            return Err(GeoError::OutOfBounds {
                row,
                col,
                height: self.height,
                width: self.width,
            });
        }

        Ok((row as usize, col as usize))
    }

    /// Flat row-major index.
    pub fn flat_index(&self, row: usize, col: usize) -> usize {
        row * self.width + col
    }

    /// North-up GDAL geotransform for this grid.
    pub fn geotransform(&self) -> GeoTransform {
        GeoTransform::north_up(
            self.extent.min_lon,
            self.x_res,
            self.extent.max_lat,
            -self.y_res,
        )
    }
}

fn cell_count(span: f64, res: f64) -> usize {
    let cells = span / res;
    (cells - cells.abs() * CELL_COUNT_TOLERANCE).ceil().max(0.0) as usize
}
