//! Scan angle ⇄ pixel index for a specific product grid.
//!
//! GOES-R L2 products store `x`/`y` as packed integers with a NetCDF
//! `scale_factor`/`add_offset`. The unpacked value of index `i` is the scan
//! angle at the *center* of cell `i`; here each axis is kept as the
//! position of the cell's leading edge so lookup is a plain floor.

use geo_common::{BoundingBox, GeoTransform, GeodeticCoordinate};
use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};
use crate::geostationary::{EllipsoidModel, ScanCoordinate};

/// Linear mapping from one pixel axis to scan angle (radians).
///
/// `angle = offset + index * scale` gives the leading edge of cell `index`.
/// `scale` is negative on the y axis of north-up grids.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisCalibration {
    pub scale: f64,
    pub offset: f64,
}

impl AxisCalibration {
    /// Calibration whose cell 0 starts at `offset`.
    pub fn new(scale: f64, offset: f64) -> Result<Self> {
        if !scale.is_finite() || scale == 0.0 || !offset.is_finite() {
            return Err(ProjectionError::invalid_input(format!(
                "axis calibration needs a finite non-zero scale, got scale={} offset={}",
                scale, offset
            )));
        }
        Ok(Self { scale, offset })
    }

    /// Calibration from NetCDF packing attributes, where `center` is the
    /// unpacked value of index 0 (`add_offset`).
    pub fn from_cell_center(scale: f64, center: f64) -> Result<Self> {
        Self::new(scale, center - scale / 2.0)
    }

    /// Cell index containing `angle`.
    pub fn index(&self, angle: f64) -> f64 {
        ((angle - self.offset) / self.scale).floor()
    }

    /// Angle at the center of cell `index`.
    pub fn cell_center(&self, index: usize) -> f64 {
        self.offset + (index as f64 + 0.5) * self.scale
    }
}

/// Calibration of both axes of a fixed grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCalibration {
    /// Columns, east-west scan angle.
    pub x: AxisCalibration,
    /// Rows, north-south elevation angle.
    pub y: AxisCalibration,
}

impl GridCalibration {
    pub fn new(x: AxisCalibration, y: AxisCalibration) -> Self {
        Self { x, y }
    }

    /// Derive the calibration from a north-up geotransform expressed in
    /// native units. GDAL reports geostationary grids in meters, i.e.
    /// radians multiplied by the perspective point height, so pass
    /// `units_per_radian = h`; pass `1.0` for a transform already in radians.
    pub fn from_geotransform(gt: &GeoTransform, units_per_radian: f64) -> Result<Self> {
        gt.validate()?;
        if !units_per_radian.is_finite() || units_per_radian <= 0.0 {
            return Err(ProjectionError::invalid_input(format!(
                "units_per_radian must be positive, got {}",
                units_per_radian
            )));
        }
        Ok(Self {
            x: AxisCalibration::new(
                gt.pixel_width() / units_per_radian,
                gt.origin_x() / units_per_radian,
            )?,
            y: AxisCalibration::new(
                gt.pixel_height() / units_per_radian,
                gt.origin_y() / units_per_radian,
            )?,
        })
    }

    /// Geotransform in native units, the inverse of
    /// [`from_geotransform`](Self::from_geotransform).
    pub fn to_geotransform(&self, units_per_radian: f64) -> GeoTransform {
        GeoTransform::north_up(
            self.x.offset * units_per_radian,
            self.x.scale * units_per_radian,
            self.y.offset * units_per_radian,
            self.y.scale * units_per_radian,
        )
    }
}

/// Pixel (row, col) of a scan angle, unbounded.
///
/// Rounds by flooring against the leading cell edge, so a point exactly on
/// a boundary belongs to the cell it starts.
pub fn to_pixel(scan: ScanCoordinate, calibration: &GridCalibration) -> Result<(i64, i64)> {
    if !scan.x.is_finite() || !scan.y.is_finite() {
        return Err(ProjectionError::invalid_input(format!(
            "non-finite scan angle ({}, {})",
            scan.x, scan.y
        )));
    }
    let row = calibration.y.index(scan.y);
    let col = calibration.x.index(scan.x);
    Ok((row as i64, col as i64))
}

/// Pixel (row, col) of a scan angle, required to lie inside a
/// `height x width` grid.
pub fn to_pixel_checked(
    scan: ScanCoordinate,
    calibration: &GridCalibration,
    width: usize,
    height: usize,
) -> Result<(usize, usize)> {
    let (row, col) = to_pixel(scan, calibration)?;
    if row < 0 || col < 0 || row >= height as i64 || col >= width as i64 {
        return Err(ProjectionError::OutOfBounds {
            row,
            col,
            height,
            width,
        });
    }
    Ok((row as usize, col as usize))
}

/// A complete geostationary product grid: satellite model, axis calibration
/// and shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedGrid {
    pub model: EllipsoidModel,
    pub calibration: GridCalibration,
    pub width: usize,
    pub height: usize,
}

impl FixedGrid {
    pub fn new(
        model: EllipsoidModel,
        calibration: GridCalibration,
        width: usize,
        height: usize,
    ) -> Self {
        Self {
            model,
            calibration,
            width,
            height,
        }
    }

    /// Row/col of the cell seeing `coord`.
    pub fn locate(&self, coord: GeodeticCoordinate) -> Result<(usize, usize)> {
        let scan = self.model.to_scan(coord)?;
        to_pixel_checked(scan, &self.calibration, self.width, self.height)
    }

    /// Scan angle at the center of cell (row, col).
    pub fn scan_of_pixel(&self, row: usize, col: usize) -> ScanCoordinate {
        ScanCoordinate::new(
            self.calibration.x.cell_center(col),
            self.calibration.y.cell_center(row),
        )
    }

    /// Approximate geographic bounds of the on-Earth part of the grid.
    ///
    /// The projected outline is curved, so this samples a lattice of cell
    /// centers (edges included) rather than just the four corners. Fails
    /// with `OutOfView` if no sampled cell sees the Earth.
    pub fn footprint(&self) -> Result<BoundingBox> {
        const SAMPLES: usize = 64;

        if self.width == 0 || self.height == 0 {
            return Err(ProjectionError::invalid_input("grid has no cells"));
        }

        let steps = |n: usize| -> Vec<usize> {
            let last = n - 1;
            let mut idx: Vec<usize> = (0..=SAMPLES).map(|t| t * last / SAMPLES).collect();
            idx.dedup();
            idx
        };

        let mut bounds: Option<BoundingBox> = None;
        for &row in &steps(self.height) {
            for &col in &steps(self.width) {
                let Ok(coord) = self.model.to_geodetic(self.scan_of_pixel(row, col)) else {
                    continue;
                };
                let (lon, lat) = (coord.longitude(), coord.latitude());
                bounds = Some(match bounds {
                    None => BoundingBox::new(lon, lat, lon, lat),
                    Some(b) => BoundingBox::new(
                        b.min_lon.min(lon),
                        b.min_lat.min(lat),
                        b.max_lon.max(lon),
                        b.max_lat.max(lat),
                    ),
                });
            }
        }

        bounds.ok_or_else(|| ProjectionError::out_of_view("no cell of the grid sees the Earth"))
    }
}
