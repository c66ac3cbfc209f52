//! Nearest-neighbour reprojection onto a regular lat/lon grid.
//!
//! For every target cell center the source pixel is found by projecting the
//! center into the source's native coordinates and flooring against the
//! pixel edges. Nearest neighbour is deliberate: interpolating would bleed
//! valid values into masked neighbours.
//!
//! The target → source index table only depends on the source geometry and
//! the target grid, so it is built once as a [`ReprojectionPlan`] and
//! applied to every scene of the same product.

use geo_common::{BoundingBox, GeoGrid, GeoTransform, GeodeticCoordinate};
use projection::{to_pixel_checked, GridCalibration, NativeProjection, ScanCoordinate};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::types::{GeographicRaster, SourceRaster};

/// Marker for target cells with no source pixel.
const NO_SOURCE: u32 = u32::MAX;

/// Precomputed target → source pixel table.
#[derive(Debug, Clone)]
pub struct ReprojectionPlan {
    grid: GeoGrid,
    source_width: usize,
    source_height: usize,
    source_geotransform: GeoTransform,
    projection: NativeProjection,
    lookup: Vec<u32>,
    nodata: f32,
}

impl ReprojectionPlan {
    /// Build the table for sources shaped like `source` onto the grid of
    /// `extent` at `x_res` × `y_res` degrees.
    pub fn build<S: SourceRaster + ?Sized>(
        source: &S,
        extent: BoundingBox,
        x_res: f64,
        y_res: f64,
    ) -> Result<Self> {
        let grid = GeoGrid::new(extent, x_res, y_res)?;
        let projection = NativeProjection::parse(source.projection())?;
        let gt = source.geotransform();
        let calibration = match projection {
            NativeProjection::Geostationary(_) => {
                GridCalibration::from_geotransform(&gt, projection.units_per_radian())?
            }
            NativeProjection::LatLon => GridCalibration::from_geotransform(&gt, 1.0)?,
        };
        let (width, height) = (source.width(), source.height());

        if width * height >= NO_SOURCE as usize {
            return Err(PipelineError::invalid_input(format!(
                "source of {}x{} cells is too large to index",
                height, width
            )));
        }

        let mut lookup = vec![NO_SOURCE; grid.len()];
        lookup
            .par_chunks_mut(grid.width.max(1))
            .enumerate()
            .for_each(|(row, out)| {
                for (col, slot) in out.iter_mut().enumerate() {
                    let (lon, lat) = grid.cell_center(row, col);
                    if let Some((r, c)) =
                        native_pixel(&projection, &calibration, lon, lat, width, height)
                    {
                        *slot = (r * width + c) as u32;
                    }
                }
            });

        let covered = lookup.iter().filter(|&&i| i != NO_SOURCE).count();
        debug!(
            rows = grid.height,
            cols = grid.width,
            covered,
            geostationary = projection.is_geostationary(),
            "Built reprojection plan"
        );

        Ok(Self {
            grid,
            source_width: width,
            source_height: height,
            source_geotransform: gt,
            projection,
            lookup,
            nodata: f32::NAN,
        })
    }

    /// Use `nodata` instead of NaN for cells without data.
    pub fn with_nodata(mut self, nodata: f32) -> Self {
        self.nodata = nodata;
        self
    }

    /// Target grid of this plan.
    pub fn grid(&self) -> &GeoGrid {
        &self.grid
    }

    /// Number of target cells that map to a source pixel.
    pub fn covered_cells(&self) -> usize {
        self.lookup.iter().filter(|&&i| i != NO_SOURCE).count()
    }

    /// True if `source` has the geometry this plan was built for.
    pub fn matches<S: SourceRaster + ?Sized>(&self, source: &S) -> bool {
        source.width() == self.source_width
            && source.height() == self.source_height
            && source.geotransform().approx_eq(&self.source_geotransform)
            && NativeProjection::parse(source.projection())
                .map(|p| p == self.projection)
                .unwrap_or(false)
    }

    /// Resample `source` through the table.
    pub fn apply<S: SourceRaster + Sync + ?Sized>(&self, source: &S) -> Result<GeographicRaster> {
        if !self.matches(source) {
            return Err(PipelineError::shape_mismatch(format!(
                "plan built for {}x{} {:?}, got {}x{} {:?}",
                self.source_height,
                self.source_width,
                self.source_geotransform.0,
                source.height(),
                source.width(),
                source.geotransform().0
            )));
        }

        let nodata = self.nodata;
        let values: Vec<f32> = self
            .lookup
            .par_iter()
            .map(|&idx| {
                if idx == NO_SOURCE {
                    return nodata;
                }
                let v = source.value_at(idx as usize);
                if v.is_nan() {
                    nodata
                } else {
                    v
                }
            })
            .collect();

        GeographicRaster::new(self.grid, values, nodata)
    }
}

/// Reproject `source` onto `extent` at `x_res` × `y_res` degrees with NaN
/// as nodata.
pub fn reproject<S: SourceRaster + Sync + ?Sized>(
    source: &S,
    extent: BoundingBox,
    x_res: f64,
    y_res: f64,
) -> Result<GeographicRaster> {
    ReprojectionPlan::build(source, extent, x_res, y_res)?.apply(source)
}

/// Source (row, col) seen at a geographic point, `None` when the point is
/// out of view or off the source grid.
fn native_pixel(
    projection: &NativeProjection,
    calibration: &GridCalibration,
    lon: f64,
    lat: f64,
    width: usize,
    height: usize,
) -> Option<(usize, usize)> {
    match projection {
        NativeProjection::Geostationary(model) => {
            let coord = GeodeticCoordinate::new(lat, lon).ok()?;
            let scan = model.to_scan(coord).ok()?;
            to_pixel_checked(scan, calibration, width, height).ok()
        }
        // Calibrated in degrees, so the point indexes directly.
        NativeProjection::LatLon => {
            let degrees = ScanCoordinate::new(lon, lat);
            to_pixel_checked(degrees, calibration, width, height).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MaskedRaster, LATLON_DESCRIPTOR};

    fn latlon_source() -> MaskedRaster {
        // 4x4 one-degree cells covering (0..4, 0..4)
        let values = (0..16).map(|v| v as f32).collect();
        MaskedRaster::new(
            4,
            4,
            values,
            GeoTransform::north_up(0.0, 1.0, 4.0, -1.0),
            LATLON_DESCRIPTOR,
        )
        .unwrap()
    }

    #[test]
    fn test_latlon_identity() {
        let src = latlon_source();
        let out = reproject(&src, BoundingBox::new(0.0, 0.0, 4.0, 4.0), 1.0, 1.0).unwrap();
        assert_eq!(out.shape(), (4, 4));
        assert_eq!(out.values, src.values);
    }

    #[test]
    fn test_latlon_subset_and_outside() {
        let src = latlon_source();
        let out = reproject(&src, BoundingBox::new(3.0, 2.0, 5.0, 3.0), 1.0, 1.0).unwrap();
        // Row of lat 2..3 is source row 1; lon 3..4 is col 3, lon 4..5 is off-grid
        assert_eq!(out.values[0], 7.0);
        assert!(out.values[1].is_nan());
    }

    #[test]
    fn test_nan_source_becomes_nodata() {
        let mut src = latlon_source();
        src.values[0] = f32::NAN;
        let plan = ReprojectionPlan::build(&src, BoundingBox::new(0.0, 3.0, 1.0, 4.0), 1.0, 1.0)
            .unwrap()
            .with_nodata(-9999.0);
        let out = plan.apply(&src).unwrap();
        assert_eq!(out.values, vec![-9999.0]);
        assert_eq!(out.valid_count(), 0);
    }

    #[test]
    fn test_plan_rejects_other_geometry() {
        let src = latlon_source();
        let plan = ReprojectionPlan::build(&src, BoundingBox::new(0.0, 0.0, 4.0, 4.0), 1.0, 1.0)
            .unwrap();
        let other = MaskedRaster::new(
            2,
            2,
            vec![0.0; 4],
            GeoTransform::north_up(0.0, 2.0, 4.0, -2.0),
            LATLON_DESCRIPTOR,
        )
        .unwrap();
        assert!(matches!(
            plan.apply(&other),
            Err(PipelineError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_invalid_target() {
        let src = latlon_source();
        assert!(matches!(
            reproject(&src, BoundingBox::new(4.0, 0.0, 0.0, 4.0), 1.0, 1.0),
            Err(PipelineError::InvalidInput(_))
        ));
        assert!(matches!(
            reproject(&src, BoundingBox::new(0.0, 0.0, 4.0, 4.0), 0.0, 1.0),
            Err(PipelineError::InvalidInput(_))
        ));
    }
}
