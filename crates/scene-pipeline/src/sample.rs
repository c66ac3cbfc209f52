//! Point sampling of geographic rasters.

use geo_common::GeodeticCoordinate;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::types::GeographicRaster;

/// Value found at a sampled point.
///
/// A point inside the raster always yields a `Sample`; only a point
/// outside it is an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Sample {
    Value(f32),
    /// The cell exists but holds no data.
    Nodata,
}

impl Sample {
    /// Scalar form, with `nodata` standing in for [`Sample::Nodata`].
    pub fn value_or(self, nodata: f32) -> f32 {
        match self {
            Sample::Value(v) => v,
            Sample::Nodata => nodata,
        }
    }

    pub fn value(self) -> Option<f32> {
        match self {
            Sample::Value(v) => Some(v),
            Sample::Nodata => None,
        }
    }

    pub fn is_nodata(&self) -> bool {
        matches!(self, Sample::Nodata)
    }
}

/// A labelled location to sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl NamedPoint {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    pub fn coordinate(&self) -> Result<GeodeticCoordinate> {
        Ok(GeodeticCoordinate::new(self.latitude, self.longitude)?)
    }
}

/// Sample `raster` at `coord`.
///
/// `col = floor((lon - min_lon) / x_res)`, `row = floor((max_lat - lat) / y_res)`.
/// Fails with `OutOfBounds` when the point is outside the raster.
pub fn sample(raster: &GeographicRaster, coord: GeodeticCoordinate) -> Result<Sample> {
    let (row, col) = raster.grid.cell_of(coord.longitude(), coord.latitude())?;
    let value = raster
        .get(row, col)
        .ok_or(PipelineError::OutOfBounds {
            row: row as i64,
            col: col as i64,
            height: raster.height(),
            width: raster.width(),
        })?;

    if raster.is_nodata(value) {
        Ok(Sample::Nodata)
    } else {
        Ok(Sample::Value(value))
    }
}

/// Sample every point, keeping per-point failures.
pub fn sample_many<'a>(
    raster: &GeographicRaster,
    points: &'a [NamedPoint],
) -> Vec<(&'a NamedPoint, Result<Sample>)> {
    points
        .iter()
        .map(|p| (p, p.coordinate().and_then(|c| sample(raster, c))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_common::BoundingBox;

    fn coord(lat: f64, lon: f64) -> GeodeticCoordinate {
        GeodeticCoordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_top_row_sentinel() {
        let mut raster =
            GeographicRaster::filled(BoundingBox::new(0.0, 0.0, 3.0, 3.0), 1.0, 1.0, 0.0).unwrap();
        raster.values[..3].fill(42.0);
        raster.values[6..].fill(-1.0);

        assert_eq!(sample(&raster, coord(3.0, 1.5)).unwrap(), Sample::Value(42.0));
        assert_eq!(sample(&raster, coord(0.5, 1.5)).unwrap(), Sample::Value(-1.0));
    }

    #[test]
    fn test_outside_is_error_nodata_is_not() {
        let mut raster =
            GeographicRaster::filled(BoundingBox::new(0.0, 0.0, 2.0, 2.0), 1.0, 1.0, 1.0).unwrap();
        raster.values[0] = f32::NAN;

        assert!(sample(&raster, coord(1.5, 0.5)).unwrap().is_nodata());
        assert!(matches!(
            sample(&raster, coord(1.0, 5.0)),
            Err(PipelineError::OutOfBounds { .. })
        ));
        assert!(matches!(
            sample(&raster, coord(0.0, 1.0)),
            Err(PipelineError::OutOfBounds { row: 2, .. })
        ));
    }

    #[test]
    fn test_value_or() {
        assert_eq!(Sample::Nodata.value_or(-9999.0), -9999.0);
        assert_eq!(Sample::Value(2.5).value_or(-9999.0), 2.5);
        assert_eq!(Sample::Nodata.value(), None);
    }

    #[test]
    fn test_sample_many_keeps_errors() {
        let raster =
            GeographicRaster::filled(BoundingBox::new(0.0, 0.0, 2.0, 2.0), 1.0, 1.0, 7.0).unwrap();
        let points = vec![
            NamedPoint::new("inside", 1.5, 0.5),
            NamedPoint::new("outside", 10.0, 10.0),
            NamedPoint::new("invalid", 95.0, 0.0),
        ];
        let out = sample_many(&raster, &points);
        assert_eq!(out[0].1.as_ref().unwrap(), &Sample::Value(7.0));
        assert!(matches!(out[1].1, Err(PipelineError::OutOfBounds { .. })));
        assert!(matches!(out[2].1, Err(PipelineError::InvalidInput(_))));
    }
}
