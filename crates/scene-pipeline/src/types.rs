//! Core raster types handed between pipeline stages.
//!
//! Every raster is a row-major `Vec<f32>` (row 0 first, north-up) plus the
//! geometry needed to interpret it. Masked or missing cells are NaN.

use chrono::{DateTime, Utc};
use geo_common::{BoundingBox, GeoGrid, GeoTransform};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// PROJ.4 descriptor of every geographic raster produced by the pipeline.
pub const LATLON_DESCRIPTOR: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Descriptive metadata carried alongside a scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneMetadata {
    /// Product short name, e.g. "RRQPEF".
    #[serde(default)]
    pub product: String,
    /// Data variable, e.g. "RRQPE".
    #[serde(default)]
    pub variable: String,
    /// Physical units after scale/offset, e.g. "mm h-1".
    #[serde(default)]
    pub units: Option<String>,
    /// Satellite id, e.g. "G16".
    #[serde(default)]
    pub satellite: Option<String>,
    /// Observation start time.
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
}

/// One decoded satellite file: packed values plus everything needed to
/// unpack and locate them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub width: usize,
    pub height: usize,
    /// Raw (packed) values, row-major.
    #[serde(with = "nan_as_null::seq")]
    pub values: Vec<f32>,
    /// Raw value marking a missing cell. NaN matches NaN cells.
    #[serde(default = "nan", with = "nan_as_null")]
    pub fill_value: f32,
    #[serde(default = "default_scale")]
    pub scale_factor: f32,
    #[serde(default)]
    pub add_offset: f32,
    /// Data-quality flags, same shape as `values`.
    #[serde(default)]
    pub quality: Option<Vec<u8>>,
    /// Pixel → native coordinate transform.
    pub geotransform: GeoTransform,
    /// PROJ.4 style projection descriptor.
    pub projection: String,
    #[serde(default)]
    pub metadata: SceneMetadata,
}

fn default_scale() -> f32 {
    1.0
}

fn nan() -> f32 {
    f32::NAN
}

/// JSON has no NaN: write it as `null` and read `null` back as NaN.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    fn to_option(v: f32) -> Option<f32> {
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        to_option(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        Ok(Option::<f32>::deserialize(deserializer)?.unwrap_or(f32::NAN))
    }

    pub mod seq {
        use super::to_option;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(values: &[f32], serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(values.iter().map(|&v| to_option(v)))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f32>, D::Error> {
            let values = Vec::<Option<f32>>::deserialize(deserializer)?;
            Ok(values.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect())
        }
    }
}

impl Scene {
    /// Create an unpacked scene (scale 1, offset 0, NaN fill, no quality
    /// flags).
    pub fn new(
        width: usize,
        height: usize,
        values: Vec<f32>,
        geotransform: GeoTransform,
        projection: impl Into<String>,
    ) -> Result<Self> {
        let scene = Self {
            width,
            height,
            values,
            fill_value: f32::NAN,
            scale_factor: 1.0,
            add_offset: 0.0,
            quality: None,
            geotransform,
            projection: projection.into(),
            metadata: SceneMetadata::default(),
        };
        scene.validate()?;
        Ok(scene)
    }

    /// Set the NetCDF packing attributes.
    pub fn with_packing(mut self, scale_factor: f32, add_offset: f32, fill_value: f32) -> Self {
        self.scale_factor = scale_factor;
        self.add_offset = add_offset;
        self.fill_value = fill_value;
        self
    }

    /// Attach quality flags. The shape is checked at decode time.
    pub fn with_quality(mut self, quality: Vec<u8>) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_metadata(mut self, metadata: SceneMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Check the value array matches the declared shape.
    pub fn validate(&self) -> Result<()> {
        if self.values.len() != self.width * self.height {
            return Err(PipelineError::invalid_scene(format!(
                "{} values for a {}x{} scene",
                self.values.len(),
                self.height,
                self.width
            )));
        }
        Ok(())
    }
}

/// Physical values with NaN at every masked cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskedRaster {
    pub width: usize,
    pub height: usize,
    #[serde(with = "nan_as_null::seq")]
    pub values: Vec<f32>,
    pub geotransform: GeoTransform,
    pub projection: String,
}

impl MaskedRaster {
    pub fn new(
        width: usize,
        height: usize,
        values: Vec<f32>,
        geotransform: GeoTransform,
        projection: impl Into<String>,
    ) -> Result<Self> {
        if values.len() != width * height {
            return Err(PipelineError::shape_mismatch(format!(
                "{} values for a {}x{} raster",
                values.len(),
                height,
                width
            )));
        }
        Ok(Self {
            width,
            height,
            values,
            geotransform,
            projection: projection.into(),
        })
    }

    /// Value at (row, col), `None` outside the raster.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.height && col < self.width {
            Some(self.values[row * self.width + col])
        } else {
            None
        }
    }

    /// Number of unmasked cells.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    /// Same shape, geotransform and projection as `other`.
    pub fn same_grid(&self, other: &MaskedRaster) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.geotransform.approx_eq(&other.geotransform)
            && self.projection == other.projection
    }

    /// Fail with `ShapeMismatch` unless `other` shares this raster's grid.
    pub fn ensure_same_grid(&self, other: &MaskedRaster) -> Result<()> {
        if self.same_grid(other) {
            return Ok(());
        }
        Err(PipelineError::shape_mismatch(format!(
            "{}x{} {:?} '{}' vs {}x{} {:?} '{}'",
            self.height,
            self.width,
            self.geotransform.0,
            self.projection,
            other.height,
            other.width,
            other.geotransform.0,
            other.projection
        )))
    }

    /// Apply `f` to every unmasked cell.
    pub fn map_valid(mut self, f: impl Fn(f32) -> f32) -> Self {
        self.values
            .iter_mut()
            .filter(|v| !v.is_nan())
            .for_each(|v| *v = f(*v));
        self
    }
}

/// A raster on a regular lat/lon grid, row 0 at `max_lat`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeographicRaster {
    pub grid: GeoGrid,
    pub values: Vec<f32>,
    /// Value written to cells without data.
    pub nodata: f32,
}

impl GeographicRaster {
    /// Build a raster over `grid`; `values` must have `grid.len()` cells.
    pub fn new(grid: GeoGrid, values: Vec<f32>, nodata: f32) -> Result<Self> {
        if values.len() != grid.len() {
            return Err(PipelineError::shape_mismatch(format!(
                "{} values for a {}x{} grid",
                values.len(),
                grid.height,
                grid.width
            )));
        }
        Ok(Self {
            grid,
            values,
            nodata,
        })
    }

    /// Raster of `extent` at the given resolution filled with `value`.
    pub fn filled(extent: BoundingBox, x_res: f64, y_res: f64, value: f32) -> Result<Self> {
        let grid = GeoGrid::new(extent, x_res, y_res)?;
        Ok(Self {
            values: vec![value; grid.len()],
            grid,
            nodata: f32::NAN,
        })
    }

    pub fn extent(&self) -> BoundingBox {
        self.grid.extent
    }

    pub fn x_res(&self) -> f64 {
        self.grid.x_res
    }

    pub fn y_res(&self) -> f64 {
        self.grid.y_res
    }

    pub fn width(&self) -> usize {
        self.grid.width
    }

    pub fn height(&self) -> usize {
        self.grid.height
    }

    /// Shape as (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        self.grid.shape()
    }

    /// True for NaN and for the nodata marker.
    pub fn is_nodata(&self, value: f32) -> bool {
        value.is_nan() || value == self.nodata
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.grid.height && col < self.grid.width {
            Some(self.values[self.grid.flat_index(row, col)])
        } else {
            None
        }
    }

    /// GDAL-style affine for export sinks.
    pub fn geotransform(&self) -> GeoTransform {
        self.grid.geotransform()
    }

    /// Cells holding data.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|&&v| !self.is_nodata(v)).count()
    }
}

/// A raster the reprojector can read: values on a grid described by a
/// geotransform and a projection descriptor.
pub trait SourceRaster {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn values(&self) -> &[f32];
    fn geotransform(&self) -> GeoTransform;
    fn projection(&self) -> &str;

    /// Value at a flat index, with any nodata marker turned into NaN.
    fn value_at(&self, index: usize) -> f32 {
        self.values()[index]
    }
}

impl SourceRaster for MaskedRaster {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn values(&self) -> &[f32] {
        &self.values
    }

    fn geotransform(&self) -> GeoTransform {
        self.geotransform
    }

    fn projection(&self) -> &str {
        &self.projection
    }
}

impl SourceRaster for GeographicRaster {
    fn width(&self) -> usize {
        self.grid.width
    }

    fn height(&self) -> usize {
        self.grid.height
    }

    fn values(&self) -> &[f32] {
        &self.values
    }

    fn geotransform(&self) -> GeoTransform {
        self.grid.geotransform()
    }

    fn projection(&self) -> &str {
        LATLON_DESCRIPTOR
    }

    fn value_at(&self, index: usize) -> f32 {
        let v = self.values[index];
        if self.is_nodata(v) {
            f32::NAN
        } else {
            v
        }
    }
}
