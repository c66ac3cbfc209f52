//! Export of geographic rasters.
//!
//! The pipeline does not render anything; it hands finished rasters to a
//! [`RasterSink`]. [`JsonRasterExport`] is the built-in sink: a JSON
//! document that reads back to an identical raster (NaN is stored as
//! `null`, infinite values are refused).

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use geo_common::{BoundingBox, GeoGrid, GeoTransform};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::types::GeographicRaster;

/// Receiver of finished rasters.
pub trait RasterSink {
    fn write_raster(&mut self, name: &str, raster: &GeographicRaster) -> Result<()>;
}

/// Sink that keeps rasters in memory.
#[derive(Debug, Default)]
pub struct MemoryRasterSink {
    pub rasters: Vec<(String, GeographicRaster)>,
}

impl RasterSink for MemoryRasterSink {
    fn write_raster(&mut self, name: &str, raster: &GeographicRaster) -> Result<()> {
        self.rasters.push((name.to_string(), raster.clone()));
        Ok(())
    }
}

/// On-disk layout of an exported raster.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RasterDocument {
    name: String,
    extent: BoundingBox,
    x_res: f64,
    y_res: f64,
    width: usize,
    height: usize,
    nodata: Option<f32>,
    geotransform: GeoTransform,
    values: Vec<Option<f32>>,
}

fn to_json_number(v: f32) -> Result<Option<f32>> {
    if v.is_nan() {
        Ok(None)
    } else if v.is_infinite() {
        Err(PipelineError::invalid_input(format!(
            "{} has no JSON representation",
            v
        )))
    } else {
        Ok(Some(v))
    }
}

/// Writes one `<name>.json` file per raster into a directory.
#[derive(Debug, Clone)]
pub struct JsonRasterExport {
    dir: PathBuf,
}

impl JsonRasterExport {
    /// Export into `dir`, creating it if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Path a raster named `name` is written to.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Read an exported raster back.
    pub fn read(path: impl AsRef<Path>) -> Result<GeographicRaster> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let doc: RasterDocument = serde_json::from_reader(reader)?;

        let grid = GeoGrid::new(doc.extent, doc.x_res, doc.y_res)?;
        if (grid.height, grid.width) != (doc.height, doc.width) {
            return Err(PipelineError::shape_mismatch(format!(
                "{} declares {}x{} but its extent gives {}x{}",
                path.as_ref().display(),
                doc.height,
                doc.width,
                grid.height,
                grid.width
            )));
        }

        let values = doc
            .values
            .into_iter()
            .map(|v| v.unwrap_or(f32::NAN))
            .collect();
        GeographicRaster::new(grid, values, doc.nodata.unwrap_or(f32::NAN))
    }
}

impl RasterSink for JsonRasterExport {
    fn write_raster(&mut self, name: &str, raster: &GeographicRaster) -> Result<()> {
        let values = raster
            .values
            .iter()
            .map(|&v| to_json_number(v))
            .collect::<Result<Vec<_>>>()?;
        let doc = RasterDocument {
            name: name.to_string(),
            extent: raster.extent(),
            x_res: raster.x_res(),
            y_res: raster.y_res(),
            width: raster.width(),
            height: raster.height(),
            nodata: to_json_number(raster.nodata)?,
            geotransform: raster.geotransform(),
            values,
        };

        let path = self.path_for(name);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer(&mut writer, &doc)?;
        writer.flush()?;

        info!(
            path = %path.display(),
            rows = raster.height(),
            cols = raster.width(),
            valid = raster.valid_count(),
            "Exported raster"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonRasterExport::new(dir.path().join("out")).unwrap();

        let mut raster =
            GeographicRaster::filled(BoundingBox::new(-75.0, -34.0, -74.9, -33.94), 0.02, 0.02, 1.5)
                .unwrap();
        raster.values[1] = f32::NAN;
        raster.values[2] = 0.1;

        sink.write_raster("rrqpe_sum", &raster).unwrap();
        let back = JsonRasterExport::read(sink.path_for("rrqpe_sum")).unwrap();

        assert_eq!(back.grid, raster.grid);
        assert!(back.nodata.is_nan());
        assert!(back.values[1].is_nan());
        assert_eq!(back.values[0], 1.5);
        assert_eq!(back.values[2], 0.1);
    }

    #[test]
    fn test_numeric_nodata_survives() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonRasterExport::new(dir.path()).unwrap();
        let grid = GeoGrid::new(BoundingBox::new(0.0, 0.0, 2.0, 1.0), 1.0, 1.0).unwrap();
        let raster = GeographicRaster::new(grid, vec![-9999.0, 3.0], -9999.0).unwrap();

        sink.write_raster("r", &raster).unwrap();
        let back = JsonRasterExport::read(sink.path_for("r")).unwrap();
        assert_eq!(back, raster);
    }

    #[test]
    fn test_infinite_value_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonRasterExport::new(dir.path()).unwrap();
        let grid = GeoGrid::new(BoundingBox::new(0.0, 0.0, 2.0, 1.0), 1.0, 1.0).unwrap();

        let raster = GeographicRaster::new(grid, vec![f32::INFINITY, 3.0], f32::NAN).unwrap();
        let err = sink.write_raster("hot", &raster).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert!(!sink.path_for("hot").exists());

        let raster = GeographicRaster::new(grid, vec![1.0, 3.0], f32::NEG_INFINITY).unwrap();
        assert!(sink.write_raster("cold", &raster).is_err());
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemoryRasterSink::default();
        let raster =
            GeographicRaster::filled(BoundingBox::new(0.0, 0.0, 1.0, 1.0), 1.0, 1.0, 2.0).unwrap();
        sink.write_raster("a", &raster).unwrap();
        assert_eq!(sink.rasters.len(), 1);
        assert_eq!(sink.rasters[0].0, "a");
    }
}
