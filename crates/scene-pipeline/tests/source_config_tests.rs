//! Scene directories, configuration files and export, on a real filesystem.

use std::fs::File;

use geo_common::{BoundingBox, GeoTransform};
use scene_pipeline::{
    decode, reproject, JsonDirSceneSource, JsonRasterExport, PipelineConfig, RasterSink, ReduceOp,
    Scene, SceneMetadata, SceneSource, UnitConversion, LATLON_DESCRIPTOR,
};
use test_utils::fixtures::goes;
use test_utils::{create_temperature_grid, scratch_dir};

const RRQPE_LATE: &str = "OR_ABI-L2-RRQPEF-M6_G16_s20240151210207_e20240151219515_c20240151220011";

fn rrqpe_early() -> &'static str {
    goes::RRQPE_FILE.trim_end_matches(".nc")
}

fn scene(value: f32) -> Scene {
    let gt = GeoTransform::north_up(-64.0, 1.0, -7.0, -1.0);
    Scene::new(2, 2, vec![value; 4], gt, LATLON_DESCRIPTOR).unwrap()
}

fn write_scene(dir: &std::path::Path, name: &str, scene: &Scene) {
    let file = File::create(dir.join(format!("{}.json", name))).unwrap();
    serde_json::to_writer(file, scene).unwrap();
}

#[test]
fn test_directory_source_reads_in_name_order() {
    let dir = scratch_dir();
    write_scene(dir.path(), RRQPE_LATE, &scene(2.0));
    write_scene(dir.path(), rrqpe_early(), &scene(1.0));
    std::fs::write(dir.path().join("notes.txt"), "not a scene").unwrap();

    let mut source = JsonDirSceneSource::open(dir.path()).unwrap();
    assert_eq!(source.remaining(), 2);

    let first = source.fetch_next_scene().unwrap().unwrap();
    let second = source.fetch_next_scene().unwrap().unwrap();
    assert!(source.fetch_next_scene().unwrap().is_none());

    assert_eq!(first.values[0], 1.0);
    assert_eq!(second.values[0], 2.0);
    assert_eq!(first.metadata.product, "RRQPEF");
    assert_eq!(first.metadata.satellite.as_deref(), Some("G16"));
    assert!(first.metadata.start_time < second.metadata.start_time);
}

#[test]
fn test_directory_source_keeps_declared_metadata() {
    let dir = scratch_dir();
    let declared = scene(1.0).with_metadata(SceneMetadata {
        product: "LSTF".to_string(),
        variable: "LST".to_string(),
        ..Default::default()
    });
    write_scene(dir.path(), rrqpe_early(), &declared);

    let mut source = JsonDirSceneSource::open(dir.path()).unwrap();
    let read = source.fetch_next_scene().unwrap().unwrap();
    assert_eq!(read.metadata.product, "LSTF");
    assert_eq!(read.metadata.variable, "LST");
    assert!(read.metadata.start_time.is_none());
}

#[test]
fn test_directory_source_reports_broken_scene() {
    let dir = scratch_dir();
    std::fs::write(dir.path().join("broken.json"), r#"{"width": 2}"#).unwrap();

    let mut source = JsonDirSceneSource::open(dir.path()).unwrap();
    assert!(source.fetch_next_scene().is_err());
}

#[test]
fn test_missing_directory_is_an_error() {
    let dir = scratch_dir();
    assert!(JsonDirSceneSource::open(dir.path().join("absent")).is_err());
}

#[test]
fn test_config_file_loads() {
    let dir = scratch_dir();
    let path = dir.path().join("pipeline.yaml");
    std::fs::write(
        &path,
        r#"
target:
  extent: { min_lon: -64.0, min_lat: -9.0, max_lon: -62.0, max_lat: -7.0 }
  x_res: 0.5
  y_res: 0.5
  nodata: -9999.0
products:
  - id: lst_peak
    variable: LST
    reducer: max
    unit_conversion: kelvin_to_celsius
    description: Peak land surface temperature
"#,
    )
    .unwrap();

    let config = PipelineConfig::load(&path).unwrap();
    let product = config.product("lst_peak").unwrap();
    assert_eq!(product.reducer, ReduceOp::Max);
    assert_eq!(product.unit_conversion, UnitConversion::KelvinToCelsius);
    assert_eq!(config.target.nodata_value(), -9999.0);
    assert_eq!(config.target.extent, BoundingBox::new(-64.0, -9.0, -62.0, -7.0));
}

#[test]
fn test_config_rejects_empty_products() {
    let dir = scratch_dir();
    let path = dir.path().join("pipeline.yaml");
    std::fs::write(&path, "products: []\n").unwrap();
    assert!(PipelineConfig::load(&path).is_err());
    assert!(PipelineConfig::load(dir.path().join("missing.yaml")).is_err());
}

#[test]
fn test_export_round_trip_after_reprojection() {
    let dir = scratch_dir();
    let gt = GeoTransform::north_up(-64.0, 0.5, -7.0, -0.5);
    let scene = Scene::new(4, 4, create_temperature_grid(4, 4), gt, LATLON_DESCRIPTOR).unwrap();
    let raster = decode(&scene).unwrap();
    let geo = reproject(&raster, BoundingBox::new(-64.0, -9.0, -62.0, -7.0), 0.5, 0.5).unwrap();

    let mut sink = JsonRasterExport::new(dir.path()).unwrap();
    sink.write_raster("lst", &geo).unwrap();
    let back = JsonRasterExport::read(sink.path_for("lst")).unwrap();

    assert_eq!(back.grid, geo.grid);
    assert_eq!(back.values, geo.values);
}
