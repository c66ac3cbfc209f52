//! Integration tests for the projector and the full-disk fixed grid.

use geo_common::GeodeticCoordinate;
use projection::{
    AxisCalibration, EllipsoidModel, FixedGrid, GridCalibration, NativeProjection,
    ProjectionError,
};
use test_utils::assert_approx_eq;
use test_utils::fixtures::{descriptor, goes};

fn coord(lat: f64, lon: f64) -> GeodeticCoordinate {
    GeodeticCoordinate::new(lat, lon).unwrap()
}

fn full_disk() -> FixedGrid {
    let calibration = GridCalibration::new(
        AxisCalibration::from_cell_center(goes::FULL_DISK_SCALE, goes::FULL_DISK_X_OFFSET).unwrap(),
        AxisCalibration::from_cell_center(-goes::FULL_DISK_SCALE, goes::FULL_DISK_Y_OFFSET)
            .unwrap(),
    );
    FixedGrid::new(
        EllipsoidModel::goes_east(),
        calibration,
        goes::FULL_DISK_SIZE,
        goes::FULL_DISK_SIZE,
    )
}

#[test]
fn test_descriptors_match_presets() {
    assert_eq!(
        NativeProjection::parse(descriptor::GOES_EAST).unwrap(),
        NativeProjection::Geostationary(EllipsoidModel::goes_east())
    );
    assert_eq!(
        NativeProjection::parse(descriptor::GOES_WEST).unwrap(),
        NativeProjection::Geostationary(EllipsoidModel::goes_west())
    );
    assert_eq!(
        NativeProjection::parse(descriptor::LATLON).unwrap(),
        NativeProjection::LatLon
    );
}

#[test]
fn test_round_trip_lattice() {
    let model = EllipsoidModel::goes_east();
    for lat in (-40..=40).step_by(10) {
        for lon in (-115..=-35).step_by(10) {
            let point = coord(lat as f64, lon as f64);
            let scan = model.to_scan(point).unwrap();
            let back = model.to_geodetic(scan).unwrap();
            assert_approx_eq!(back.latitude(), point.latitude(), 1e-7);
            assert_approx_eq!(back.longitude(), point.longitude(), 1e-7);
        }
    }
}

#[test]
fn test_located_cell_contains_point() {
    let grid = full_disk();
    for lat in [-20.0, -7.603, 0.3, 12.5, 20.0] {
        for lon in [-95.0, -80.1, -63.15, -55.0] {
            let point = coord(lat, lon);
            let (row, col) = grid.locate(point).unwrap();
            let center = grid.model.to_geodetic(grid.scan_of_pixel(row, col)).unwrap();
            assert_approx_eq!(center.latitude(), lat, 0.1);
            assert_approx_eq!(center.longitude(), lon, 0.1);
        }
    }
}

#[test]
fn test_equator_visibility_boundary() {
    let model = EllipsoidModel::goes_east();
    for offset in [0.0, 30.0, 60.0, 70.0] {
        assert!(model.to_scan(coord(0.0, -75.0 + offset)).is_ok(), "offset {}", offset);
        assert!(model.to_scan(coord(0.0, -75.0 - offset)).is_ok(), "offset -{}", offset);
    }
    for offset in [73.0, 80.0, 100.0] {
        let err = model.to_scan(coord(0.0, -75.0 + offset)).unwrap_err();
        assert!(matches!(err, ProjectionError::OutOfView(_)), "offset {}", offset);
    }
}

#[test]
fn test_east_and_west_views_differ() {
    let east = EllipsoidModel::goes_east();
    let west = EllipsoidModel::goes_west();
    let pacific = coord(0.0, -160.0);

    assert!(east.to_scan(pacific).unwrap_err().is_out_of_view());
    assert!(west.to_scan(pacific).is_ok());

    let nadir = west.to_scan(coord(0.0, -137.2)).unwrap();
    assert_approx_eq!(nadir.x, 0.0, 1e-12);
    assert_approx_eq!(nadir.y, 0.0, 1e-12);
}

#[test]
fn test_scan_outside_disk_has_no_geodetic() {
    let grid = full_disk();
    let corner = grid.scan_of_pixel(0, 0);
    assert!(grid.model.to_geodetic(corner).is_err());
}
