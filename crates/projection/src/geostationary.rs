//! Geostationary satellite projection.
//!
//! The satellite views Earth from a fixed position above the equator and
//! coordinates are expressed as scan angles in radians from nadir. Only the
//! x-sweep geometry used by the GOES-R ABI is modelled.
//!
//! Reference: GOES-R Product Definition and Users' Guide (PUG) Volume 4, Section 4.2.8

use geo_common::GeodeticCoordinate;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};

/// GRS80 semi-major axis (meters), as carried by GOES-R imagery.
pub const GRS80_SEMI_MAJOR_AXIS: f64 = 6378137.0;

/// GRS80 semi-minor axis (meters), as carried by GOES-R imagery.
pub const GRS80_SEMI_MINOR_AXIS: f64 = 6356752.31414;

/// GRS80 inverse flattening.
pub const GRS80_INVERSE_FLATTENING: f64 = 298.257222096;

/// GOES-R perspective point height above the surface (meters).
pub const GOES_PERSPECTIVE_POINT_HEIGHT: f64 = 35786023.0;

/// Sub-satellite longitude of GOES-East (GOES-16/19), degrees.
pub const GOES_EAST_LONGITUDE: f64 = -75.0;

/// Sub-satellite longitude of GOES-West (GOES-17/18), degrees.
pub const GOES_WEST_LONGITUDE: f64 = -137.2;

/// Largest local viewing zenith angle accepted as "in view" by default.
///
/// Beyond this the footprint is too oblique for L2 retrievals; at the
/// equator it corresponds to roughly ±71.4° of longitude from nadir.
pub const DEFAULT_MAX_ZENITH_DEG: f64 = 80.0;

fn default_max_zenith() -> f64 {
    DEFAULT_MAX_ZENITH_DEG
}

/// Satellite-frame scan angles (radians).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanCoordinate {
    /// East-west scan angle.
    pub x: f64,
    /// North-south elevation angle.
    pub y: f64,
}

impl ScanCoordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Earth ellipsoid and satellite position.
///
/// Constant per satellite. Build it once (from a preset or from the scene's
/// projection descriptor) and pass it by reference to every transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipsoidModel {
    /// Equatorial radius (meters).
    pub semi_major_axis: f64,
    /// Polar radius (meters).
    pub semi_minor_axis: f64,
    /// Satellite height above the surface (meters).
    pub perspective_point_height: f64,
    /// Longitude of the sub-satellite point (degrees).
    pub sub_satellite_longitude: f64,
    /// Largest local viewing zenith angle treated as visible (degrees).
    #[serde(default = "default_max_zenith")]
    pub max_zenith_deg: f64,
}

impl EllipsoidModel {
    /// Create a validated model.
    ///
    /// Requires `semi_major_axis > semi_minor_axis > 0` and a positive
    /// satellite height.
    pub fn new(
        semi_major_axis: f64,
        semi_minor_axis: f64,
        perspective_point_height: f64,
        sub_satellite_longitude: f64,
    ) -> Result<Self> {
        let model = Self {
            semi_major_axis,
            semi_minor_axis,
            perspective_point_height,
            sub_satellite_longitude,
            max_zenith_deg: DEFAULT_MAX_ZENITH_DEG,
        };
        model.validate()?;
        Ok(model)
    }

    /// Create a model from the semi-major axis and inverse flattening.
    pub fn from_inverse_flattening(
        semi_major_axis: f64,
        inverse_flattening: f64,
        perspective_point_height: f64,
        sub_satellite_longitude: f64,
    ) -> Result<Self> {
        if !inverse_flattening.is_finite() || inverse_flattening <= 1.0 {
            return Err(ProjectionError::invalid_input(format!(
                "inverse flattening must be > 1, got {}",
                inverse_flattening
            )));
        }
        let semi_minor_axis = semi_major_axis * (1.0 - 1.0 / inverse_flattening);
        Self::new(
            semi_major_axis,
            semi_minor_axis,
            perspective_point_height,
            sub_satellite_longitude,
        )
    }

    /// GOES-East (75°W) over the GRS80 ellipsoid.
    pub fn goes_east() -> Self {
        Self {
            semi_major_axis: GRS80_SEMI_MAJOR_AXIS,
            semi_minor_axis: GRS80_SEMI_MINOR_AXIS,
            perspective_point_height: GOES_PERSPECTIVE_POINT_HEIGHT,
            sub_satellite_longitude: GOES_EAST_LONGITUDE,
            max_zenith_deg: DEFAULT_MAX_ZENITH_DEG,
        }
    }

    /// GOES-West (137.2°W) over the GRS80 ellipsoid.
    pub fn goes_west() -> Self {
        Self {
            sub_satellite_longitude: GOES_WEST_LONGITUDE,
            ..Self::goes_east()
        }
    }

    /// Replace the viewing zenith limit. 90° keeps everything up to the
    /// geometric limb.
    pub fn with_max_zenith(mut self, max_zenith_deg: f64) -> Result<Self> {
        if !(max_zenith_deg > 0.0 && max_zenith_deg <= 90.0) {
            return Err(ProjectionError::invalid_input(format!(
                "max zenith must be in (0, 90] degrees, got {}",
                max_zenith_deg
            )));
        }
        self.max_zenith_deg = max_zenith_deg;
        Ok(self)
    }

    /// Same satellite and ellipsoid, within a millimetre. The zenith limit
    /// is a viewing policy and is not compared.
    pub fn same_geometry(&self, other: &Self) -> bool {
        (self.semi_major_axis - other.semi_major_axis).abs() < 1e-3
            && (self.semi_minor_axis - other.semi_minor_axis).abs() < 1e-3
            && (self.perspective_point_height - other.perspective_point_height).abs() < 1e-3
            && (self.sub_satellite_longitude - other.sub_satellite_longitude).abs() < 1e-9
    }

    /// Check the ellipsoid invariants.
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.semi_major_axis,
            self.semi_minor_axis,
            self.perspective_point_height,
            self.sub_satellite_longitude,
            self.max_zenith_deg,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ProjectionError::invalid_input(format!(
                "non-finite ellipsoid parameter in {:?}",
                self
            )));
        }
        if !(self.semi_major_axis > self.semi_minor_axis && self.semi_minor_axis > 0.0) {
            return Err(ProjectionError::invalid_input(format!(
                "expected semi_major_axis > semi_minor_axis > 0, got {} and {}",
                self.semi_major_axis, self.semi_minor_axis
            )));
        }
        if self.perspective_point_height <= 0.0 {
            return Err(ProjectionError::invalid_input(
                "perspective_point_height must be positive",
            ));
        }
        Ok(())
    }

    /// Distance from the Earth's center to the satellite (H).
    pub fn satellite_distance(&self) -> f64 {
        self.perspective_point_height + self.semi_major_axis
    }

    /// First eccentricity squared: 1 - Rpol²/Req².
    pub fn eccentricity_squared(&self) -> f64 {
        1.0 - (self.semi_minor_axis / self.semi_major_axis).powi(2)
    }

    /// Convert a geodetic coordinate to scan angles.
    ///
    /// Fails with `OutOfView` when the point is behind the limb, faces away
    /// from the satellite, or is seen at a zenith angle above
    /// [`max_zenith_deg`](Self::max_zenith_deg).
    pub fn to_scan(&self, coord: GeodeticCoordinate) -> Result<ScanCoordinate> {
        let req = self.semi_major_axis;
        let rpol = self.semi_minor_axis;
        let h = self.satellite_distance();
        let (lat_rad, lon_rad) = coord.to_radians();
        let dlon = lon_rad - self.sub_satellite_longitude.to_radians();

        // Geocentric latitude and radius to the ellipsoid surface
        let phi_c = ((rpol / req).powi(2) * lat_rad.tan()).atan();
        let rc = rpol / (1.0 - self.eccentricity_squared() * phi_c.cos().powi(2)).sqrt();

        // Satellite-to-point vector
        let s = Vector3::new(
            h - rc * phi_c.cos() * dlon.cos(),
            -rc * phi_c.cos() * dlon.sin(),
            rc * phi_c.sin(),
        );
        let norm = s.norm();

        if s.x <= 0.0 {
            return Err(ProjectionError::out_of_view(format!(
                "{} lies behind the Earth",
                coord
            )));
        }

        let sin_x = -s.y / norm;
        if !(-1.0..=1.0).contains(&sin_x) {
            return Err(ProjectionError::out_of_view(format!(
                "{} has no real scan angle",
                coord
            )));
        }

        // Local zenith angle: outward ellipsoid normal against the line of
        // sight back to the satellite. Earth's center sits at (H, 0, 0).
        let normal = Vector3::new(
            (s.x - h) / (req * req),
            s.y / (req * req),
            s.z / (rpol * rpol),
        )
        .normalize();
        let cos_zenith = (-s).dot(&normal) / norm;
        if cos_zenith <= 0.0 {
            return Err(ProjectionError::out_of_view(format!(
                "{} is beyond the limb",
                coord
            )));
        }
        if cos_zenith < self.max_zenith_deg.to_radians().cos() {
            return Err(ProjectionError::out_of_view(format!(
                "{} is seen at zenith {:.1}° (limit {:.1}°)",
                coord,
                cos_zenith.acos().to_degrees(),
                self.max_zenith_deg
            )));
        }

        Ok(ScanCoordinate {
            x: sin_x.asin(),
            y: (s.z / s.x).atan(),
        })
    }

    /// Convert scan angles back to a geodetic coordinate.
    ///
    /// Fails with `OutOfView` when the line of sight misses the Earth.
    pub fn to_geodetic(&self, scan: ScanCoordinate) -> Result<GeodeticCoordinate> {
        if !scan.x.is_finite() || !scan.y.is_finite() {
            return Err(ProjectionError::invalid_input(format!(
                "non-finite scan angle ({}, {})",
                scan.x, scan.y
            )));
        }

        let req = self.semi_major_axis;
        let rpol = self.semi_minor_axis;
        let h = self.satellite_distance();

        let (sin_x, cos_x) = scan.x.sin_cos();
        let (sin_y, cos_y) = scan.y.sin_cos();

        // Quadratic for the distance from the satellite to the surface
        let a = sin_x.powi(2) + cos_x.powi(2) * (cos_y.powi(2) + (req / rpol).powi(2) * sin_y.powi(2));
        let b = -2.0 * h * cos_x * cos_y;
        let c = h.powi(2) - req.powi(2);

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return Err(ProjectionError::out_of_view(format!(
                "scan angle ({:.6}, {:.6}) points to space",
                scan.x, scan.y
            )));
        }

        let rs = (-b - discriminant.sqrt()) / (2.0 * a);
        let s = Vector3::new(rs * cos_x * cos_y, -rs * sin_x, rs * cos_x * sin_y);

        let lat = ((req / rpol).powi(2) * s.z / (h - s.x).hypot(s.y)).atan();
        let lon = self.sub_satellite_longitude.to_radians() - (s.y / (h - s.x)).atan();

        Ok(GeodeticCoordinate::new(
            lat.to_degrees(),
            wrap_longitude(lon.to_degrees()),
        )?)
    }
}

impl Default for EllipsoidModel {
    fn default() -> Self {
        Self::goes_east()
    }
}

/// Convert a geodetic coordinate to scan angles with the given model.
pub fn to_scan(coord: GeodeticCoordinate, model: &EllipsoidModel) -> Result<ScanCoordinate> {
    model.to_scan(coord)
}

/// Convert scan angles to a geodetic coordinate with the given model.
pub fn to_geodetic(scan: ScanCoordinate, model: &EllipsoidModel) -> Result<GeodeticCoordinate> {
    model.to_geodetic(scan)
}

fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> GeodeticCoordinate {
        GeodeticCoordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_nadir_is_origin() {
        let model = EllipsoidModel::goes_east();
        let scan = model.to_scan(coord(0.0, -75.0)).unwrap();
        assert!(scan.x.abs() < 1e-12);
        assert!(scan.y.abs() < 1e-12);
    }

    #[test]
    fn test_round_trip_near_sub_satellite_point() {
        let model = EllipsoidModel::goes_east();
        let original = coord(0.25, -74.8);

        let scan = model.to_scan(original).unwrap();
        let back = model.to_geodetic(scan).unwrap();

        assert!((back.latitude() - original.latitude()).to_radians().abs() < 1e-6);
        assert!((back.longitude() - original.longitude()).to_radians().abs() < 1e-6);
    }

    #[test]
    fn test_known_scan_angles_for_brazil() {
        // North of the point is +y, west of nadir is -x
        let model = EllipsoidModel::goes_east();
        let scan = model.to_scan(coord(-7.603, -63.15)).unwrap();
        assert!(scan.x > 0.0, "east of 75W should be positive x, got {}", scan.x);
        assert!(scan.y < 0.0, "south of equator should be negative y, got {}", scan.y);
    }

    #[test]
    fn test_limb_is_out_of_view() {
        let model = EllipsoidModel::goes_east();
        for lon in [-155.0, 5.0] {
            let err = model.to_scan(coord(0.0, lon)).unwrap_err();
            assert!(err.is_out_of_view(), "lon {} should be out of view", lon);
        }
    }

    #[test]
    fn test_opposite_side_is_out_of_view() {
        let model = EllipsoidModel::goes_east();
        assert!(model.to_scan(coord(0.0, 105.0)).unwrap_err().is_out_of_view());
        assert!(model.to_scan(coord(90.0, 0.0)).unwrap_err().is_out_of_view());
    }

    #[test]
    fn test_well_inside_view() {
        let model = EllipsoidModel::goes_east();
        for (lat, lon) in [(0.0, -135.0), (-34.0, -34.0), (45.0, -100.0), (5.5, -75.0)] {
            assert!(
                model.to_scan(coord(lat, lon)).is_ok(),
                "({}, {}) should be visible",
                lat,
                lon
            );
        }
    }

    #[test]
    fn test_zenith_limit_can_be_relaxed() {
        let model = EllipsoidModel::goes_east().with_max_zenith(90.0).unwrap();
        // 80 degrees from nadir: oblique but in front of the limb
        assert!(model.to_scan(coord(0.0, 5.0)).is_ok());
        assert!(model.to_scan(coord(0.0, 15.0)).unwrap_err().is_out_of_view());
    }

    #[test]
    fn test_scan_to_space_is_out_of_view() {
        let model = EllipsoidModel::goes_east();
        let err = model.to_geodetic(ScanCoordinate::new(0.2, 0.2)).unwrap_err();
        assert!(err.is_out_of_view());
    }

    #[test]
    fn test_inverse_flattening_matches_axes() {
        let model = EllipsoidModel::from_inverse_flattening(
            GRS80_SEMI_MAJOR_AXIS,
            GRS80_INVERSE_FLATTENING,
            GOES_PERSPECTIVE_POINT_HEIGHT,
            GOES_EAST_LONGITUDE,
        )
        .unwrap();
        assert!((model.semi_minor_axis - GRS80_SEMI_MINOR_AXIS).abs() < 1e-3);
    }

    #[test]
    fn test_rejects_inverted_axes() {
        assert!(EllipsoidModel::new(6356752.0, 6378137.0, 35786023.0, -75.0).is_err());
        assert!(EllipsoidModel::new(6378137.0, 0.0, 35786023.0, -75.0).is_err());
        assert!(EllipsoidModel::goes_east().with_max_zenith(95.0).is_err());
    }

    #[test]
    fn test_same_geometry_ignores_zenith_limit() {
        let east = EllipsoidModel::goes_east();
        let relaxed = east.with_max_zenith(90.0).unwrap();
        assert!(east.same_geometry(&relaxed));
        assert!(!east.same_geometry(&EllipsoidModel::goes_west()));
    }

    #[test]
    fn test_goes_west_position() {
        let model = EllipsoidModel::goes_west();
        let scan = model.to_scan(coord(0.0, -137.2)).unwrap();
        assert!(scan.x.abs() < 1e-12);
    }
}
