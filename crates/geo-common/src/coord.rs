//! Geodetic coordinates.

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, GeoResult};

/// A point on the Earth in geodetic latitude/longitude degrees.
///
/// Values are validated on construction: both components must be finite,
/// latitude within [-90, 90] and longitude within [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticCoordinate {
    latitude: f64,
    longitude: f64,
}

impl GeodeticCoordinate {
    /// Create a validated coordinate.
    pub fn new(latitude: f64, longitude: f64) -> GeoResult<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(GeoError::InvalidCoordinate(format!(
                "non-finite coordinate (lat={}, lon={})",
                latitude, longitude
            )));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidCoordinate(format!(
                "latitude {} outside [-90, 90]",
                latitude
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidCoordinate(format!(
                "longitude {} outside [-180, 180]",
                longitude
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// (latitude, longitude) in radians.
    pub fn to_radians(&self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl std::fmt::Display for GeodeticCoordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}
