//! Geographic extents.

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, GeoResult};

/// A geographic extent in WGS84 degrees.
///
/// Field order follows the (min_lon, min_lat, max_lon, max_lat) convention
/// used for every extent in this workspace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Build from a `(min_lon, min_lat, max_lon, max_lat)` tuple.
    pub fn from_tuple(extent: (f64, f64, f64, f64)) -> Self {
        Self::new(extent.0, extent.1, extent.2, extent.3)
    }

    /// Parse a comma separated extent: "min_lon,min_lat,max_lon,max_lat".
    pub fn parse(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxParseError::InvalidFormat(s.to_string()));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| BboxParseError::InvalidNumber(part.to_string()))?;
        }

        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }

    /// Check that the extent is finite, ordered and inside the valid
    /// geographic range.
    pub fn validate(&self) -> GeoResult<()> {
        let corners = [self.min_lon, self.min_lat, self.max_lon, self.max_lat];
        if corners.iter().any(|v| !v.is_finite()) {
            return Err(GeoError::InvalidExtent(format!(
                "non-finite corner in {:?}",
                self
            )));
        }
        if self.min_lon >= self.max_lon || self.min_lat >= self.max_lat {
            return Err(GeoError::InvalidExtent(format!(
                "min must be below max, got {:?}",
                self
            )));
        }
        if self.min_lon < -180.0 || self.max_lon > 180.0 || self.min_lat < -90.0 || self.max_lat > 90.0
        {
            return Err(GeoError::InvalidExtent(format!(
                "extent exceeds [-180, 180] x [-90, 90]: {:?}",
                self
            )));
        }
        Ok(())
    }

    /// Width in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Height in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Check if this extent intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon < other.max_lon
            && self.max_lon > other.min_lon
            && self.min_lat < other.max_lat
            && self.max_lat > other.min_lat
    }

    /// Check if a point is contained within this extent (edges included).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.min_lon && lon <= self.max_lon && lat >= self.min_lat && lat <= self.max_lat
    }

    /// Center point as (lon, lat).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lon + self.max_lon) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Square box of `half_width` degrees around a point, as used for
    /// "events near a location" queries.
    pub fn around(lon: f64, lat: f64, half_width: f64) -> Self {
        Self::new(
            lon - half_width,
            lat - half_width,
            lon + half_width,
            lat + half_width,
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid extent format: {0}. Expected 'min_lon,min_lat,max_lon,max_lat'")]
    InvalidFormat(String),

    #[error("Invalid number in extent: {0}")]
    InvalidNumber(String),
}
