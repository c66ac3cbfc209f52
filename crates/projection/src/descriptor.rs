//! Native projection descriptors.
//!
//! Decoded scenes carry their projection as a PROJ.4 style string, e.g.
//!
//! ```text
//! +proj=geos +lon_0=-75 +h=35786023 +a=6378137 +b=6356752.31414 +sweep=x +no_defs
//! ```
//!
//! Only the two families the pipeline handles are recognised: the GOES-R
//! fixed grid and plain geographic lat/lon.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};
use crate::geostationary::EllipsoidModel;

const WGS84_INVERSE_FLATTENING: f64 = 298.257223563;
const GRS80_INVERSE_FLATTENING: f64 = 298.257222101;
const WGS84_SEMI_MAJOR_AXIS: f64 = 6378137.0;

/// Projection of a source raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NativeProjection {
    /// Geostationary fixed grid, x sweep.
    Geostationary(EllipsoidModel),
    /// Geographic lat/lon degrees.
    LatLon,
}

impl NativeProjection {
    /// Parse a PROJ.4 style descriptor.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let params = parse_params(descriptor)?;

        let proj = params
            .get("proj")
            .and_then(|v| v.as_deref())
            .ok_or_else(|| {
                ProjectionError::invalid_descriptor(format!("missing +proj in '{}'", descriptor))
            })?;

        match proj {
            "geos" => parse_geos(&params).map(Self::Geostationary),
            "longlat" | "latlong" | "lonlat" | "latlon" => Ok(Self::LatLon),
            other => Err(ProjectionError::invalid_descriptor(format!(
                "unsupported projection '{}'",
                other
            ))),
        }
    }

    /// Native units per radian of scan angle.
    ///
    /// Geostationary grids are expressed in meters on the perspective
    /// sphere, i.e. `h` per radian. Lat/lon grids are in degrees.
    pub fn units_per_radian(&self) -> f64 {
        match self {
            Self::Geostationary(model) => model.perspective_point_height,
            Self::LatLon => 1.0_f64.to_degrees(),
        }
    }

    /// Render as a PROJ.4 string.
    pub fn to_proj4(&self) -> String {
        match self {
            Self::Geostationary(m) => format!(
                "+proj=geos +lon_0={} +h={} +a={} +b={} +sweep=x +units=m +no_defs",
                m.sub_satellite_longitude,
                m.perspective_point_height,
                m.semi_major_axis,
                m.semi_minor_axis
            ),
            Self::LatLon => "+proj=longlat +datum=WGS84 +no_defs".to_string(),
        }
    }

    pub fn is_geostationary(&self) -> bool {
        matches!(self, Self::Geostationary(_))
    }
}

impl FromStr for NativeProjection {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for NativeProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_proj4())
    }
}

fn parse_params(descriptor: &str) -> Result<HashMap<String, Option<String>>> {
    let mut params = HashMap::new();
    for token in descriptor.split_whitespace() {
        let token = token.strip_prefix('+').ok_or_else(|| {
            ProjectionError::invalid_descriptor(format!("token '{}' does not start with '+'", token))
        })?;
        match token.split_once('=') {
            Some((key, value)) => params.insert(key.to_string(), Some(value.to_string())),
            None => params.insert(token.to_string(), None),
        };
    }
    Ok(params)
}

fn number(params: &HashMap<String, Option<String>>, key: &str) -> Result<Option<f64>> {
    match params.get(key) {
        None => Ok(None),
        Some(None) => Err(ProjectionError::invalid_descriptor(format!(
            "+{} needs a value",
            key
        ))),
        Some(Some(raw)) => raw.parse::<f64>().map(Some).map_err(|_| {
            ProjectionError::invalid_descriptor(format!("+{}={} is not a number", key, raw))
        }),
    }
}

fn parse_geos(params: &HashMap<String, Option<String>>) -> Result<EllipsoidModel> {
    // PROJ defaults to a y sweep; GOES-R requires x.
    let sweep = params
        .get("sweep")
        .and_then(|v| v.as_deref())
        .unwrap_or("y");
    if sweep != "x" {
        return Err(ProjectionError::invalid_descriptor(format!(
            "sweep axis '{}' is not supported, expected x",
            sweep
        )));
    }

    let h = number(params, "h")?
        .ok_or_else(|| ProjectionError::invalid_descriptor("geos projection needs +h"))?;
    let lon_0 = number(params, "lon_0")?.unwrap_or(0.0);

    let a = number(params, "a")?;
    let b = number(params, "b")?;
    let rf = number(params, "rf")?;
    let ellps = params.get("ellps").and_then(|v| v.as_deref());
    let datum = params.get("datum").and_then(|v| v.as_deref());

    let model = match (a, b, rf) {
        (Some(a), Some(b), _) => EllipsoidModel::new(a, b, h, lon_0),
        (a, None, Some(rf)) => {
            EllipsoidModel::from_inverse_flattening(a.unwrap_or(WGS84_SEMI_MAJOR_AXIS), rf, h, lon_0)
        }
        (None, None, None) => {
            let rf = match ellps.or(datum) {
                Some("GRS80") => GRS80_INVERSE_FLATTENING,
                Some("WGS84") | None => WGS84_INVERSE_FLATTENING,
                Some(other) => {
                    return Err(ProjectionError::invalid_descriptor(format!(
                        "unknown ellipsoid '{}'",
                        other
                    )))
                }
            };
            EllipsoidModel::from_inverse_flattening(WGS84_SEMI_MAJOR_AXIS, rf, h, lon_0)
        }
        _ => {
            return Err(ProjectionError::invalid_descriptor(
                "ellipsoid needs +a with +b or +rf",
            ))
        }
    };

    model.map_err(|e| ProjectionError::invalid_descriptor(e.to_string()))
}
