//! Point events (lightning, fire hotspots) and proximity filters.
//!
//! GLM and fire products report discrete detections with a location
//! instead of a raster. These helpers select the detections relevant to a
//! place and grid them so they can be sampled like any other raster.

use chrono::{DateTime, Utc};
use geo_common::{BoundingBox, GeoGrid, GeodeticCoordinate};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::GeographicRaster;

/// Half-width in degrees of the box used for "events near a point".
pub const DEFAULT_PROXIMITY_DEG: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    LightningFlash,
    LightningGroup,
    LightningEvent,
    FireHotspot,
}

/// One detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointEvent {
    pub latitude: f64,
    pub longitude: f64,
    pub kind: EventKind,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    /// Optical energy, fire radiative power, ...
    #[serde(default)]
    pub value: Option<f32>,
}

impl PointEvent {
    pub fn new(latitude: f64, longitude: f64, kind: EventKind) -> Self {
        Self {
            latitude,
            longitude,
            kind,
            time: None,
            value: None,
        }
    }

    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }
}

/// Events inside `extent`, edges included.
pub fn events_in_extent<'a>(events: &'a [PointEvent], extent: &BoundingBox) -> Vec<&'a PointEvent> {
    events
        .iter()
        .filter(|e| extent.contains(e.longitude, e.latitude))
        .collect()
}

/// Events within ±`half_width_deg` of `center` in both latitude and
/// longitude.
pub fn events_near(
    events: &[PointEvent],
    center: GeodeticCoordinate,
    half_width_deg: f64,
) -> Vec<&PointEvent> {
    let bbox = BoundingBox::around(center.longitude(), center.latitude(), half_width_deg);
    events_in_extent(events, &bbox)
}

/// Count of events per cell of the grid over `extent`.
///
/// Cells without events hold 0, not nodata; events off the grid are
/// ignored.
pub fn event_density(
    events: &[PointEvent],
    extent: BoundingBox,
    x_res: f64,
    y_res: f64,
) -> Result<GeographicRaster> {
    let grid = GeoGrid::new(extent, x_res, y_res)?;
    let mut counts = vec![0.0f32; grid.len()];
    for event in events {
        if let Ok((row, col)) = grid.cell_of(event.longitude, event.latitude) {
            counts[grid.flat_index(row, col)] += 1.0;
        }
    }
    GeographicRaster::new(grid, counts, f32::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flashes() -> Vec<PointEvent> {
        vec![
            PointEvent::new(-10.0, -50.0, EventKind::LightningFlash),
            PointEvent::new(-10.5, -49.5, EventKind::LightningFlash),
            PointEvent::new(-10.6, -50.0, EventKind::LightningFlash),
            PointEvent::new(-9.8, -50.2, EventKind::FireHotspot),
        ]
    }

    #[test]
    fn test_events_near_is_inclusive() {
        let events = flashes();
        let center = GeodeticCoordinate::new(-10.0, -50.0).unwrap();
        let near = events_near(&events, center, DEFAULT_PROXIMITY_DEG);
        assert_eq!(near.len(), 3);
        assert!(near.iter().all(|e| e.latitude >= -10.5));
    }

    #[test]
    fn test_events_in_extent() {
        let events = flashes();
        let inside = events_in_extent(&events, &BoundingBox::new(-50.1, -11.0, -49.0, -10.0));
        assert_eq!(inside.len(), 3);
    }

    #[test]
    fn test_event_density() {
        let events = flashes();
        let raster = event_density(&events, BoundingBox::new(-51.0, -11.0, -49.0, -9.0), 1.0, 1.0)
            .unwrap();
        assert_eq!(raster.shape(), (2, 2));
        assert_eq!(raster.values.iter().sum::<f32>(), 4.0);
        // Cells are floored from the north-west corner, so the three flashes
        // on or below -10 and east of -50 share the south-east cell
        assert_eq!(raster.get(1, 1), Some(3.0));
        assert_eq!(raster.get(0, 0), Some(1.0));
    }
}
