//! Affine pixel-to-native coordinate transforms.

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, GeoResult};

/// GDAL-style affine geotransform.
///
/// ```text
/// x = c[0] + col * c[1] + row * c[2]
/// y = c[3] + col * c[4] + row * c[5]
/// ```
///
/// `(c[0], c[3])` is the outer corner of pixel (0, 0), not its center.
/// Only north-up transforms (no rotation terms) can be inverted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// Build a north-up transform from the top-left corner and pixel size.
    /// `pixel_height` is normally negative (rows go north to south).
    pub fn north_up(origin_x: f64, pixel_width: f64, origin_y: f64, pixel_height: f64) -> Self {
        Self([origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height])
    }

    pub fn origin_x(&self) -> f64 {
        self.0[0]
    }

    pub fn pixel_width(&self) -> f64 {
        self.0[1]
    }

    pub fn origin_y(&self) -> f64 {
        self.0[3]
    }

    pub fn pixel_height(&self) -> f64 {
        self.0[5]
    }

    /// Check the transform is usable for index lookups.
    pub fn validate(&self) -> GeoResult<()> {
        if self.0.iter().any(|v| !v.is_finite()) {
            return Err(GeoError::InvalidGeoTransform(format!(
                "non-finite coefficient in {:?}",
                self.0
            )));
        }
        if self.0[2] != 0.0 || self.0[4] != 0.0 {
            return Err(GeoError::InvalidGeoTransform(
                "rotated geotransforms are not supported".to_string(),
            ));
        }
        if self.0[1] == 0.0 || self.0[5] == 0.0 {
            return Err(GeoError::InvalidGeoTransform(
                "pixel size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Native coordinate of the center of pixel (row, col).
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        let c = col as f64 + 0.5;
        let r = row as f64 + 0.5;
        (
            self.0[0] + c * self.0[1] + r * self.0[2],
            self.0[3] + c * self.0[4] + r * self.0[5],
        )
    }

    /// Transform for a window starting at (row_off, col_off) of this grid.
    pub fn window(&self, row_off: usize, col_off: usize) -> Self {
        let mut c = self.0;
        c[0] = self.0[0] + col_off as f64 * self.0[1] + row_off as f64 * self.0[2];
        c[3] = self.0[3] + col_off as f64 * self.0[4] + row_off as f64 * self.0[5];
        Self(c)
    }

    /// Approximate equality, tolerant to the last few bits of each
    /// coefficient. Two scenes from the same product/resolution share the
    /// same transform up to serialization noise.
    pub fn approx_eq(&self, other: &GeoTransform) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| {
            let scale = a.abs().max(b.abs()).max(1.0);
            (a - b).abs() <= 1e-9 * scale
        })
    }
}
