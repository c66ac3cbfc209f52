//! Scene decoding: fill removal, scale/offset and quality masking.
//!
//! Decoding is a pure function of the scene. The order is fixed:
//!
//! 1. raw cells equal to `fill_value` become NaN
//! 2. `physical = raw * scale_factor + add_offset`
//! 3. cells whose quality flag exceeds [`MAX_ACCEPTABLE_QUALITY_FLAG`] become NaN
//! 4. an optional unit conversion is applied to the remaining cells

use std::borrow::Borrow;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::types::{MaskedRaster, Scene};

/// Highest data-quality flag still considered usable.
///
/// GOES-R L2 DQF: 0 = good, 1 = degraded but usable, anything above is
/// masked. This is a property of the products, not a per-call option.
pub const MAX_ACCEPTABLE_QUALITY_FLAG: u8 = 1;

/// Offset between Kelvin and degrees Celsius.
pub const KELVIN_OFFSET: f32 = 273.15;

/// Unit conversions selectable from product configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitConversion {
    #[default]
    None,
    KelvinToCelsius,
}

impl UnitConversion {
    pub fn apply(&self, value: f32) -> f32 {
        match self {
            Self::None => value,
            Self::KelvinToCelsius => value - KELVIN_OFFSET,
        }
    }
}

/// Decode a scene without unit conversion.
pub fn decode(scene: &Scene) -> Result<MaskedRaster> {
    decode_with(scene, |v| v)
}

/// Decode a scene, then apply `convert` to every unmasked cell.
pub fn decode_with(scene: &Scene, convert: impl Fn(f32) -> f32) -> Result<MaskedRaster> {
    scene.validate()?;

    let quality = match &scene.quality {
        Some(q) if q.len() != scene.values.len() => {
            return Err(PipelineError::shape_mismatch(format!(
                "quality flags have {} cells, values have {}",
                q.len(),
                scene.values.len()
            )));
        }
        Some(q) => Some(q.as_slice()),
        None => None,
    };

    let fill = scene.fill_value;
    let is_fill = |raw: f32| raw == fill || (fill.is_nan() && raw.is_nan());

    let values: Vec<f32> = scene
        .values
        .iter()
        .enumerate()
        .map(|(i, &raw)| {
            if is_fill(raw) {
                return f32::NAN;
            }
            if quality.is_some_and(|q| q[i] > MAX_ACCEPTABLE_QUALITY_FLAG) {
                return f32::NAN;
            }
            let physical = raw * scene.scale_factor + scene.add_offset;
            if physical.is_nan() {
                physical
            } else {
                convert(physical)
            }
        })
        .collect();

    let raster = MaskedRaster::new(
        scene.width,
        scene.height,
        values,
        scene.geotransform,
        scene.projection.clone(),
    )?;

    debug!(
        product = %scene.metadata.product,
        width = scene.width,
        height = scene.height,
        valid = raster.valid_count(),
        "Decoded scene"
    );

    Ok(raster)
}

/// Decode many scenes in parallel. Results keep the input order.
///
/// Accepts owned scenes or references, so a caller can decode a selection
/// of a batch without copying it.
pub fn decode_all<S>(scenes: &[S], conversion: UnitConversion) -> Vec<Result<MaskedRaster>>
where
    S: Borrow<Scene> + Sync,
{
    scenes
        .par_iter()
        .map(|scene| decode_with(Borrow::<Scene>::borrow(scene), |v| conversion.apply(v)))
        .collect()
}
