//! Derived indices computed from decoded rasters.

use crate::error::Result;
use crate::preprocess::KELVIN_OFFSET;
use crate::types::MaskedRaster;

/// NDVI below this is treated as non-vegetated.
pub const MIN_VEGETATION_NDVI: f32 = 0.1;

/// Normalized difference vegetation index `(nir - red) / (nir + red)`.
///
/// Both rasters must share a grid (ABI C02 red resampled to the C03
/// near-infrared grid). A cell is NaN when either input is NaN or the sum
/// is zero.
pub fn ndvi(red: &MaskedRaster, nir: &MaskedRaster) -> Result<MaskedRaster> {
    red.ensure_same_grid(nir)?;

    let values = red
        .values
        .iter()
        .zip(&nir.values)
        .map(|(&r, &n)| {
            let sum = n + r;
            if sum == 0.0 {
                f32::NAN
            } else {
                (n - r) / sum
            }
        })
        .collect();

    MaskedRaster::new(
        red.width,
        red.height,
        values,
        red.geotransform,
        red.projection.clone(),
    )
}

/// Kelvin to degrees Celsius.
pub fn kelvin_to_celsius(kelvin: f32) -> f32 {
    kelvin - KELVIN_OFFSET
}

/// Mask every cell below `min`.
pub fn threshold_below(raster: MaskedRaster, min: f32) -> MaskedRaster {
    let mut raster = raster;
    raster
        .values
        .iter_mut()
        .filter(|v| **v < min)
        .for_each(|v| *v = f32::NAN);
    raster
}
