//! NaN-safe accumulation of masked rasters.
//!
//! NaN means "no contribution": a cell only becomes finite once some
//! raster contributes a finite value to it. The aggregate is a plain value
//! folded one raster at a time, so a periodic feed never needs to keep its
//! history.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::types::{MaskedRaster, SourceRaster};

/// Reduction applied per cell across rasters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceOp {
    /// Total of finite contributors (rain accumulation).
    #[default]
    Sum,
    /// Greatest finite contributor (maximum NDVI, peak temperature).
    Max,
    /// Sum divided by the number of finite contributors.
    Mean,
}

impl std::fmt::Display for ReduceOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReduceOp::Sum => write!(f, "sum"),
            ReduceOp::Max => write!(f, "max"),
            ReduceOp::Mean => write!(f, "mean"),
        }
    }
}

/// Running aggregate over rasters sharing one grid.
///
/// For `Mean` the per-cell sums are kept alongside the counts and the
/// visible raster always holds `sum / count`.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatedRaster {
    raster: MaskedRaster,
    counts: Vec<u32>,
    sums: Option<Vec<f32>>,
    op: ReduceOp,
    scenes: usize,
}

impl AccumulatedRaster {
    /// Start an aggregate from its first raster.
    pub fn start(raster: MaskedRaster, op: ReduceOp) -> Self {
        let counts = raster
            .values
            .iter()
            .map(|v| u32::from(!v.is_nan()))
            .collect();
        let sums = (op == ReduceOp::Mean).then(|| raster.values.clone());
        Self {
            raster,
            counts,
            sums,
            op,
            scenes: 1,
        }
    }

    /// Fold one more raster into the aggregate.
    ///
    /// Fails with `ShapeMismatch` if the raster is on a different grid; the
    /// aggregate is consumed either way.
    pub fn fold(mut self, next: &MaskedRaster) -> Result<Self> {
        self.raster.ensure_same_grid(next)?;

        match self.sums.as_mut() {
            Some(sums) => {
                let cells = self
                    .raster
                    .values
                    .iter_mut()
                    .zip(sums.iter_mut())
                    .zip(self.counts.iter_mut())
                    .zip(next.values.iter());
                for (((mean, sum), count), &v) in cells {
                    if v.is_nan() {
                        continue;
                    }
                    *count += 1;
                    *sum = if sum.is_nan() { v } else { *sum + v };
                    *mean = *sum / *count as f32;
                }
            }
            None => {
                let op = self.op;
                let cells = self
                    .raster
                    .values
                    .iter_mut()
                    .zip(self.counts.iter_mut())
                    .zip(next.values.iter());
                for ((acc, count), &v) in cells {
                    if v.is_nan() {
                        continue;
                    }
                    *count += 1;
                    *acc = if acc.is_nan() {
                        v
                    } else if op == ReduceOp::Max {
                        acc.max(v)
                    } else {
                        *acc + v
                    };
                }
            }
        }
        self.scenes += 1;
        Ok(self)
    }

    pub fn op(&self) -> ReduceOp {
        self.op
    }

    /// Number of rasters folded in so far.
    pub fn scene_count(&self) -> usize {
        self.scenes
    }

    /// Finite contributors per cell.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Current aggregate values.
    pub fn raster(&self) -> &MaskedRaster {
        &self.raster
    }

    /// Hand the aggregate on as a plain masked raster.
    pub fn into_masked(self) -> MaskedRaster {
        self.raster
    }
}

impl SourceRaster for AccumulatedRaster {
    fn width(&self) -> usize {
        self.raster.width
    }

    fn height(&self) -> usize {
        self.raster.height
    }

    fn values(&self) -> &[f32] {
        &self.raster.values
    }

    fn geotransform(&self) -> geo_common::GeoTransform {
        self.raster.geotransform
    }

    fn projection(&self) -> &str {
        &self.raster.projection
    }
}

/// Reduce a sequence of rasters with `op`.
///
/// Fails with `EmptyAccumulation` for an empty sequence and with
/// `ShapeMismatch` if any raster is on a different grid than the first.
pub fn reduce<I>(rasters: I, op: ReduceOp) -> Result<AccumulatedRaster>
where
    I: IntoIterator<Item = MaskedRaster>,
{
    let mut iter = rasters.into_iter();
    let first = iter.next().ok_or(PipelineError::EmptyAccumulation)?;

    let mut acc = AccumulatedRaster::start(first, op);
    for raster in iter {
        acc = acc.fold(&raster)?;
    }

    debug!(
        op = %op,
        scenes = acc.scene_count(),
        valid = acc.raster().valid_count(),
        "Accumulated rasters"
    );

    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LATLON_DESCRIPTOR;
    use geo_common::GeoTransform;
    use test_utils::{assert_raster_eq, create_grid_with_nans, create_precipitation_grid};

    const NAN: f32 = f32::NAN;

    fn raster(values: Vec<f32>) -> MaskedRaster {
        let n = values.len();
        MaskedRaster::new(
            n,
            1,
            values,
            GeoTransform::north_up(0.0, 1.0, 1.0, -1.0),
            LATLON_DESCRIPTOR,
        )
        .unwrap()
    }

    #[test]
    fn test_sum_ignores_nan() {
        let acc = reduce(
            vec![
                raster(vec![NAN, 1.0, NAN]),
                raster(vec![2.0, 1.0, NAN]),
                raster(vec![NAN, 1.0, NAN]),
            ],
            ReduceOp::Sum,
        )
        .unwrap();
        let v = &acc.raster().values;
        assert_eq!(v[0], 2.0);
        assert_eq!(v[1], 3.0);
        assert!(v[2].is_nan());
        assert_eq!(acc.counts(), &[1, 3, 0]);
    }

    #[test]
    fn test_max_picks_greatest_finite() {
        let acc = reduce(
            vec![raster(vec![-5.0, NAN]), raster(vec![-7.0, NAN])],
            ReduceOp::Max,
        )
        .unwrap();
        assert_eq!(acc.raster().values[0], -5.0);
        assert!(acc.raster().values[1].is_nan());
    }

    #[test]
    fn test_mean_divides_by_finite_count() {
        let acc = reduce(
            vec![
                raster(vec![1.0, 4.0]),
                raster(vec![NAN, 6.0]),
                raster(vec![3.0, 8.0]),
            ],
            ReduceOp::Mean,
        )
        .unwrap();
        assert!((acc.raster().values[0] - 2.0).abs() < 1e-6);
        assert!((acc.raster().values[1] - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_streaming_matches_batch() {
        let inputs = vec![
            raster(vec![1.0, NAN, 3.0]),
            raster(vec![NAN, NAN, 1.0]),
            raster(vec![2.0, 5.0, NAN]),
        ];
        let batch = reduce(inputs.clone(), ReduceOp::Sum).unwrap();

        let mut acc = AccumulatedRaster::start(inputs[0].clone(), ReduceOp::Sum);
        for r in &inputs[1..] {
            acc = acc.fold(r).unwrap();
        }
        assert_eq!(acc.counts(), batch.counts());
        assert_eq!(acc.scene_count(), 3);
        assert_eq!(acc.into_masked().values, batch.into_masked().values);
    }

    /// 8x8 rain-like rasters with a few cells masked differently per seed.
    fn rain_series(count: u32) -> Vec<MaskedRaster> {
        (0..count)
            .map(|seed| {
                let mask = create_grid_with_nans(
                    8,
                    8,
                    &[(seed as usize, 0), (3, seed as usize), (7, 7)],
                );
                let values = create_precipitation_grid(8, 8, seed)
                    .into_iter()
                    .zip(mask)
                    .map(|(v, m)| v + m)
                    .collect();
                MaskedRaster::new(
                    8,
                    8,
                    values,
                    GeoTransform::north_up(-64.0, 0.5, -4.0, -0.5),
                    LATLON_DESCRIPTOR,
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_restart_from_aggregate_matches_batch() {
        let inputs = rain_series(4);
        for op in [ReduceOp::Sum, ReduceOp::Max, ReduceOp::Mean] {
            let batch = reduce(inputs.clone(), op).unwrap();

            let earlier = reduce(inputs[..3].to_vec(), op).unwrap();
            let resumed = earlier.fold(&inputs[3]).unwrap();

            assert_eq!(resumed.counts(), batch.counts(), "{}", op);
            assert_eq!(resumed.scene_count(), 4);
            assert_raster_eq!(resumed.raster().values, batch.raster().values);
            assert!(resumed.raster().values[63].is_nan(), "{}", op);
        }
    }

    #[test]
    fn test_long_mean_is_sum_over_count() {
        let values: Vec<f32> = (0..1000).map(|i| (i % 7) as f32 * 0.3 + 0.1).collect();
        let acc = reduce(
            values.iter().map(|&v| raster(vec![v, NAN])),
            ReduceOp::Mean,
        )
        .unwrap();

        let sum = values.iter().fold(0.0f32, |s, &v| s + v);
        assert_eq!(acc.raster().values[0], sum / 1000.0);
        assert!(acc.raster().values[1].is_nan());
        assert_eq!(acc.counts(), &[1000, 0]);
    }

    #[test]
    fn test_empty_and_mismatch() {
        assert!(matches!(
            reduce(Vec::<MaskedRaster>::new(), ReduceOp::Sum),
            Err(PipelineError::EmptyAccumulation)
        ));
        assert!(matches!(
            reduce(vec![raster(vec![1.0]), raster(vec![1.0, 2.0])], ReduceOp::Max),
            Err(PipelineError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_geotransform_mismatch() {
        let a = raster(vec![1.0]);
        let mut b = raster(vec![1.0]);
        b.geotransform = GeoTransform::north_up(10.0, 1.0, 1.0, -1.0);
        assert!(AccumulatedRaster::start(a, ReduceOp::Sum).fold(&b).is_err());
    }
}
