//! Shared test utilities for the goes-raster workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Approximate float assertions
//! - Synthetic raster and quality-flag generators
//! - Common fixtures (extents, descriptors, GOES-R grid constants)
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;

/// Scratch directory removed when dropped.
///
/// Panics if the OS temp dir is unusable; only meant for tests.
pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("goes-raster-test-")
        .tempdir()
        .expect("failed to create scratch directory")
}

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Element-wise comparison of two rasters where NaN equals NaN.
#[macro_export]
macro_rules! assert_raster_eq {
    ($left:expr, $right:expr) => {{
        let left: &[f32] = &$left;
        let right: &[f32] = &$right;
        assert_eq!(left.len(), right.len(), "raster lengths differ");
        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            if !(l.is_nan() && r.is_nan()) && l != r {
                panic!("rasters differ at index {}: {:?} != {:?}", i, l, r);
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_raster_eq_treats_nan_as_equal() {
        assert_raster_eq!(vec![1.0, f32::NAN], vec![1.0, f32::NAN]);
    }

    #[test]
    #[should_panic(expected = "rasters differ")]
    fn test_raster_eq_detects_difference() {
        assert_raster_eq!(vec![1.0, f32::NAN], vec![1.0, 2.0]);
    }

    #[test]
    fn test_scratch_dir_exists() {
        let dir = super::scratch_dir();
        assert!(dir.path().is_dir());
    }
}
