//! Synthetic rasters for tests.
//!
//! All generators return row-major `Vec`s (row 0 first) with predictable
//! contents so expected values can be computed by hand.

/// Grid where each cell holds `col * 1000 + row`.
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);
/// assert_eq!(grid[10], 1.0);
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Brightness-temperature-like values in Kelvin, 250K top-left to 310K
/// bottom-right.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            data.push(250.0 + (x_factor * 30.0) + (y_factor * 30.0));
        }
    }
    data
}

/// Rain-rate-like values in mm/h: mostly zero, a quarter of the cells up
/// to 50. Deterministic for a given seed.
pub fn create_precipitation_grid(width: usize, height: usize, seed: u32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed);
            let rate = if hash % 4 == 0 {
                (hash % 5000) as f32 / 100.0
            } else {
                0.0
            };
            data.push(rate);
        }
    }
    data
}

/// Data-quality flags in `0..=3`, deterministic for a given seed.
///
/// Roughly half the cells are flag 0 (good), the rest spread over 1..=3.
pub fn create_quality_grid(width: usize, height: usize, seed: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let hash = simple_hash(col as u32, row as u32, seed.wrapping_add(7));
            let flag = if hash % 2 == 0 { 0 } else { (hash % 3 + 1) as u8 };
            data.push(flag);
        }
    }
    data
}

/// Quality flags that are 0 everywhere except `value` at the given
/// (col, row) positions.
pub fn create_flagged_quality(
    width: usize,
    height: usize,
    positions: &[(usize, usize)],
    value: u8,
) -> Vec<u8> {
    let mut data = vec![0u8; width * height];
    for &(col, row) in positions {
        if col < width && row < height {
            data[row * width + col] = value;
        }
    }
    data
}

fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// Zero grid with NaN at the given (col, row) positions.
pub fn create_grid_with_nans(
    width: usize,
    height: usize,
    nan_positions: &[(usize, usize)],
) -> Vec<f32> {
    let mut data = vec![0.0f32; width * height];
    for &(col, row) in nan_positions {
        if col < width && row < height {
            data[row * width + col] = f32::NAN;
        }
    }
    data
}
