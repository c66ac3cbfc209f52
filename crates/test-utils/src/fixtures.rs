//! Common fixtures: extents, projection descriptors and GOES-R grid
//! constants.

/// Extents as (min_lon, min_lat, max_lon, max_lat).
pub mod extent {
    /// Brazil and surroundings, the default product extent.
    pub const BRAZIL: (f64, f64, f64, f64) = (-75.0, -34.0, -34.0, 5.5);
}

/// PROJ.4 descriptors carried by decoded scenes.
pub mod descriptor {
    pub const GOES_EAST: &str =
        "+proj=geos +lon_0=-75 +h=35786023 +a=6378137 +b=6356752.31414 +sweep=x +no_defs";

    pub const GOES_WEST: &str =
        "+proj=geos +lon_0=-137.2 +h=35786023 +a=6378137 +b=6356752.31414 +sweep=x +no_defs";

    pub const LATLON: &str = "+proj=longlat +datum=WGS84 +no_defs";
}

/// GOES-R ABI fixed-grid constants.
pub mod goes {
    /// Perspective point height (m).
    pub const PERSPECTIVE_POINT_HEIGHT: f64 = 35786023.0;

    /// Full disk 2 km: x/y `scale_factor` (rad).
    pub const FULL_DISK_SCALE: f64 = 5.6e-5;

    /// Full disk 2 km: x `add_offset` (rad), the center of column 0.
    pub const FULL_DISK_X_OFFSET: f64 = -0.151844;

    /// Full disk 2 km: y `add_offset` (rad), the center of row 0.
    pub const FULL_DISK_Y_OFFSET: f64 = 0.151844;

    /// Full disk 2 km shape.
    pub const FULL_DISK_SIZE: usize = 5424;

    /// Example L2 rain-rate product file name.
    pub const RRQPE_FILE: &str =
        "OR_ABI-L2-RRQPEF-M6_G16_s20240151200207_e20240151209515_c20240151210011.nc";
}

/// A point in the Amazon used across scenario tests, as (lat, lon).
pub const SCENARIO_POINT: (f64, f64) = (-7.603, -63.15);

/// Cell of [`SCENARIO_POINT`] on the 0.02° Brazil grid, as (row, col).
pub const SCENARIO_CELL: (usize, usize) = (655, 592);
