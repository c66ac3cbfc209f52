//! Quality-masked raster pipeline for GOES-R L2 products.
//!
//! Scenes flow through four pure stages:
//!
//! ```text
//! SceneSource::fetch_next_scene()
//!      │
//!      ▼
//! preprocess::decode        fill → scale/offset → DQF mask → unit conversion
//!      │
//!      ▼
//! accumulate::reduce/fold   NaN-safe sum / max / mean
//!      │
//!      ▼
//! reproject::ReprojectionPlan   nearest neighbour onto a lat/lon grid
//!      │
//!      ▼
//! sample::sample            value (or nodata) at a point
//! ```
//!
//! # Example
//!
//! ```ignore
//! use scene_pipeline::{decode, reduce, reproject, sample, ReduceOp};
//!
//! let rasters = scenes.iter().map(decode).collect::<Result<Vec<_>, _>>()?;
//! let total = reduce(rasters, ReduceOp::Sum)?;
//! let geo = reproject(&total, extent, 0.02, 0.02)?;
//! let rain = sample(&geo, point)?;
//! ```

pub mod accumulate;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod indices;
pub mod preprocess;
pub mod reproject;
pub mod sample;
pub mod source;
pub mod types;
pub mod window;

pub use accumulate::{reduce, AccumulatedRaster, ReduceOp};
pub use config::{PipelineConfig, ProductConfig, TargetGrid};
pub use error::{PipelineError, Result};
pub use events::{event_density, events_in_extent, events_near, EventKind, PointEvent};
pub use export::{JsonRasterExport, MemoryRasterSink, RasterSink};
pub use indices::{kelvin_to_celsius, ndvi, threshold_below};
pub use preprocess::{
    decode, decode_all, decode_with, UnitConversion, KELVIN_OFFSET, MAX_ACCEPTABLE_QUALITY_FLAG,
};
pub use reproject::{reproject, ReprojectionPlan};
pub use sample::{sample, sample_many, NamedPoint, Sample};
pub use source::{JsonDirSceneSource, MemorySceneSource, ProductFileInfo, SceneSource};
pub use types::{
    GeographicRaster, MaskedRaster, Scene, SceneMetadata, SourceRaster, LATLON_DESCRIPTOR,
};
pub use window::{crop_to_extent, native_window, PixelWindow};
