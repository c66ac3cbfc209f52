//! Scene sources: the pull interface the pipeline reads scenes from.
//!
//! File retrieval and NetCDF decoding live outside this crate. A source
//! hands over already-decoded [`Scene`]s one at a time, returning `None`
//! when nothing more is available.

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::types::Scene;

/// Pull interface for decoded scenes.
pub trait SceneSource {
    /// Next scene, or `None` when the source is exhausted.
    fn fetch_next_scene(&mut self) -> Result<Option<Scene>>;
}

/// Scenes held in memory, served in insertion order.
#[derive(Debug, Default)]
pub struct MemorySceneSource {
    scenes: VecDeque<Scene>,
}

impl MemorySceneSource {
    pub fn new(scenes: impl IntoIterator<Item = Scene>) -> Self {
        Self {
            scenes: scenes.into_iter().collect(),
        }
    }

    pub fn push(&mut self, scene: Scene) {
        self.scenes.push_back(scene);
    }

    pub fn remaining(&self) -> usize {
        self.scenes.len()
    }
}

impl SceneSource for MemorySceneSource {
    fn fetch_next_scene(&mut self) -> Result<Option<Scene>> {
        Ok(self.scenes.pop_front())
    }
}

/// Scenes serialized as JSON files in a directory, served in file name
/// order.
///
/// GOES-R names sort chronologically, so a directory of
/// `OR_ABI-L2-...json` files is read oldest first. When a scene carries no
/// product metadata it is filled in from the file name.
#[derive(Debug)]
pub struct JsonDirSceneSource {
    dir: PathBuf,
    pending: VecDeque<PathBuf>,
}

impl JsonDirSceneSource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "json") {
                files.push(path);
            }
        }
        files.sort();

        info!(dir = %dir.display(), scenes = files.len(), "Opened scene directory");

        Ok(Self {
            dir,
            pending: files.into(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn read_scene(path: &Path) -> Result<Scene> {
        let reader = BufReader::new(File::open(path)?);
        let mut scene: Scene = serde_json::from_reader(reader)?;
        scene.validate()?;

        if scene.metadata.product.is_empty() {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            if let Ok(info) = ProductFileInfo::parse(stem) {
                scene.metadata.product = info.product;
                scene.metadata.satellite = Some(info.satellite);
                scene.metadata.start_time = Some(info.start_time);
            }
        }
        Ok(scene)
    }
}

impl SceneSource for JsonDirSceneSource {
    fn fetch_next_scene(&mut self) -> Result<Option<Scene>> {
        let Some(path) = self.pending.pop_front() else {
            return Ok(None);
        };
        debug!(path = %path.display(), "Reading scene");
        Self::read_scene(&path).map(Some)
    }
}

/// Fields encoded in a GOES-R product file name, e.g.
/// `OR_ABI-L2-RRQPEF-M6_G16_s20240151200207_e20240151209515_c20240151210011.nc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductFileInfo {
    /// Instrument, "ABI" or "GLM".
    pub instrument: String,
    /// Processing level, e.g. "L2".
    pub level: String,
    /// Product short name including the scene letter, e.g. "RRQPEF".
    pub product: String,
    /// Scan mode (3, 4 or 6), absent for GLM.
    pub mode: Option<u8>,
    /// ABI channel for per-band products.
    pub channel: Option<u8>,
    /// Satellite id, e.g. "G16".
    pub satellite: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl ProductFileInfo {
    /// Parse a file name (directory and extension are ignored).
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = |why: &str| PipelineError::invalid_input(format!("{}: {}", why, name));

        let file = Path::new(name)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(name);
        let stem = file.split('.').next().unwrap_or(file);
        let parts: Vec<&str> = stem.split('_').collect();
        if parts.len() < 4 || parts[0] != "OR" {
            return Err(invalid("not a GOES-R product name"));
        }

        // ABI-L2-RRQPEF-M6 or ABI-L1b-RadF-M6C13 or GLM-L2-LCFA
        let fields: Vec<&str> = parts[1].split('-').collect();
        if fields.len() < 3 {
            return Err(invalid("missing instrument/level/product"));
        }
        let (mode, channel) = match fields.get(3) {
            Some(scan) => parse_scan_mode(scan).ok_or_else(|| invalid("bad scan mode"))?,
            None => (None, None),
        };

        let satellite = parts[2];
        if !satellite.starts_with('G') {
            return Err(invalid("missing satellite id"));
        }

        let start_time = parts[3]
            .strip_prefix('s')
            .and_then(parse_goes_timestamp)
            .ok_or_else(|| invalid("bad start time"))?;
        let end_time = parts
            .get(4)
            .and_then(|p| p.strip_prefix('e'))
            .and_then(parse_goes_timestamp);

        Ok(Self {
            instrument: fields[0].to_string(),
            level: fields[1].to_string(),
            product: fields[2].to_string(),
            mode,
            channel,
            satellite: satellite.to_string(),
            start_time,
            end_time,
        })
    }
}

/// "M6" → (6, None), "M6C13" → (6, 13).
fn parse_scan_mode(s: &str) -> Option<(Option<u8>, Option<u8>)> {
    let rest = s.strip_prefix('M')?;
    match rest.split_once('C') {
        Some((mode, channel)) => Some((Some(mode.parse().ok()?), Some(channel.parse().ok()?))),
        None => Some((Some(rest.parse().ok()?), None)),
    }
}

/// `YYYYDDDHHMMSS[t]`, day of year, optional tenths of a second.
fn parse_goes_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if s.len() < 13 || !s.is_ascii() {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let day_of_year: u32 = s[4..7].parse().ok()?;
    let hour: u32 = s[7..9].parse().ok()?;
    let minute: u32 = s[9..11].parse().ok()?;
    let second: u32 = s[11..13].parse().ok()?;
    let tenths: u32 = match s.get(13..14) {
        Some(t) => t.parse().ok()?,
        None => 0,
    };

    let date = NaiveDate::from_yo_opt(year, day_of_year)?;
    let time = NaiveTime::from_hms_milli_opt(hour, minute, second, tenths * 100)?;
    Some(Utc.from_utc_datetime(&NaiveDateTime::new(date, time)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_l2_product_name() {
        let info = ProductFileInfo::parse(
            "OR_ABI-L2-RRQPEF-M6_G16_s20240151200207_e20240151209515_c20240151210011.nc",
        )
        .unwrap();
        assert_eq!(info.instrument, "ABI");
        assert_eq!(info.level, "L2");
        assert_eq!(info.product, "RRQPEF");
        assert_eq!(info.mode, Some(6));
        assert_eq!(info.channel, None);
        assert_eq!(info.satellite, "G16");
        assert_eq!(info.start_time.ordinal(), 15);
        assert_eq!(info.start_time.hour(), 12);
        assert_eq!(info.start_time.second(), 20);
        assert!(info.end_time.unwrap() > info.start_time);
    }

    #[test]
    fn test_parse_band_and_glm_names() {
        let band = ProductFileInfo::parse(
            "/data/OR_ABI-L2-CMIPF-M6C13_G18_s20241234567890_e20241234567899_c20241234567999.nc",
        );
        // day 123, 45:67 is not a valid time
        assert!(band.is_err());

        let band = ProductFileInfo::parse(
            "OR_ABI-L2-CMIPF-M6C13_G18_s20241231200000_e20241231209309_c20241231209500.nc",
        )
        .unwrap();
        assert_eq!(band.channel, Some(13));
        assert_eq!(band.satellite, "G18");

        let glm = ProductFileInfo::parse(
            "OR_GLM-L2-LCFA_G16_s20240151200000_e20240151200200_c20240151200215.nc",
        )
        .unwrap();
        assert_eq!(glm.instrument, "GLM");
        assert_eq!(glm.product, "LCFA");
        assert_eq!(glm.mode, None);
    }

    #[test]
    fn test_rejects_other_names() {
        assert!(ProductFileInfo::parse("scene.json").is_err());
        assert!(ProductFileInfo::parse("OR_ABI-L2-RRQPEF-M6_G16_sXXXX").is_err());
    }

    #[test]
    fn test_memory_source_order() {
        use crate::types::LATLON_DESCRIPTOR;
        use geo_common::GeoTransform;

        let gt = GeoTransform::north_up(0.0, 1.0, 1.0, -1.0);
        let scenes: Vec<Scene> = (0..3)
            .map(|i| Scene::new(1, 1, vec![i as f32], gt, LATLON_DESCRIPTOR).unwrap())
            .collect();
        let mut source = MemorySceneSource::new(scenes);
        assert_eq!(source.remaining(), 3);
        for i in 0..3 {
            let scene = source.fetch_next_scene().unwrap().unwrap();
            assert_eq!(scene.values[0], i as f32);
        }
        assert!(source.fetch_next_scene().unwrap().is_none());
    }
}
