//! One sampling run: scenes in, per-product point values out.
//!
//! Scenes are read from the source in small batches. Each batch is decoded
//! in parallel and folded into every product it belongs to before the next
//! one is read, so memory stays bounded by the batch size plus one
//! aggregate per product.

use std::path::Path;

use anyhow::{bail, Context, Result};
use scene_pipeline::{
    decode_all, sample_many, AccumulatedRaster, GeographicRaster, NamedPoint, PipelineConfig,
    PipelineError, ProductConfig, RasterSink, ReduceOp, ReprojectionPlan, Scene, SceneSource,
    TargetGrid,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Value found at one point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointReport {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// `None` for nodata cells and for points that could not be sampled.
    pub value: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of one configured product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductReport {
    pub id: String,
    pub variable: String,
    pub reducer: ReduceOp,
    /// Scenes that contributed to the accumulation.
    pub scenes: usize,
    /// Scenes of this product that failed to decode or were on a
    /// different grid than the first one.
    pub rejected: usize,
    /// Target cells with a source pixel.
    pub covered_cells: usize,
    pub points: Vec<PointReport>,
}

/// Load points from a JSON array of `{name, latitude, longitude}`.
pub fn load_points(path: &Path) -> Result<Vec<NamedPoint>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read points file {}", path.display()))?;
    let points: Vec<NamedPoint> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse points file {}", path.display()))?;
    for point in &points {
        point
            .coordinate()
            .with_context(|| format!("point {}", point.name))?;
    }
    Ok(points)
}

/// Parse `name=lat,lon` or `lat,lon`.
pub fn parse_point(spec: &str) -> Result<NamedPoint> {
    let (name, coords) = match spec.split_once('=') {
        Some((name, coords)) => (name.trim().to_string(), coords),
        None => (spec.trim().to_string(), spec),
    };
    let Some((lat, lon)) = coords.split_once(',') else {
        bail!("point {:?} is not lat,lon", spec);
    };
    let latitude: f64 = lat
        .trim()
        .parse()
        .with_context(|| format!("bad latitude in {:?}", spec))?;
    let longitude: f64 = lon
        .trim()
        .parse()
        .with_context(|| format!("bad longitude in {:?}", spec))?;

    let point = NamedPoint::new(name, latitude, longitude);
    point
        .coordinate()
        .with_context(|| format!("point {:?}", spec))?;
    Ok(point)
}

/// Scenes read and decoded together when no batch size is given.
pub const DEFAULT_DECODE_BATCH: usize = 8;

fn belongs_to(product: &ProductConfig, scene: &Scene) -> bool {
    product.accepts(&scene.metadata.product)
        && (scene.metadata.variable.is_empty() || scene.metadata.variable == product.variable)
}

/// Running aggregate of one product while scenes stream in.
///
/// The first scene that decodes fixes the product's grid. Later scenes on
/// another grid are rejected like scenes that fail to decode.
pub struct ProductAccumulator<'a> {
    product: &'a ProductConfig,
    total: Option<AccumulatedRaster>,
    rejected: usize,
}

impl<'a> ProductAccumulator<'a> {
    pub fn new(product: &'a ProductConfig) -> Self {
        Self {
            product,
            total: None,
            rejected: 0,
        }
    }

    pub fn product(&self) -> &'a ProductConfig {
        self.product
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// Aggregate so far, `None` until a scene of the product decoded.
    pub fn total(&self) -> Option<&AccumulatedRaster> {
        self.total.as_ref()
    }

    /// Decode the scenes of `batch` that belong to the product and fold
    /// them in, in batch order.
    pub fn absorb(&mut self, batch: &[Scene]) -> Result<()> {
        let selected: Vec<&Scene> = batch
            .iter()
            .filter(|scene| belongs_to(self.product, scene))
            .collect();
        if selected.is_empty() {
            return Ok(());
        }

        let decoded = decode_all(&selected, self.product.unit_conversion);
        for (scene, result) in selected.into_iter().zip(decoded) {
            let raster = match result {
                Ok(raster) => raster,
                Err(e) => {
                    self.reject(scene, &e);
                    continue;
                }
            };
            match self.total.take() {
                None => {
                    self.total = Some(AccumulatedRaster::start(raster, self.product.reducer));
                }
                Some(total) => match total.raster().ensure_same_grid(&raster) {
                    Ok(()) => {
                        let total = total
                            .fold(&raster)
                            .with_context(|| format!("failed to accumulate {}", self.product.id))?;
                        self.total = Some(total);
                    }
                    Err(e) => {
                        self.total = Some(total);
                        self.reject(scene, &e);
                    }
                },
            }
        }
        Ok(())
    }

    fn reject(&mut self, scene: &Scene, error: &PipelineError) {
        self.rejected += 1;
        warn!(
            product = %self.product.id,
            start_time = ?scene.metadata.start_time,
            error = %error,
            "Skipping scene"
        );
    }
}

/// Accumulates, reprojects and samples products onto one target grid.
///
/// Products on the same native grid share one reprojection plan.
pub struct Sampler {
    target: TargetGrid,
    plan: Option<ReprojectionPlan>,
}

impl Sampler {
    pub fn new(target: TargetGrid) -> Self {
        Self { target, plan: None }
    }

    fn plan_for(&mut self, source: &AccumulatedRaster) -> Result<&ReprojectionPlan> {
        let stale = self.plan.as_ref().map_or(true, |p| !p.matches(source));
        if stale {
            let t = self.target;
            let plan = ReprojectionPlan::build(source, t.extent, t.x_res, t.y_res)
                .context("failed to build reprojection plan")?
                .with_nodata(t.nodata_value());
            info!(
                rows = plan.grid().height,
                cols = plan.grid().width,
                covered = plan.covered_cells(),
                "Built reprojection plan"
            );
            self.plan = Some(plan);
        } else {
            debug!("Reusing reprojection plan");
        }
        self.plan.as_ref().context("reprojection plan missing")
    }

    /// Reproject a product's aggregate and sample it at `points`.
    /// `Ok(None)` when no scene of the product decoded.
    pub fn sample(
        &mut self,
        accumulator: &ProductAccumulator<'_>,
        points: &[NamedPoint],
    ) -> Result<Option<(ProductReport, GeographicRaster)>> {
        let product = accumulator.product();
        let rejected = accumulator.rejected();
        let Some(total) = accumulator.total() else {
            warn!(product = %product.id, rejected, "No usable scenes");
            return Ok(None);
        };
        let used = total.scene_count();

        let plan = self.plan_for(total)?;
        let covered_cells = plan.covered_cells();
        let raster = plan
            .apply(total)
            .with_context(|| format!("failed to reproject {}", product.id))?;

        let points = sample_many(&raster, points)
            .into_iter()
            .map(|(point, result)| {
                let (value, error) = match result {
                    Ok(sample) => (sample.value(), None),
                    Err(e) => (None, Some(e.to_string())),
                };
                PointReport {
                    name: point.name.clone(),
                    latitude: point.latitude,
                    longitude: point.longitude,
                    value,
                    error,
                }
            })
            .collect();

        info!(
            product = %product.id,
            reducer = %product.reducer,
            scenes = used,
            rejected,
            valid = raster.valid_count(),
            "Sampled product"
        );

        let report = ProductReport {
            id: product.id.clone(),
            variable: product.variable.clone(),
            reducer: product.reducer,
            scenes: used,
            rejected,
            covered_cells,
            points,
        };
        Ok(Some((report, raster)))
    }
}

/// Run every configured product over everything `source` holds, handing
/// each finished raster to `sink` when given.
///
/// Scenes are pulled `batch_size` at a time. A product that cannot be
/// reprojected is logged and left out of the reports.
pub fn run(
    config: &PipelineConfig,
    source: &mut dyn SceneSource,
    points: &[NamedPoint],
    batch_size: usize,
    mut sink: Option<&mut dyn RasterSink>,
) -> Result<Vec<ProductReport>> {
    let batch_size = batch_size.max(1);
    let mut products: Vec<ProductAccumulator> =
        config.products.iter().map(ProductAccumulator::new).collect();

    let mut batch = Vec::with_capacity(batch_size);
    let mut read = 0usize;
    loop {
        let next = source.fetch_next_scene().context("failed to read scene")?;
        let exhausted = next.is_none();
        if let Some(scene) = next {
            batch.push(scene);
            read += 1;
        }
        if batch.len() >= batch_size || (exhausted && !batch.is_empty()) {
            for accumulator in &mut products {
                accumulator.absorb(&batch)?;
            }
            debug!(scenes = batch.len(), read, "Folded batch");
            batch.clear();
        }
        if exhausted {
            break;
        }
    }
    info!(
        scenes = read,
        products = config.products.len(),
        points = points.len(),
        "Read scenes"
    );

    let mut sampler = Sampler::new(config.target);
    let mut reports = Vec::with_capacity(products.len());
    for accumulator in &products {
        let id = &accumulator.product().id;
        let (report, raster) = match sampler.sample(accumulator, points) {
            Ok(Some(done)) => done,
            Ok(None) => continue,
            Err(e) => {
                warn!(product = %id, error = %format!("{:#}", e), "Skipping product");
                continue;
            }
        };
        if let Some(sink) = sink.as_deref_mut() {
            sink.write_raster(id, &raster)
                .with_context(|| format!("failed to export {}", id))?;
        }
        reports.push(report);
    }
    Ok(reports)
}
