//! Pipeline configuration.
//!
//! Loaded from YAML with `${VAR}` / `${VAR:-default}` substitution, then
//! overridden from the environment:
//!
//! - `GOES_EXTENT`: "min_lon,min_lat,max_lon,max_lat"
//! - `GOES_RESOLUTION`: degrees, used for both axes
//! - `GOES_NODATA`: value written to cells without data
//!
//! ```yaml
//! target:
//!   extent: { min_lon: -75.0, min_lat: -34.0, max_lon: -34.0, max_lat: 5.5 }
//!   x_res: 0.02
//!   y_res: 0.02
//! products:
//!   - id: rrqpe
//!     variable: RRQPE
//!     reducer: sum
//! ```

use std::path::Path;

use geo_common::BoundingBox;
use serde::{Deserialize, Serialize};

use crate::accumulate::ReduceOp;
use crate::error::{PipelineError, Result};
use crate::preprocess::UnitConversion;

/// Default product extent: Brazil and surroundings.
pub const DEFAULT_EXTENT: BoundingBox = BoundingBox {
    min_lon: -75.0,
    min_lat: -34.0,
    max_lon: -34.0,
    max_lat: 5.5,
};

/// Default target resolution in degrees (~2 km).
pub const DEFAULT_RESOLUTION: f64 = 0.02;

/// Regular lat/lon grid every product is reprojected onto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetGrid {
    pub extent: BoundingBox,
    pub x_res: f64,
    pub y_res: f64,
    /// Value for cells without data; NaN when absent.
    #[serde(default)]
    pub nodata: Option<f32>,
}

impl Default for TargetGrid {
    fn default() -> Self {
        Self {
            extent: DEFAULT_EXTENT,
            x_res: DEFAULT_RESOLUTION,
            y_res: DEFAULT_RESOLUTION,
            nodata: None,
        }
    }
}

impl TargetGrid {
    pub fn nodata_value(&self) -> f32 {
        self.nodata.unwrap_or(f32::NAN)
    }
}

/// How scenes of one product are decoded and combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductConfig {
    /// Identifier used for output names.
    pub id: String,
    /// Data variable inside the product, e.g. "RRQPE", "LST", "CMI".
    pub variable: String,
    #[serde(default)]
    pub reducer: ReduceOp,
    #[serde(default)]
    pub unit_conversion: UnitConversion,
    /// Product short name scenes must carry to be included, e.g. "RRQPEF".
    /// Scenes are not filtered when absent.
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ProductConfig {
    pub fn new(id: impl Into<String>, variable: impl Into<String>, reducer: ReduceOp) -> Self {
        Self {
            id: id.into(),
            variable: variable.into(),
            reducer,
            unit_conversion: UnitConversion::None,
            product: None,
            description: None,
        }
    }

    /// True if a scene of `product` belongs to this configuration.
    pub fn accepts(&self, product: &str) -> bool {
        self.product.as_deref().map_or(true, |p| p == product)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub target: TargetGrid,
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target: TargetGrid::default(),
            products: vec![ProductConfig::new("rrqpe", "RRQPE", ReduceOp::Sum)],
        }
    }
}

impl PipelineConfig {
    /// Load a YAML file, expand `${VAR}` references, apply environment
    /// overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse YAML content, expand `${VAR}` references, apply environment
    /// overrides and validate.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content)?;
        let config: Self = serde_yaml::from_str(&expanded)?;
        let config = config.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let config = Self::default().with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `GOES_EXTENT`, `GOES_RESOLUTION` and `GOES_NODATA`.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(val) = std::env::var("GOES_EXTENT") {
            self.target.extent = BoundingBox::parse(&val)
                .map_err(|e| PipelineError::config(format!("GOES_EXTENT: {}", e)))?;
        }

        if let Ok(val) = std::env::var("GOES_RESOLUTION") {
            let res: f64 = val
                .parse()
                .map_err(|_| PipelineError::config(format!("GOES_RESOLUTION: bad number {}", val)))?;
            self.target.x_res = res;
            self.target.y_res = res;
        }

        if let Ok(val) = std::env::var("GOES_NODATA") {
            let nodata: f32 = val
                .parse()
                .map_err(|_| PipelineError::config(format!("GOES_NODATA: bad number {}", val)))?;
            self.target.nodata = Some(nodata);
        }

        Ok(self)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        self.target
            .extent
            .validate()
            .map_err(|e| PipelineError::config(e.to_string()))?;

        for (name, res) in [("x_res", self.target.x_res), ("y_res", self.target.y_res)] {
            if !res.is_finite() || res <= 0.0 {
                return Err(PipelineError::config(format!(
                    "{} must be positive, got {}",
                    name, res
                )));
            }
        }

        if self.products.is_empty() {
            return Err(PipelineError::config("at least one product is required"));
        }

        let mut seen = std::collections::HashSet::new();
        for product in &self.products {
            if product.id.is_empty() {
                return Err(PipelineError::config("product id cannot be empty"));
            }
            if product.variable.is_empty() {
                return Err(PipelineError::config(format!(
                    "product {} has no variable",
                    product.id
                )));
            }
            if !seen.insert(product.id.as_str()) {
                return Err(PipelineError::config(format!(
                    "duplicate product id {}",
                    product.id
                )));
            }
        }

        Ok(())
    }

    pub fn product(&self, id: &str) -> Option<&ProductConfig> {
        self.products.iter().find(|p| p.id == id)
    }
}

/// Expand `${VAR}` and `${VAR:-default}` in `content`.
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next();

        let mut expr = String::new();
        loop {
            match chars.next() {
                Some('}') => break,
                Some(c) => expr.push(c),
                None => {
                    return Err(PipelineError::config(format!(
                        "unclosed variable substitution: ${{{}",
                        expr
                    )))
                }
            }
        }
        result.push_str(&resolve_var_expr(&expr)?);
    }

    Ok(result)
}

fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((name, default)) = expr.split_once(":-") {
        match std::env::var(name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim())
            .map_err(|_| PipelineError::config(format!("environment variable {} not set", expr)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("GOES_RASTER_TEST_VAR", "0.04");
        assert_eq!(
            expand_env_vars("res: ${GOES_RASTER_TEST_VAR}").unwrap(),
            "res: 0.04"
        );
        std::env::remove_var("GOES_RASTER_TEST_UNSET");
        assert_eq!(
            expand_env_vars("${GOES_RASTER_TEST_UNSET:-sum}").unwrap(),
            "sum"
        );
        assert!(expand_env_vars("${GOES_RASTER_TEST_UNSET}").is_err());
        assert!(expand_env_vars("${OPEN").is_err());
        assert_eq!(expand_env_vars("cost: $5").unwrap(), "cost: $5");
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
target:
  extent: { min_lon: -60.0, min_lat: -20.0, max_lon: -40.0, max_lat: 0.0 }
  x_res: 0.1
  y_res: 0.1
products:
  - id: lst_max
    variable: LST
    reducer: max
    unit_conversion: kelvin_to_celsius
    product: LSTF
  - id: rrqpe
    variable: RRQPE
"#;
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();
        let lst = config.product("lst_max").unwrap();
        assert_eq!(lst.reducer, ReduceOp::Max);
        assert_eq!(lst.unit_conversion, UnitConversion::KelvinToCelsius);
        assert!(lst.accepts("LSTF"));
        assert!(!lst.accepts("RRQPEF"));
        let rrqpe = config.product("rrqpe").unwrap();
        assert_eq!(rrqpe.reducer, ReduceOp::Sum);
        assert!(rrqpe.accepts("anything"));
        assert!(config.target.nodata_value().is_nan());
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = PipelineConfig::default();
        assert!(config.validate().is_ok());

        config.target.x_res = 0.0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.products.push(ProductConfig::new("rrqpe", "RRQPE", ReduceOp::Max));
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.target.extent = BoundingBox::new(10.0, 0.0, 0.0, 1.0);
        assert!(config.validate().is_err());
    }
}
