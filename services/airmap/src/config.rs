//! Airmap configuration.
//!
//! Every field has a default, so an empty YAML file (or none at all) gives
//! the reanalysis layout used by the daily plots. Values are layered:
//! defaults, then the YAML file, then `AIRMAP_*` environment variables, then
//! command-line flags.

use anyhow::{Context, Result};
use grid_common::{ColorScale, CrsDefinition, GridError, GridResult};
use grid_processor::{SubsetRequest, UnitConversion};
use netcdf_parser::DEFAULT_FILE_PATTERN;
use rasterize::RasterizeOptions;
use renderer::RenderOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable overriding [`AirmapConfig::data_dir`].
pub const ENV_DATA_DIR: &str = "AIRMAP_DATA_DIR";
/// Environment variable overriding [`AirmapConfig::boundary_path`].
pub const ENV_BOUNDARY: &str = "AIRMAP_BOUNDARY";
/// Environment variable overriding [`AirmapConfig::output_dir`].
pub const ENV_OUTPUT_DIR: &str = "AIRMAP_OUTPUT_DIR";

/// Top-level airmap configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AirmapConfig {
    /// Directory holding the yearly reanalysis files
    pub data_dir: PathBuf,

    /// File name pattern; `{year}` is replaced by the date's year
    pub file_pattern: String,

    /// Variable to read from each file
    pub variable: String,

    /// Boundary layer drawn over plots and burned into masks
    pub boundary_path: Option<PathBuf>,

    /// CRS to assume for the boundary layer, replacing whatever the file says
    pub boundary_crs: Option<CrsDefinition>,

    /// CRS of the gridded field when the file does not declare one
    pub field_crs: CrsDefinition,

    pub regions: RegionsConfig,

    pub units: UnitConversion,

    pub color_scale: ColorScale,

    pub render: RenderConfig,

    /// Options for burning the boundary into a mask
    pub rasterize: RasterizeOptions,

    pub output_dir: PathBuf,

    /// Appended to the date label to name plot images
    pub plot_suffix: String,

    /// File name of the masked map
    pub mask_output: String,
}

impl Default for AirmapConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            variable: "air".to_string(),
            boundary_path: None,
            boundary_crs: None,
            field_crs: CrsDefinition::new("EPSG:4326"),
            regions: RegionsConfig::default(),
            units: UnitConversion::default(),
            color_scale: ColorScale::default(),
            render: RenderConfig::default(),
            rasterize: RasterizeOptions::default(),
            output_dir: PathBuf::from("."),
            plot_suffix: "temp_plot_centigrade.png".to_string(),
            mask_output: "testcase3.png".to_string(),
        }
    }
}

/// Latitude/longitude window, given in plot order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub lat: (f64, f64),
    pub lon: (f64, f64),
}

impl RegionConfig {
    /// Subset request for this window on `date`.
    pub fn request(&self, date: &str) -> SubsetRequest {
        SubsetRequest::new()
            .time(date)
            .lat(self.lat.0, self.lat.1)
            .lon(self.lon.0, self.lon.1)
    }

    fn is_finite(&self) -> bool {
        [self.lat.0, self.lat.1, self.lon.0, self.lon.1]
            .iter()
            .all(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionsConfig {
    pub plot: RegionConfig,
    pub mask: RegionConfig,
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            plot: RegionConfig {
                lat: (39.0, 6.2),
                lon: (67.0, 97.5),
            },
            mask: RegionConfig {
                lat: (40.5, 7.5),
                lon: (68.0, 90.5),
            },
        }
    }
}

/// Image options plus the caption drawn above the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    #[serde(flatten)]
    pub options: RenderOptions,

    /// Caption; empty for none
    pub annotation: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            options: RenderOptions::default(),
            annotation: "Daily Forecast of Air Temperature (°C) at 2m".to_string(),
        }
    }
}

impl RenderConfig {
    pub fn title(&self) -> Option<&str> {
        Some(self.annotation.as_str()).filter(|s| !s.trim().is_empty())
    }
}

impl AirmapConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// File config when given, defaults otherwise; environment overrides
    /// applied in both cases.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `AIRMAP_*` overrides from `lookup`. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get(ENV_DATA_DIR) {
            debug!(key = ENV_DATA_DIR, value = %dir, "Environment override");
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = get(ENV_BOUNDARY) {
            debug!(key = ENV_BOUNDARY, value = %path, "Environment override");
            self.boundary_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = get(ENV_OUTPUT_DIR) {
            debug!(key = ENV_OUTPUT_DIR, value = %dir, "Environment override");
            self.output_dir = PathBuf::from(dir);
        }
    }

    /// Path of the dataset holding `date`.
    pub fn dataset_path(&self, date: &str) -> GridResult<PathBuf> {
        Ok(netcdf_parser::dataset_path(&self.data_dir, &self.file_pattern, date)?)
    }

    /// Output path of the plot for `date`.
    pub fn plot_path(&self, date: &str) -> PathBuf {
        self.output_dir.join(format!("{}{}", date, self.plot_suffix))
    }

    pub fn mask_path(&self) -> PathBuf {
        self.output_dir.join(&self.mask_output)
    }

    /// Check values that would otherwise fail late in a workflow.
    pub fn validate(&self) -> GridResult<()> {
        if self.variable.trim().is_empty() {
            return Err(GridError::Configuration("variable must not be empty".to_string()));
        }
        if !self.file_pattern.contains("{year}") {
            return Err(GridError::Configuration(format!(
                "file_pattern '{}' has no {{year}} placeholder",
                self.file_pattern
            )));
        }
        if self.plot_suffix.is_empty() || self.mask_output.is_empty() {
            return Err(GridError::Configuration(
                "plot_suffix and mask_output must not be empty".to_string(),
            ));
        }
        for (name, region) in [("plot", &self.regions.plot), ("mask", &self.regions.mask)] {
            if !region.is_finite() {
                return Err(GridError::InvalidBbox(format!("{} region has non-finite bounds", name)));
            }
        }
        if self.render.options.cell_size == 0 {
            return Err(GridError::Configuration("render.cell_size must be at least 1".to_string()));
        }
        if !self.units.kelvin_offset.is_finite() {
            return Err(GridError::Configuration("units.kelvin_offset must be finite".to_string()));
        }
        self.color_scale.validate()?;
        Ok(())
    }
}
