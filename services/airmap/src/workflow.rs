//! The plot and mask workflows.
//!
//! `run_*` read a date's time steps from the dataset and hand them to the
//! `*_field` functions, which do the actual work and can be driven directly
//! with an in-memory field.

use std::path::{Path, PathBuf};

use boundary::{read_boundary, BoundaryLayer};
use grid_common::{resolve_crs, GridError, GridResult};
use grid_processor::GriddedField;
use netcdf_parser::open_gridded_field_at;
use rasterize::{rasterize_like, WhereMask};
use renderer::render_to_file;
use tracing::{info, warn};

use crate::config::AirmapConfig;

/// Result of a plot run.
#[derive(Debug, Clone)]
pub struct PlotOutput {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Boundary segments drawn over the map
    pub segments: usize,
}

/// Result of a mask run.
#[derive(Debug, Clone)]
pub struct MaskOutput {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    /// Grid cells inside the boundary
    pub cells_inside: usize,
    pub geotiff: Option<PathBuf>,
}

/// Read the configured boundary layer, applying the CRS override.
///
/// `None` when no boundary is configured.
pub fn load_boundary(config: &AirmapConfig) -> GridResult<Option<BoundaryLayer>> {
    let Some(path) = &config.boundary_path else {
        return Ok(None);
    };
    let mut layer = read_boundary(path)?;
    if let Some(crs) = &config.boundary_crs {
        if layer.crs().is_some_and(|current| current != crs) {
            warn!(file_crs = ?layer.crs(), configured = %crs, "Overriding boundary layer CRS");
        }
        layer = layer.with_crs(crs.clone());
    }
    Ok(Some(layer))
}

/// Read only `date`'s time steps of the configured variable.
fn open_dataset(config: &AirmapConfig, path: &Path, date: &str) -> GridResult<GriddedField> {
    info!(path = %path.display(), variable = %config.variable, date, "Opening dataset");
    open_gridded_field_at(path, &config.variable, date)
}

/// Attach the configured field CRS when the file declared none.
fn with_field_crs(config: &AirmapConfig, field: &GriddedField) -> GridResult<GriddedField> {
    if field.crs().is_some() {
        return Ok(field.clone());
    }
    let (code, _) = resolve_crs(&config.field_crs)?;
    Ok(field.clone().with_crs(code))
}

fn ensure_parent_dir(path: &Path) -> GridResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(std::fs::create_dir_all(parent)?),
        _ => Ok(()),
    }
}

/// Daily plot: the dataset for `date`'s year, written to the configured
/// output directory as `<date><plot_suffix>`.
pub fn run_plot(config: &AirmapConfig, date: &str) -> GridResult<PlotOutput> {
    let path = config.dataset_path(date)?;
    let field = open_dataset(config, &path, date)?;
    let boundary = load_boundary(config)?;
    plot_field(config, &field, date, boundary.as_ref(), &config.plot_path(date))
}

/// Subset `field` to `date` and the plot region, convert units, and render
/// with the boundary outline.
pub fn plot_field(
    config: &AirmapConfig,
    field: &GriddedField,
    date: &str,
    boundary: Option<&BoundaryLayer>,
    output: &Path,
) -> GridResult<PlotOutput> {
    let subset = field.subset(&config.regions.plot.request(date))?;
    let converted = config.units.apply(&subset)?;
    info!(date, shape = ?converted.shape(), units = ?converted.attr_str("units"), "Subset and converted field");

    if boundary.is_none() {
        warn!("No boundary layer configured, plotting without an outline");
    }

    ensure_parent_dir(output)?;
    let map = render_to_file(
        &converted,
        &config.color_scale,
        boundary,
        config.render.title(),
        &config.render.options,
        output,
    )?;

    info!(path = %output.display(), width = map.width(), height = map.height(), "Wrote plot");
    Ok(PlotOutput {
        path: output.to_path_buf(),
        width: map.width(),
        height: map.height(),
        segments: map.segments,
    })
}

/// Masked map: the dataset at `input` (or the one for `date`'s year),
/// written to `output` (or the configured mask output).
pub fn run_mask(
    config: &AirmapConfig,
    date: &str,
    input: Option<&Path>,
    output: Option<&Path>,
    export_tiff: Option<&Path>,
) -> GridResult<MaskOutput> {
    let boundary = load_boundary(config)?.ok_or_else(|| {
        GridError::Configuration("the mask workflow needs a boundary layer; set boundary_path".to_string())
    })?;
    let path = match input {
        Some(path) => path.to_path_buf(),
        None => config.dataset_path(date)?,
    };
    let field = open_dataset(config, &path, date)?;
    let output = output.map(Path::to_path_buf).unwrap_or_else(|| config.mask_path());
    mask_field(config, &field, date, &boundary, &output, export_tiff)
}

/// Subset `field` to `date` and the mask region, burn `boundary` onto the
/// subset grid, blank every cell outside it, and render.
pub fn mask_field(
    config: &AirmapConfig,
    field: &GriddedField,
    date: &str,
    boundary: &BoundaryLayer,
    output: &Path,
    export_tiff: Option<&Path>,
) -> GridResult<MaskOutput> {
    let field = with_field_crs(config, field)?;
    let subset = field.subset(&config.regions.mask.request(date))?.squeeze();

    let mask = rasterize_like(boundary, &subset, &config.rasterize)?;
    let (rows, cols) = mask.shape();
    info!(rows, cols, inside = mask.count(), "Rasterized boundary");
    if mask.count() == 0 {
        warn!("Boundary does not cover any cell of the mask region");
    }

    let masked = subset.where_mask(&mask)?;
    let converted = config.units.apply(&masked)?;

    ensure_parent_dir(output)?;
    let map = render_to_file(
        &converted,
        &config.color_scale,
        Some(boundary),
        config.render.title(),
        &config.render.options,
        output,
    )?;
    info!(path = %output.display(), width = map.width(), height = map.height(), "Wrote masked map");

    let geotiff = match export_tiff {
        Some(path) => {
            ensure_parent_dir(path)?;
            mask.export_geotiff(path)?;
            Some(path.to_path_buf())
        }
        None => None,
    };

    Ok(MaskOutput {
        path: output.to_path_buf(),
        width: map.width(),
        height: map.height(),
        cells_inside: mask.count(),
        geotiff,
    })
}
