//! Rasterize boundary layers onto the grid of a labelled field.
//!
//! [`rasterize_like`] burns a [`BoundaryLayer`] into a [`Mask`] that shares
//! the spatial coordinates, CRS and transform of a template
//! [`GriddedField`]. The mask can then be applied with
//! [`WhereMask::where_mask`] or exported with [`Mask::export_geotiff`].
//!
//! ```text
//! BoundaryLayer ──to_crs(field CRS)──┐
//!                                    ├──► burn (centre rule / all touched) ──► Mask
//! GriddedField ──CRS + transform─────┘
//! ```

mod burn;
mod geotiff;
pub mod mask;
pub mod options;

use boundary::BoundaryLayer;
use grid_common::grid::REGULAR_SPACING_TOLERANCE;
use grid_common::{resolve_crs, CrsCode, GeoTransform, GridError, GridResult};
use grid_processor::GriddedField;
use tracing::{debug, info, warn};

use burn::{burn_presence, burn_values, BurnGrid};
pub use mask::{Mask, MaskData, WhereMask};
pub use options::{MergeAlg, RasterDtype, RasterizeOptions};

/// Burn `layer` onto the spatial grid of `template`.
///
/// The template's CRS wins over `options.crs`; the transform comes from
/// `options.transform`, then the template's regularly spaced coordinates,
/// then its transform metadata. The layer is reprojected into the template
/// CRS before burning.
pub fn rasterize_like(
    layer: &BoundaryLayer,
    template: &GriddedField,
    options: &RasterizeOptions,
) -> GridResult<Mask> {
    let crs = resolve_template_crs(template, options)?;
    let transform = resolve_transform(template, options)?;
    let inverse = transform.inverse().ok_or_else(|| {
        GridError::Configuration(format!("transform {:?} is not invertible", transform))
    })?;

    let squeezed = template.squeeze();
    if squeezed.ndim() != 2 {
        return Err(GridError::InvalidDimensions {
            expected: 2,
            found: squeezed.ndim(),
        });
    }
    let rows = squeezed.shape()[squeezed.axis_of(&options.y_dim)?];
    let cols = squeezed.shape()[squeezed.axis_of(&options.x_dim)?];

    info!(
        rows = rows,
        cols = cols,
        crs = %crs,
        features = layer.len(),
        "Rasterizing to match field dimensions"
    );

    let layer = layer.to_crs(&crs)?;
    let grid = BurnGrid {
        rows,
        cols,
        transform,
        inverse,
        all_touched: options.all_touched,
    };

    let dtype = options.effective_dtype();
    let data = match &options.attribute_column {
        Some(column) => {
            let values = burn_attribute(&layer, &grid, column, options)?;
            if dtype.is_numeric() {
                MaskData::Values(values.mapv(|v| dtype.cast(v)))
            } else {
                MaskData::Presence(values.mapv(|v| !v.is_nan() && v != 0.0))
            }
        }
        None if dtype.is_numeric() => {
            let shapes = layer.features().iter().map(|f| (&f.geometry, 1.0));
            let values = burn_values(&grid, shapes, options.fill, options.merge);
            MaskData::Values(values.mapv(|v| dtype.cast(v)))
        }
        None => {
            MaskData::Presence(burn_presence(&grid, layer.features().iter().map(|f| &f.geometry)))
        }
    };

    let mask = Mask {
        name: options.name.clone().unwrap_or_else(|| "data".to_string()),
        data,
        y: squeezed.coord(&options.y_dim)?.clone(),
        x: squeezed.coord(&options.x_dim)?.clone(),
        crs,
        transform,
        dtype,
        attrs: template.attrs().clone(),
    };
    debug!(name = mask.name(), cells = mask.count(), dtype = dtype.name(), "Rasterized mask");
    Ok(mask)
}

/// The template's own CRS, else the explicit one from the options.
fn resolve_template_crs(template: &GriddedField, options: &RasterizeOptions) -> GridResult<CrsCode> {
    if let Some(crs) = template.crs() {
        debug!(crs = %crs, "Using the field's CRS");
        return Ok(crs);
    }
    let Some(explicit) = &options.crs else {
        return Err(GridError::Configuration(
            "field has no CRS: add a crs to the field or pass one explicitly".to_string(),
        ));
    };
    let (code, path) = resolve_crs(explicit)?;
    debug!(crs = %explicit, code = %code, path = ?path, "Using the explicit CRS");
    Ok(code)
}

fn resolve_transform(template: &GriddedField, options: &RasterizeOptions) -> GridResult<GeoTransform> {
    if let Some(transform) = options.transform {
        debug!(?transform, "Using the explicit transform");
        return Ok(transform);
    }
    if let Some(geobox) = template.geobox(&options.y_dim, &options.x_dim, REGULAR_SPACING_TOLERANCE) {
        debug!(transform = ?geobox.transform, "Derived transform from the field's coordinates");
        return Ok(geobox.transform);
    }
    if let Some(transform) = template.transform() {
        debug!(?transform, "Using the field's transform metadata");
        return Ok(transform);
    }
    Err(GridError::Configuration(format!(
        "cannot derive a transform from '{}'/'{}': coordinates are not regularly spaced and \
         the field has no transform; pass one explicitly",
        options.y_dim, options.x_dim
    )))
}

fn burn_attribute(
    layer: &BoundaryLayer,
    grid: &BurnGrid,
    column: &str,
    options: &RasterizeOptions,
) -> GridResult<ndarray::Array2<f64>> {
    if !layer.has_attribute(column) {
        return Err(GridError::Configuration(format!(
            "attribute column '{}' not found in boundary layer",
            column
        )));
    }

    let mut skipped = 0usize;
    let shapes: Vec<_> = layer
        .features()
        .iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            match feature.attribute(column).and_then(|v| v.as_f64()) {
                Some(value) => Some((&feature.geometry, value)),
                None => {
                    debug!(feature = index, column = column, "Attribute missing or not numeric");
                    skipped += 1;
                    None
                }
            }
        })
        .collect();
    if skipped > 0 {
        warn!(column = column, skipped = skipped, "Skipped features without a numeric attribute value");
    }

    Ok(burn_values(grid, shapes.into_iter(), options.fill, options.merge))
}
